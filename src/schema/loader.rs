//! WDBX definition XML loading
//!
//! Parses the external definition file (one `<Table>` element per table and
//! build, each holding an ordered `<Field>` list) into a [`TableSchema`].

use std::fs;
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::{FieldDefinition, FieldType, TableSchema};
use crate::error::{Error, Result};

/// Load a table definition from a WDBX XML file on disk.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be read, and any error
/// [`load_schema`] can produce.
///
/// [`Error::Io`]: crate::Error::Io
pub fn read_schema_file<P: AsRef<Path>>(path: P, table: &str, build: &str) -> Result<TableSchema> {
    let content = fs::read_to_string(path)?;
    load_schema(&content, table, build)
}

/// Parse a table definition out of WDBX XML content.
///
/// Scans for the `<Table>` element whose `Name` and `Build` attributes both
/// match, then collects its `<Field>` children in document order.
///
/// # Errors
///
/// Returns [`Error::SchemaNotFound`] if no table matches both name and build,
/// [`Error::UnknownFieldType`] for an unrecognized `Type` attribute, and
/// [`Error::SchemaNoIndexField`] if no field is flagged `IsIndex`.
///
/// [`Error::SchemaNotFound`]: crate::Error::SchemaNotFound
/// [`Error::UnknownFieldType`]: crate::Error::UnknownFieldType
/// [`Error::SchemaNoIndexField`]: crate::Error::SchemaNoIndexField
pub fn load_schema(xml: &str, table: &str, build: &str) -> Result<TableSchema> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut in_target = false;
    let mut found = false;
    let mut fields: Vec<FieldDefinition> = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"Table" => {
                    in_target = table_matches(&e, table, build)?;
                    if in_target {
                        found = true;
                    }
                }
                b"Field" if in_target => fields.push(parse_field(&e)?),
                _ => {}
            },
            Ok(Event::Empty(e)) => {
                // Fields are usually self-closing: <Field Name="ID" Type="int" IsIndex="true"/>
                if e.name().as_ref() == b"Field" && in_target {
                    fields.push(parse_field(&e)?);
                }
            }
            Ok(Event::End(e)) => {
                if e.name().as_ref() == b"Table" && in_target {
                    break;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::XmlError(e)),
            _ => {}
        }
        buf.clear();
    }

    if !found {
        return Err(Error::SchemaNotFound {
            table: table.to_string(),
            build: build.to_string(),
        });
    }

    let schema = TableSchema {
        table: table.to_string(),
        build: build.to_string(),
        fields,
    };

    // Identity is resolved once here so every later keyed access can trust it.
    if schema.index_field().is_none() {
        return Err(Error::SchemaNoIndexField {
            table: table.to_string(),
        });
    }

    tracing::debug!(
        "Loaded definition for {} ({}): {} fields, {} localized",
        schema.table,
        schema.build,
        schema.fields.len(),
        schema.loc_field_count()
    );

    Ok(schema)
}

fn table_matches(e: &BytesStart<'_>, table: &str, build: &str) -> Result<bool> {
    let mut name_ok = false;
    let mut build_ok = false;

    for attr in e.attributes() {
        let attr = attr?;
        match attr.key.as_ref() {
            b"Name" => name_ok = attr.value.as_ref() == table.as_bytes(),
            b"Build" => build_ok = attr.value.as_ref() == build.as_bytes(),
            _ => {}
        }
    }

    Ok(name_ok && build_ok)
}

fn parse_field(e: &BytesStart<'_>) -> Result<FieldDefinition> {
    let mut name = String::new();
    let mut type_name = String::new();
    let mut array_size = 1usize;
    let mut is_index = false;

    for attr in e.attributes() {
        let attr = attr?;
        match attr.key.as_ref() {
            b"Name" => name = String::from_utf8_lossy(&attr.value).into_owned(),
            b"Type" => type_name = String::from_utf8_lossy(&attr.value).into_owned(),
            b"ArraySize" => {
                array_size = String::from_utf8_lossy(&attr.value).parse().unwrap_or(1);
            }
            b"IsIndex" => is_index = attr.value.as_ref() == b"true",
            _ => {}
        }
    }

    let field_type =
        FieldType::parse(&type_name).ok_or_else(|| Error::UnknownFieldType(type_name.clone()))?;

    Ok(FieldDefinition {
        name,
        field_type,
        array_size: array_size.max(1),
        is_index,
    })
}
