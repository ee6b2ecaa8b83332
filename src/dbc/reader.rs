//! DBC file reading and parsing

use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};
use indexmap::IndexMap;

use super::codec::decode_record;
use super::{DBC_SIGNATURE, DEFAULT_LOC_WIDTH, DbcHeader, DbcTable, HEADER_SIZE, Record, Value};
use crate::error::{Error, Result};
use crate::schema::TableSchema;

/// Knobs for table parsing.
#[derive(Debug, Clone, Copy)]
pub struct ParseOptions {
    /// Language slot width to assume when it cannot be derived from header
    /// arithmetic. 16 for every 3.3.5-era table.
    pub assumed_loc_width: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            assumed_loc_width: DEFAULT_LOC_WIDTH,
        }
    }
}

/// Read a .dbc file from disk.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be opened or read, and any error
/// [`parse_dbc_bytes`] can produce.
///
/// [`Error::Io`]: crate::Error::Io
pub fn read_dbc<P: AsRef<Path>>(
    path: P,
    schema: &TableSchema,
    options: &ParseOptions,
) -> Result<DbcTable> {
    let mut file = File::open(path)?;
    let mut buffer = Vec::new();
    file.read_to_end(&mut buffer)?;
    parse_dbc_bytes(&buffer, schema, options)
}

/// Parse DBC data from bytes.
///
/// Validates the magic and the header's size arithmetic against the buffer,
/// resolves the language slot width, then decodes every record and indexes
/// it by the definition's identity field. A duplicated identity keeps the
/// last record seen; shipped data contains duplicates and the client
/// tolerates them the same way.
///
/// # Errors
///
/// Returns [`Error::InvalidDbcMagic`] if the buffer does not start with
/// `WDBC`, and [`Error::HeaderMismatch`] if the declared sizes do not
/// reconcile with the buffer length.
///
/// [`Error::InvalidDbcMagic`]: crate::Error::InvalidDbcMagic
/// [`Error::HeaderMismatch`]: crate::Error::HeaderMismatch
pub fn parse_dbc_bytes(
    data: &[u8],
    schema: &TableSchema,
    options: &ParseOptions,
) -> Result<DbcTable> {
    let mut cursor = Cursor::new(data);

    let mut magic = [0u8; 4];
    cursor.read_exact(&mut magic)?;
    if magic != DBC_SIGNATURE {
        return Err(Error::InvalidDbcMagic(magic));
    }

    let header = DbcHeader {
        record_count: cursor.read_u32::<LittleEndian>()?,
        field_count: cursor.read_u32::<LittleEndian>()?,
        record_size: cursor.read_u32::<LittleEndian>()?,
        string_block_size: cursor.read_u32::<LittleEndian>()?,
    };

    let record_count = header.record_count as usize;
    let record_size = header.record_size as usize;
    let expected =
        HEADER_SIZE + record_count * record_size + header.string_block_size as usize;
    if expected != data.len() {
        return Err(Error::HeaderMismatch {
            expected,
            actual: data.len(),
        });
    }

    let loc_width = resolve_loc_width(&header, schema, options);

    // The definition may be a partial description of the on-disk layout;
    // the header's record size stays ground truth for slicing.
    let implied = schema.record_size(loc_width);
    if implied != record_size {
        tracing::warn!(
            "{}: definition implies {} byte records, header declares {}; trailing fields may be misaligned",
            schema.table,
            implied,
            record_size
        );
    }

    let string_block_start = HEADER_SIZE + record_count * record_size;
    let index_name = schema
        .index_field()
        .map(|f| f.name.clone())
        .ok_or_else(|| Error::SchemaNoIndexField {
            table: schema.table.clone(),
        })?;

    let mut records: IndexMap<i32, Record> = IndexMap::with_capacity(record_count);

    for i in 0..record_count {
        let start = HEADER_SIZE + i * record_size;
        let rec = &data[start..start + record_size];
        let record = decode_record(schema, rec, data, string_block_start, loc_width)?;

        match record_key(&record, &index_name) {
            Some(key) => {
                records.insert(key, record);
            }
            None => {
                tracing::warn!(
                    "{}: record at offset {} has no readable identity, skipping",
                    schema.table,
                    start
                );
            }
        }
    }

    tracing::debug!(
        "Parsed {} ({}): {} records, {} byte records, {} slot locstrings",
        schema.table,
        schema.build,
        records.len(),
        record_size,
        loc_width
    );

    Ok(DbcTable {
        header,
        loc_width,
        records,
    })
}

fn record_key(record: &Record, index_name: &str) -> Option<i32> {
    match record.get(index_name)? {
        Value::Scalar(s) => s.as_key(),
        Value::Array(v) => v.first().and_then(super::Scalar::as_key),
        Value::Loc(_) => None,
    }
}

/// Recover the language slot width from header arithmetic.
///
/// The header's field count is in 4-byte words; subtracting the definition's
/// non-localized words and dividing by the localized field count gives the
/// words per loc block, one of which is the flags word. The format does not
/// self-describe this, so an inexact division falls back to the assumed
/// width rather than guessing.
fn resolve_loc_width(header: &DbcHeader, schema: &TableSchema, options: &ParseOptions) -> usize {
    let loc_count = schema.loc_field_count();
    if loc_count == 0 {
        return options.assumed_loc_width;
    }

    let scalar_words = schema.scalar_slot_count();
    let Some(loc_words) = (header.field_count as usize).checked_sub(scalar_words) else {
        tracing::warn!(
            "{}: header field count {} is below the definition's {} scalar words, assuming {} slots",
            schema.table,
            header.field_count,
            scalar_words,
            options.assumed_loc_width
        );
        return options.assumed_loc_width;
    };

    if loc_words % loc_count != 0 || loc_words / loc_count < 2 {
        tracing::warn!(
            "{}: cannot derive slot width from header ({} words over {} loc fields), assuming {}",
            schema.table,
            loc_words,
            loc_count,
            options.assumed_loc_width
        );
        return options.assumed_loc_width;
    }

    let width = loc_words / loc_count - 1;
    if width == options.assumed_loc_width {
        width
    } else {
        tracing::warn!(
            "{}: header arithmetic gives {} language slots, expected {}; trusting the header",
            schema.table,
            width,
            options.assumed_loc_width
        );
        width
    }
}
