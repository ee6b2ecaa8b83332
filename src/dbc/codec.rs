//! Record encoding and decoding
//!
//! Walks a definition's fields in layout order against a fixed-size record
//! slice, little-endian throughout. String-typed elements are 4-byte offsets
//! into the table's string block; localized fields are `loc_width` offset
//! words followed by one flags word.

use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use super::{LocString, Record, Scalar, StringPool, Value};
use crate::error::Result;
use crate::schema::{FieldDefinition, FieldType, TableSchema};

/// Decode one record slice into typed field values.
///
/// `data` is the whole table buffer and `string_block_start` the absolute
/// offset of its string block; both are needed to resolve string offsets.
///
/// Decoding stops before any field that does not fully fit in `rec`. Donor
/// tables from older clients can be narrower than the definition, so a short
/// record is expected data, not corruption; the remaining fields are simply
/// absent from the result.
pub(crate) fn decode_record(
    schema: &TableSchema,
    rec: &[u8],
    data: &[u8],
    string_block_start: usize,
    loc_width: usize,
) -> Result<Record> {
    let mut cursor = Cursor::new(rec);
    let mut record = Record::default();

    for field in &schema.fields {
        let field_bytes = field.field_type.byte_width(loc_width) * field.array_size;
        let pos = cursor.position() as usize;
        if pos + field_bytes > rec.len() {
            break;
        }

        let value = if field.field_type == FieldType::Loc {
            let mut texts = Vec::with_capacity(loc_width);
            for _ in 0..loc_width {
                let offset = cursor.read_u32::<LittleEndian>()?;
                texts.push(resolve_string(data, string_block_start, offset as usize));
            }
            let flags = cursor.read_u32::<LittleEndian>()?;
            Value::Loc(LocString { texts, flags })
        } else {
            let mut elements = Vec::with_capacity(field.array_size);
            for _ in 0..field.array_size {
                elements.push(decode_scalar(
                    &mut cursor,
                    field.field_type,
                    data,
                    string_block_start,
                )?);
            }
            if field.array_size == 1 {
                Value::Scalar(elements.remove(0))
            } else {
                Value::Array(elements)
            }
        };

        record.values.insert(field.name.clone(), value);
    }

    Ok(record)
}

fn decode_scalar(
    cursor: &mut Cursor<&[u8]>,
    field_type: FieldType,
    data: &[u8],
    string_block_start: usize,
) -> Result<Scalar> {
    Ok(match field_type {
        FieldType::Int => Scalar::Int(cursor.read_i32::<LittleEndian>()?),
        FieldType::UInt => Scalar::UInt(cursor.read_u32::<LittleEndian>()?),
        FieldType::ULong => Scalar::ULong(cursor.read_u64::<LittleEndian>()?),
        FieldType::Float => Scalar::Float(cursor.read_f32::<LittleEndian>()?),
        FieldType::Byte => Scalar::Byte(cursor.read_u8()?),
        FieldType::String => {
            let offset = cursor.read_u32::<LittleEndian>()?;
            Scalar::String(resolve_string(data, string_block_start, offset as usize))
        }
        // Handled by the caller; a loc block is not a scalar.
        FieldType::Loc => unreachable!("loc fields are decoded as blocks"),
    })
}

/// Resolve a string-block offset to its content.
///
/// Offset 0 means the absent/empty string. Out-of-range offsets resolve to
/// empty rather than failing; truncated donor blocks occur in shipped data.
pub(crate) fn resolve_string(data: &[u8], string_block_start: usize, offset: usize) -> String {
    if offset == 0 {
        return String::new();
    }
    let start = string_block_start + offset;
    if start >= data.len() {
        return String::new();
    }
    let end = data[start..]
        .iter()
        .position(|&b| b == 0)
        .map_or(data.len(), |p| start + p);
    String::from_utf8_lossy(&data[start..end]).into_owned()
}

/// Encode one record back into bytes, interning strings through `pool`.
///
/// Fields absent from the record (a short donor decode, or a definition
/// grown since the record was built) encode as per-type zero defaults so
/// the row stays structurally complete.
pub(crate) fn encode_record(
    schema: &TableSchema,
    record: &Record,
    pool: &mut StringPool,
    loc_width: usize,
) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(schema.record_size(loc_width));

    for field in &schema.fields {
        match record.get(&field.name) {
            Some(Value::Loc(loc)) if field.field_type == FieldType::Loc => {
                encode_loc(&mut out, loc, pool, loc_width)?;
            }
            Some(value) if field.field_type != FieldType::Loc => {
                let elements = value_elements(value);
                for i in 0..field.array_size {
                    encode_scalar(&mut out, field.field_type, elements.get(i), pool)?;
                }
            }
            // Missing field, or a value whose shape contradicts the
            // definition: fall back to the zero default.
            _ => encode_default(&mut out, field, pool, loc_width)?,
        }
    }

    Ok(out)
}

fn value_elements(value: &Value) -> &[Scalar] {
    match value {
        Value::Scalar(s) => std::slice::from_ref(s),
        Value::Array(v) => v.as_slice(),
        Value::Loc(_) => &[],
    }
}

fn encode_loc(
    out: &mut Vec<u8>,
    loc: &LocString,
    pool: &mut StringPool,
    loc_width: usize,
) -> Result<()> {
    for slot in 0..loc_width {
        let text = loc.texts.get(slot).map_or("", String::as_str);
        out.write_u32::<LittleEndian>(pool.intern(text))?;
    }
    out.write_u32::<LittleEndian>(loc.flags)?;
    Ok(())
}

fn encode_scalar(
    out: &mut Vec<u8>,
    field_type: FieldType,
    scalar: Option<&Scalar>,
    pool: &mut StringPool,
) -> Result<()> {
    match field_type {
        FieldType::Int => {
            let v = match scalar {
                Some(Scalar::Int(v)) => *v,
                Some(Scalar::UInt(v)) => *v as i32,
                Some(Scalar::Byte(v)) => i32::from(*v),
                _ => 0,
            };
            out.write_i32::<LittleEndian>(v)?;
        }
        FieldType::UInt => {
            let v = match scalar {
                Some(Scalar::UInt(v)) => *v,
                Some(Scalar::Int(v)) => *v as u32,
                Some(Scalar::Byte(v)) => u32::from(*v),
                _ => 0,
            };
            out.write_u32::<LittleEndian>(v)?;
        }
        FieldType::ULong => {
            let v = match scalar {
                Some(Scalar::ULong(v)) => *v,
                Some(Scalar::UInt(v)) => u64::from(*v),
                Some(Scalar::Int(v)) => *v as u64,
                _ => 0,
            };
            out.write_u64::<LittleEndian>(v)?;
        }
        FieldType::Float => {
            let v = match scalar {
                Some(Scalar::Float(v)) => *v,
                _ => 0.0,
            };
            out.write_f32::<LittleEndian>(v)?;
        }
        FieldType::Byte => {
            let v = match scalar {
                Some(Scalar::Byte(v)) => *v,
                Some(Scalar::UInt(v)) => *v as u8,
                Some(Scalar::Int(v)) => *v as u8,
                _ => 0,
            };
            out.write_u8(v)?;
        }
        FieldType::String => {
            let text = match scalar {
                Some(Scalar::String(s)) => s.as_str(),
                _ => "",
            };
            out.write_u32::<LittleEndian>(pool.intern(text))?;
        }
        FieldType::Loc => unreachable!("loc fields are encoded as blocks"),
    }
    Ok(())
}

fn encode_default(
    out: &mut Vec<u8>,
    field: &FieldDefinition,
    pool: &mut StringPool,
    loc_width: usize,
) -> Result<()> {
    if field.field_type == FieldType::Loc {
        encode_loc(out, &LocString::empty(loc_width), pool, loc_width)
    } else {
        for _ in 0..field.array_size {
            encode_scalar(out, field.field_type, None, pool)?;
        }
        Ok(())
    }
}
