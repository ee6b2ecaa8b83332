//! DBC file writing

use std::fs::File;
use std::io::Write;
use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};

use super::codec::encode_record;
use super::{DBC_SIGNATURE, DbcTable, HEADER_SIZE, StringPool};
use crate::error::Result;
use crate::schema::TableSchema;

/// Write a table to a .dbc file on disk.
///
/// # Errors
/// Returns an error if serialization or file writing fails.
pub fn write_dbc<P: AsRef<Path>>(path: P, table: &DbcTable, schema: &TableSchema) -> Result<()> {
    let buffer = serialize_dbc_bytes(table, schema)?;
    let mut file = File::create(path)?;
    file.write_all(&buffer)?;
    Ok(())
}

/// Serialize a table back into a DBC byte buffer.
///
/// Records are encoded in insertion order against one fresh [`StringPool`];
/// `field_count` and `record_size` are carried from the source header so
/// consumers that trust the original declared shape keep working, while the
/// record count and string block size reflect what was actually written.
/// Each encoded record is brought to exactly `record_size` bytes: zero-padded
/// when the definition is narrower than the on-disk layout, truncated (with a
/// warning) when it is wider.
///
/// # Errors
/// Returns an error if record encoding fails.
pub fn serialize_dbc_bytes(table: &DbcTable, schema: &TableSchema) -> Result<Vec<u8>> {
    let record_size = table.header.record_size as usize;

    let implied = schema.record_size(table.loc_width);
    if implied > record_size {
        tracing::warn!(
            "{}: definition implies {} byte records but header declares {}; encoded records will be truncated",
            schema.table,
            implied,
            record_size
        );
    }

    let mut pool = StringPool::new();
    let mut out =
        Vec::with_capacity(HEADER_SIZE + table.records.len() * record_size);

    out.extend_from_slice(&DBC_SIGNATURE);
    out.write_u32::<LittleEndian>(table.records.len() as u32)?;
    out.write_u32::<LittleEndian>(table.header.field_count)?;
    out.write_u32::<LittleEndian>(table.header.record_size)?;
    out.write_u32::<LittleEndian>(0)?; // string block size, patched below

    for record in table.records.values() {
        let mut bytes = encode_record(schema, record, &mut pool, table.loc_width)?;
        if bytes.len() != record_size {
            bytes.resize(record_size, 0);
        }
        out.extend_from_slice(&bytes);
    }

    let block = pool.into_block();
    let block_size = block.len() as u32;
    out.extend_from_slice(&block);
    out[16..20].copy_from_slice(&block_size.to_le_bytes());

    tracing::debug!(
        "Serialized {}: {} records, {} byte string block, {} bytes total",
        schema.table,
        table.records.len(),
        block_size,
        out.len()
    );

    Ok(out)
}
