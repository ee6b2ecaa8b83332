//! WDBC client database format
//!
//! Fixed-layout row store used by the 3.3.5 client: a 20-byte header,
//! `record_count` fixed-width records, then a string block of null-terminated
//! content addressed by byte offset from the block's start.

mod codec;
mod reader;
mod strings;
mod writer;

pub use reader::{ParseOptions, parse_dbc_bytes, read_dbc};
pub use strings::StringPool;
pub use writer::{serialize_dbc_bytes, write_dbc};

use indexmap::IndexMap;

use crate::schema::{FieldType, TableSchema};

/// "WDBC" magic signature bytes.
pub const DBC_SIGNATURE: [u8; 4] = *b"WDBC";

/// Header size in bytes.
pub const HEADER_SIZE: usize = 20;

/// Language slot count used by 3.3.5-era tables.
///
/// The format does not self-describe this; it is recovered from header
/// arithmetic at parse time with this value as the fallback.
pub const DEFAULT_LOC_WIDTH: usize = 16;

/// Locale codes by language slot, in client order.
///
/// Slots 12-15 exist on disk but are unassigned in the 3.3.5 client.
pub const LOCALE_CODES: [&str; 12] = [
    "enUS", "koKR", "frFR", "deDE", "zhCN", "zhTW", "esES", "esMX", "ruRU", "jaJP", "ptPT", "itIT",
];

/// Look up the language slot for a locale code, case-insensitively.
///
/// Accepts the client aliases (`enCN`/`zhCN`, `enTW`/`zhTW`, `ptBR`/`ptPT`).
/// Returns `None` for codes the slot table does not assign.
#[must_use]
pub fn locale_slot(code: &str) -> Option<usize> {
    match code.trim().to_ascii_uppercase().as_str() {
        "ENUS" => Some(0),
        "KOKR" => Some(1),
        "FRFR" => Some(2),
        "DEDE" => Some(3),
        "ENCN" | "ZHCN" => Some(4),
        "ENTW" | "ZHTW" => Some(5),
        "ESES" => Some(6),
        "ESMX" => Some(7),
        "RURU" => Some(8),
        "JAJP" => Some(9),
        "PTPT" | "PTBR" => Some(10),
        "ITIT" => Some(11),
        _ => None,
    }
}

/// The fixed 20-byte DBC header, minus the magic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DbcHeader {
    /// Number of records in the record area.
    pub record_count: u32,
    /// Number of 4-byte words per record as declared by the client.
    pub field_count: u32,
    /// Bytes per record.
    pub record_size: u32,
    /// Bytes in the trailing string block.
    pub string_block_size: u32,
}

/// A single typed field element.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// Signed 32-bit integer.
    Int(i32),
    /// Unsigned 32-bit integer.
    UInt(u32),
    /// Unsigned 64-bit integer.
    ULong(u64),
    /// 32-bit float.
    Float(f32),
    /// Raw byte.
    Byte(u8),
    /// String resolved from the string block.
    String(String),
}

impl Scalar {
    /// Interpret this value as a record key, the way the client reads index
    /// columns (as a signed 32-bit word).
    #[must_use]
    pub fn as_key(&self) -> Option<i32> {
        match self {
            Self::Int(v) => Some(*v),
            Self::UInt(v) => Some(*v as i32),
            Self::ULong(v) => Some(*v as i32),
            Self::Byte(v) => Some(i32::from(*v)),
            Self::Float(_) | Self::String(_) => None,
        }
    }
}

/// A localized string: one text per language slot plus a flags word.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LocString {
    /// Per-slot texts; length is the table's slot width.
    pub texts: Vec<String>,
    /// Client locale flags word.
    pub flags: u32,
}

impl LocString {
    /// An all-empty localized string with the given slot width.
    #[must_use]
    pub fn empty(width: usize) -> Self {
        Self {
            texts: vec![String::new(); width],
            flags: 0,
        }
    }

    /// Text in a language slot, if the slot exists and is non-empty.
    #[must_use]
    pub fn slot(&self, index: usize) -> Option<&str> {
        self.texts.get(index).map(String::as_str).filter(|s| !s.is_empty())
    }

    /// Replace the text in a language slot, growing the slot vector if the
    /// table was parsed with a narrower width.
    pub fn set_slot(&mut self, index: usize, text: impl Into<String>) {
        if index >= self.texts.len() {
            self.texts.resize(index + 1, String::new());
        }
        self.texts[index] = text.into();
    }
}

/// A decoded field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Single element (`array_size == 1`).
    Scalar(Scalar),
    /// Ordered elements of an array field.
    Array(Vec<Scalar>),
    /// Localized string field.
    Loc(LocString),
}

impl Value {
    /// Borrow as a localized string, if this is one.
    #[must_use]
    pub fn as_loc(&self) -> Option<&LocString> {
        match self {
            Self::Loc(loc) => Some(loc),
            _ => None,
        }
    }

    /// Mutably borrow as a localized string, if this is one.
    pub fn as_loc_mut(&mut self) -> Option<&mut LocString> {
        match self {
            Self::Loc(loc) => Some(loc),
            _ => None,
        }
    }
}

/// One decoded record: field values keyed by field name, in layout order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    /// Field values in schema order. Fields past a short record's end are absent.
    pub values: IndexMap<String, Value>,
}

impl Record {
    /// Look up a field value by name.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    /// Mutably look up a field value by name.
    pub fn get_mut(&mut self, field: &str) -> Option<&mut Value> {
        self.values.get_mut(field)
    }
}

/// A fully decoded DBC table.
#[derive(Debug, Clone)]
pub struct DbcTable {
    /// Header as read from the source buffer.
    pub header: DbcHeader,
    /// Language slot width resolved at parse time.
    pub loc_width: usize,
    /// Records keyed by identity value, in file order. Duplicate keys keep
    /// the last record seen.
    pub records: IndexMap<i32, Record>,
}

/// Per-slot population statistics for a table's localized fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSummary {
    /// Record count.
    pub records: usize,
    /// Localized field count in the definition.
    pub loc_fields: usize,
    /// Language slot width the table was parsed with.
    pub loc_width: usize,
    /// Non-empty string count per language slot, across all localized fields.
    pub populated_per_slot: Vec<usize>,
}

impl DbcTable {
    /// Count non-empty localized text per language slot.
    ///
    /// Useful for checking which locales a table actually carries before and
    /// after a merge.
    #[must_use]
    pub fn summarize(&self, schema: &TableSchema) -> TableSummary {
        let mut populated = vec![0usize; self.loc_width];

        for record in self.records.values() {
            for field in &schema.fields {
                if field.field_type != FieldType::Loc {
                    continue;
                }
                let Some(loc) = record.get(&field.name).and_then(Value::as_loc) else {
                    continue;
                };
                for (slot, text) in loc.texts.iter().enumerate() {
                    if slot < populated.len() && !text.is_empty() {
                        populated[slot] += 1;
                    }
                }
            }
        }

        TableSummary {
            records: self.records.len(),
            loc_fields: schema.loc_field_count(),
            loc_width: self.loc_width,
            populated_per_slot: populated,
        }
    }
}
