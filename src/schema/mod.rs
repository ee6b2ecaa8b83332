//! WDBX table definitions
//!
//! Field layout descriptions for DBC tables, loaded from the WDBX definition
//! XML. A definition is an ordered field list; order defines the byte layout
//! of a record.

mod loader;

pub use loader::{load_schema, read_schema_file};

/// Primitive field types understood by the record codec.
///
/// These mirror the `Type` vocabulary of the WDBX definition XML.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Signed 32-bit integer.
    Int,
    /// Unsigned 32-bit integer.
    UInt,
    /// 32-bit IEEE-754 float.
    Float,
    /// Single raw byte.
    Byte,
    /// Unsigned 64-bit integer.
    ULong,
    /// 32-bit offset into the table's string block.
    String,
    /// Localized string: one string-block offset per language slot plus a flags word.
    Loc,
}

impl FieldType {
    /// Parse a WDBX `Type` attribute value.
    pub(crate) fn parse(name: &str) -> Option<Self> {
        match name {
            "int" => Some(Self::Int),
            "uint" => Some(Self::UInt),
            "float" => Some(Self::Float),
            "byte" => Some(Self::Byte),
            "ulong" => Some(Self::ULong),
            "string" => Some(Self::String),
            "loc" => Some(Self::Loc),
            _ => None,
        }
    }

    /// Byte width of one element of this type.
    ///
    /// `Loc` fields depend on the table's language slot count, which is fixed
    /// at parse time, so `loc_width` is passed in.
    #[must_use]
    pub fn byte_width(self, loc_width: usize) -> usize {
        match self {
            Self::Byte => 1,
            Self::ULong => 8,
            Self::Loc => loc_width * 4 + 4,
            Self::Int | Self::UInt | Self::Float | Self::String => 4,
        }
    }

    /// Number of 4-byte words one element contributes to the header's field count.
    ///
    /// The header counts words, not declared fields; a `Loc` field occupies
    /// its slot words plus the flags word.
    #[must_use]
    pub fn word_count(self, loc_width: usize) -> usize {
        match self {
            Self::Loc => loc_width + 1,
            _ => 1,
        }
    }
}

/// A single field in a table definition.
#[derive(Debug, Clone)]
pub struct FieldDefinition {
    /// Field name, unique within the table.
    pub name: String,
    /// Primitive type.
    pub field_type: FieldType,
    /// Number of consecutive elements (1 for scalars).
    pub array_size: usize,
    /// Whether this field carries the record's identity.
    pub is_index: bool,
}

/// An ordered field layout for one (table, build) pair.
///
/// Immutable once loaded; the first field flagged `is_index` supplies the
/// record identity used to correlate tables during merge.
#[derive(Debug, Clone)]
pub struct TableSchema {
    /// Table name (e.g. `Spell`).
    pub table: String,
    /// Client build the layout applies to (e.g. `12340`).
    pub build: String,
    /// Fields in byte-layout order.
    pub fields: Vec<FieldDefinition>,
}

impl TableSchema {
    /// The field supplying record identity.
    #[must_use]
    pub fn index_field(&self) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.is_index)
    }

    /// Number of localized string fields.
    #[must_use]
    pub fn loc_field_count(&self) -> usize {
        self.fields
            .iter()
            .filter(|f| f.field_type == FieldType::Loc)
            .count()
    }

    /// Total element count of all non-localized fields.
    ///
    /// Used by the reader to back out the language slot width from the
    /// header's declared field count.
    #[must_use]
    pub fn scalar_slot_count(&self) -> usize {
        self.fields
            .iter()
            .filter(|f| f.field_type != FieldType::Loc)
            .map(|f| f.array_size)
            .sum()
    }

    /// Record byte size implied by this definition for a given slot width.
    #[must_use]
    pub fn record_size(&self, loc_width: usize) -> usize {
        self.fields
            .iter()
            .map(|f| f.field_type.byte_width(loc_width) * f.array_size)
            .sum()
    }

    /// Names of localized string fields, in layout order.
    #[must_use]
    pub fn loc_field_names(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.field_type == FieldType::Loc)
            .map(|f| f.name.as_str())
            .collect()
    }
}
