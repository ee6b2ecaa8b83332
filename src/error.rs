//! Error types for `wowdbc`

use thiserror::Error;

/// The error type for `wowdbc` operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    // ==================== IO Errors ====================
    /// IO error from file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ==================== Schema Errors ====================
    /// No table definition matched the requested name and build.
    #[error("no definition for table '{table}' build '{build}'")]
    SchemaNotFound {
        /// The requested table name.
        table: String,
        /// The requested client build.
        build: String,
    },

    /// A field definition used a type name the codec does not know.
    #[error("unknown field type '{0}' in definition")]
    UnknownFieldType(String),

    /// The table definition has no field flagged as the index.
    #[error("table '{table}' definition has no index field")]
    SchemaNoIndexField {
        /// The table name.
        table: String,
    },

    // ==================== DBC Format Errors ====================
    /// The buffer is not a valid DBC table (missing WDBC magic).
    #[error("invalid DBC magic: expected WDBC, found {0:?}")]
    InvalidDbcMagic([u8; 4]),

    /// The header's declared sizes do not reconcile with the buffer length.
    #[error("DBC header mismatch: declared {expected} bytes, buffer is {actual}")]
    HeaderMismatch {
        /// Total size implied by the header (20 + records * record_size + string block).
        expected: usize,
        /// Actual buffer length.
        actual: usize,
    },

    // ==================== Parsing Errors ====================
    /// XML parsing error.
    #[error("XML parse error: {0}")]
    XmlError(#[from] quick_xml::Error),

    /// XML attribute error.
    #[error("XML attribute error: {0}")]
    XmlAttrError(String),
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::XmlAttrError(err.to_string())
    }
}

/// A specialized Result type for `wowdbc` operations.
pub type Result<T> = std::result::Result<T, Error>;
