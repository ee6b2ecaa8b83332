//! # wowdbc
//!
//! A pure-Rust codec for the WDBC client database format used by World of
//! Warcraft 3.3.5, plus a localization merger that overlays one language's
//! text from a donor table onto a base table by record identity.
//!
//! Archive handling (MPQ extraction and insertion) is deliberately out of
//! scope: this crate consumes and produces raw table byte buffers.
//!
//! ## Quick Start
//!
//! ```no_run
//! use wowdbc::prelude::*;
//!
//! let schema = read_schema_file("WotLK 3.3.5 (12340).xml", "Spell", "12340")?;
//!
//! let base = std::fs::read("patch/Spell.dbc")?;
//! let locale = std::fs::read("deDE/Spell.dbc")?;
//!
//! let slot = locale_slot("deDE").unwrap();
//! let outcome = localize_table(&base, &locale, &schema, &LocalizeOptions::for_slot(slot))?;
//!
//! println!("merged {} fields", outcome.merged_fields);
//! std::fs::write("merged/Spell.dbc", &outcome.buffer)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Working with tables directly
//!
//! ```no_run
//! use wowdbc::prelude::*;
//!
//! # let schema = read_schema_file("defs.xml", "Spell", "12340")?;
//! let table = read_dbc("Spell.dbc", &schema, &ParseOptions::default())?;
//! let summary = table.summarize(&schema);
//! println!("{} records, {:?} strings per slot", summary.records, summary.populated_per_slot);
//! # Ok::<(), wowdbc::Error>(())
//! ```

pub mod dbc;
pub mod error;
pub mod merge;
pub mod schema;

// Re-exports for convenience
pub use error::{Error, Result};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::error::{Error, Result};

    pub use crate::schema::{FieldDefinition, FieldType, TableSchema, load_schema, read_schema_file};

    pub use crate::dbc::{
        DbcHeader, DbcTable, LocString, ParseOptions, Record, Scalar, StringPool, TableSummary,
        Value, locale_slot, parse_dbc_bytes, read_dbc, serialize_dbc_bytes, write_dbc,
    };

    pub use crate::merge::{
        LocalizeOptions, LocalizeOutcome, MergeOptions, localize_table, merge_localized_text,
    };
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
