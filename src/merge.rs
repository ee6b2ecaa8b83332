//! Localized text merging
//!
//! Overlays one language's text from a donor table onto a primary table,
//! matched by record identity. The primary defines the output record set:
//! merging replaces slot text in records that exist on both sides and never
//! adds or removes rows.

use crate::dbc::{DbcTable, ParseOptions, Value, parse_dbc_bytes, serialize_dbc_bytes};
use crate::error::Result;
use crate::schema::TableSchema;

/// Knobs for the merge step.
#[derive(Debug, Clone, Copy, Default)]
pub struct MergeOptions {
    /// Language slot to overlay (see [`locale_slot`]).
    ///
    /// [`locale_slot`]: crate::dbc::locale_slot
    pub target_slot: usize,
    /// Also OR bit `1 << target_slot` into the flags word of every field
    /// that received text, marking the locale as present the way the
    /// client's own data does.
    pub set_flags_bit: bool,
}

impl MergeOptions {
    /// Options overlaying `slot` with the default flags policy.
    #[must_use]
    pub fn for_slot(slot: usize) -> Self {
        Self {
            target_slot: slot,
            set_flags_bit: false,
        }
    }
}

/// Overlay donor text onto the primary table's localized fields.
///
/// For every primary record whose identity exists in the donor, each
/// localized field present on both sides takes the donor's target-slot text
/// when that text is non-empty. Returns the number of fields overwritten;
/// zero is a valid outcome (nothing matched, or the donor slot was empty
/// throughout). Running the same merge twice leaves the table unchanged
/// after the first pass.
pub fn merge_localized_text(
    primary: &mut DbcTable,
    donor: &DbcTable,
    schema: &TableSchema,
    options: &MergeOptions,
) -> usize {
    let loc_fields = schema.loc_field_names();
    let mut merged = 0usize;

    for (key, record) in &mut primary.records {
        let Some(donor_record) = donor.records.get(key) else {
            continue;
        };

        for name in &loc_fields {
            let Some(text) = donor_record
                .get(name)
                .and_then(Value::as_loc)
                .and_then(|loc| loc.slot(options.target_slot))
            else {
                continue;
            };
            let Some(loc) = record.get_mut(name).and_then(Value::as_loc_mut) else {
                continue;
            };

            loc.set_slot(options.target_slot, text);
            if options.set_flags_bit && options.target_slot < 32 {
                loc.flags |= 1 << options.target_slot;
            }
            merged += 1;
        }
    }

    tracing::info!(
        "Merged {} localized fields into {} (slot {})",
        merged,
        schema.table,
        options.target_slot
    );

    merged
}

/// Configuration for the whole localize pipeline.
#[derive(Debug, Clone, Copy)]
pub struct LocalizeOptions {
    /// Language slot to overlay.
    pub target_slot: usize,
    /// Fallback slot width when header arithmetic cannot derive it.
    pub assumed_loc_width: usize,
    /// Flags policy, see [`MergeOptions::set_flags_bit`].
    pub set_flags_bit: bool,
}

impl LocalizeOptions {
    /// Pipeline options overlaying `slot`, with the standard 16-slot fallback.
    #[must_use]
    pub fn for_slot(slot: usize) -> Self {
        Self {
            target_slot: slot,
            assumed_loc_width: crate::dbc::DEFAULT_LOC_WIDTH,
            set_flags_bit: false,
        }
    }
}

/// What a pipeline run produced.
#[derive(Debug, Clone)]
pub struct LocalizeOutcome {
    /// The merged table, re-serialized.
    pub buffer: Vec<u8>,
    /// Localized fields overwritten with donor text.
    pub merged_fields: usize,
    /// Record count of the primary (and therefore the output).
    pub primary_records: usize,
    /// Record count of the donor.
    pub donor_records: usize,
}

/// Parse both buffers, overlay donor text onto the primary, re-serialize.
///
/// The whole in-memory pipeline over two table buffers: both sides are
/// decoded with the same definition (the donor may still be narrower on
/// disk), the donor's target-slot text is merged in, and the primary is
/// written back out with a fresh string pool. Each call is self-contained;
/// nothing is cached across invocations.
///
/// # Errors
/// Returns any parse or serialization error from the underlying steps.
pub fn localize_table(
    primary: &[u8],
    donor: &[u8],
    schema: &TableSchema,
    options: &LocalizeOptions,
) -> Result<LocalizeOutcome> {
    let parse_options = ParseOptions {
        assumed_loc_width: options.assumed_loc_width,
    };

    let mut primary_table = parse_dbc_bytes(primary, schema, &parse_options)?;
    let donor_table = parse_dbc_bytes(donor, schema, &parse_options)?;

    tracing::info!(
        "Localizing {}: {} primary records, {} donor records, slot {}",
        schema.table,
        primary_table.records.len(),
        donor_table.records.len(),
        options.target_slot
    );

    let merge_options = MergeOptions {
        target_slot: options.target_slot,
        set_flags_bit: options.set_flags_bit,
    };
    let merged_fields =
        merge_localized_text(&mut primary_table, &donor_table, schema, &merge_options);

    let buffer = serialize_dbc_bytes(&primary_table, schema)?;

    Ok(LocalizeOutcome {
        buffer,
        merged_fields,
        primary_records: primary_table.records.len(),
        donor_records: donor_table.records.len(),
    })
}
