//! Reading the unified dataset and its side tables from disk, and writing
//! the enriched table back out.

pub mod delimited;
pub mod raw_table;
pub mod sheet;
pub mod utils;
pub mod write;

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use crate::error::SchemaError;
use crate::schema::{UnifiedSchemaValidator, UnifiedTable};

pub use raw_table::RawTable;
pub use utils::SourceFormat;
pub use write::save_enriched_data;

/// Read any supported file into raw string cells, format by extension.
pub fn read_raw(path: &Path) -> Result<RawTable> {
    match SourceFormat::from_path(path) {
        SourceFormat::Spreadsheet => sheet::read_first_sheet(path),
        SourceFormat::Delimited(delimiter) => delimited::read_delimited(path, delimiter),
    }
}

/// Read and type a table with no validation at all.
pub fn read_table(path: &Path) -> Result<UnifiedTable> {
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("table")
        .to_string();
    Ok(read_raw(path)?.into_table(&name))
}

/// Load the unified dataset and run the structural checks.
///
/// Fails when a `record_type` is missing or unknown, or when an event carries
/// a pillar; the returned error wraps a [`SchemaError`]. Impact-link
/// references are not checked here, see
/// [`UnifiedSchemaValidator::validate_impact_links`].
#[tracing::instrument(level = "info", skip(path), fields(path = %path.as_ref().display()))]
pub fn load_unified_data<P: AsRef<Path>>(path: P) -> Result<UnifiedTable> {
    let path = path.as_ref();
    info!("Loading unified data from {}", path.display());

    let table = read_table(path).with_context(|| format!("loading {}", path.display()))?;

    if !UnifiedSchemaValidator::validate_record_type(&table) {
        let err = if table.has_column(crate::schema::RECORD_TYPE) {
            SchemaError::InvalidRecordTypes {
                values: UnifiedSchemaValidator::invalid_record_types(&table),
            }
        } else {
            SchemaError::MissingRecordType
        };
        return Err(err).with_context(|| format!("validating {}", path.display()));
    }

    if !UnifiedSchemaValidator::validate_events_no_pillar(&table) {
        let err = SchemaError::EventsWithPillar {
            count: UnifiedSchemaValidator::events_with_pillar(&table),
        };
        return Err(err).with_context(|| format!("validating {}", path.display()));
    }

    info!("Loaded {} records", table.len());
    info!("Record types: {:?}", table.kind_counts());
    Ok(table)
}

/// Side table of descriptive codes. Pass-through, no validation.
pub fn load_reference_codes<P: AsRef<Path>>(path: P) -> Result<UnifiedTable> {
    let path = path.as_ref();
    info!("Loading reference codes from {}", path.display());
    read_table(path).with_context(|| format!("loading {}", path.display()))
}

/// Pass-through reader for externally produced tables (forecasts, baselines,
/// scenarios). A missing file is an empty table.
pub fn load_optional_table<P: AsRef<Path>>(path: P) -> Result<UnifiedTable> {
    let path = path.as_ref();
    if !path.exists() {
        info!("{} not found; using an empty table", path.display());
        return Ok(UnifiedTable::new());
    }
    read_table(path).with_context(|| format!("loading {}", path.display()))
}
