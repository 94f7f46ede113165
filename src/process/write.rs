use anyhow::{bail, Context, Result};
use std::{
    fs,
    io::BufWriter,
    path::{Path, PathBuf},
};
use tracing::info;

use super::delimited::write_delimited;
use super::utils::SourceFormat;
use crate::schema::{UnifiedTable, RECORD_ID};

/// Persist the table as comma-delimited text: `record_id` first, then every
/// column in first-seen order, nulls as empty cells.
///
/// Writes atomically: to a tmp file next to `path`, then renames over it.
pub fn save_enriched_data<P: AsRef<Path>>(table: &UnifiedTable, path: P) -> Result<()> {
    let path = path.as_ref();
    if SourceFormat::from_path(path) == SourceFormat::Spreadsheet {
        bail!(
            "cannot save to {}: only delimited text output is supported",
            path.display()
        );
    }
    info!("Saving enriched data to {}", path.display());

    // 1) Make sure the parent exists
    let dir = path
        .parent()
        .filter(|d| !d.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    // 2) Header + one line per record, in table order
    let mut headers = Vec::with_capacity(table.columns().len() + 1);
    headers.push(RECORD_ID.to_string());
    headers.extend(table.columns().iter().cloned());

    let rows = table.iter().map(|record| {
        let mut row = Vec::with_capacity(headers.len());
        row.push(record.id.to_string());
        row.extend(table.columns().iter().map(|c| record.get(c).to_cell()));
        row
    });

    // 3) Write to tmp, then rename over the target
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("{} has no file name", path.display()))?;
    let tmp_path: PathBuf = dir.join(format!(".{}.tmp", file_name));
    let tmp = fs::File::create(&tmp_path)
        .with_context(|| format!("creating {}", tmp_path.display()))?;
    write_delimited(BufWriter::new(tmp), &headers, rows)
        .with_context(|| format!("writing {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path)
        .with_context(|| format!("renaming {} -> {}", tmp_path.display(), path.display()))?;

    info!("Saved {} records", table.len());
    Ok(())
}
