use anyhow::{anyhow, Result};
use calamine::{open_workbook_auto, Data, Range, Reader};
use std::path::Path;
use tracing::debug;

use super::raw_table::RawTable;

/// Every sheet of a workbook, in workbook order. The first row of each sheet
/// is its header.
pub fn read_sheets(path: &Path) -> Result<Vec<(String, RawTable)>> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| anyhow!("opening workbook {}: {}", path.display(), e))?;

    let mut sheets = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| anyhow!("reading sheet `{}` of {}: {}", name, path.display(), e))?;
        debug!(sheet = %name, rows = range.height(), "read sheet");
        sheets.push((name, range_to_raw(&range)));
    }
    Ok(sheets)
}

/// The first sheet only, which is what a plain spreadsheet load means.
pub fn read_first_sheet(path: &Path) -> Result<RawTable> {
    read_sheets(path)?
        .into_iter()
        .next()
        .map(|(_, raw)| raw)
        .ok_or_else(|| anyhow!("workbook {} has no sheets", path.display()))
}

fn range_to_raw(range: &Range<Data>) -> RawTable {
    let mut rows = range.rows();
    let headers = rows
        .next()
        .map(|r| r.iter().map(cell_text).collect())
        .unwrap_or_default();
    let rows = rows.map(|r| r.iter().map(cell_text).collect()).collect();
    RawTable { headers, rows }
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}
