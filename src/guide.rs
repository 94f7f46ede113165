//! Lookups into the multi-sheet guide describing external data sources.

use once_cell::sync::Lazy;
use regex::Regex;
use std::{collections::BTreeMap, path::Path};
use tracing::{debug, warn};

use crate::process::{sheet, RawTable};

static NAME_COLUMN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)survey|source|name").unwrap());

pub struct DataSourceGuide {
    sheets: Vec<(String, RawTable)>,
}

impl DataSourceGuide {
    /// Read every sheet of the guide workbook. `None` (with a warning) when
    /// the file is missing or unreadable.
    pub fn open<P: AsRef<Path>>(path: P) -> Option<Self> {
        let path = path.as_ref();
        match sheet::read_sheets(path) {
            Ok(sheets) => Some(Self { sheets }),
            Err(e) => {
                warn!("data source guide unavailable: {:#}", e);
                None
            }
        }
    }

    pub fn from_sheets(sheets: Vec<(String, RawTable)>) -> Self {
        Self { sheets }
    }

    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.iter().map(|(name, _)| name.as_str())
    }

    /// Descriptive fields (header → non-empty cell) of the first row in
    /// `sheet` whose source-name cell contains `name`, case-insensitively.
    pub fn lookup(&self, sheet: &str, name: &str) -> Option<BTreeMap<String, String>> {
        let (_, raw) = self.sheets.iter().find(|(s, _)| s == sheet)?;
        lookup_in(sheet, raw, name)
    }

    /// Same as [`lookup`](Self::lookup), trying each sheet in workbook order.
    pub fn lookup_any(&self, name: &str) -> Option<(String, BTreeMap<String, String>)> {
        self.sheets
            .iter()
            .find_map(|(sheet, raw)| lookup_in(sheet, raw, name).map(|hit| (sheet.clone(), hit)))
    }
}

fn lookup_in(sheet: &str, raw: &RawTable, name: &str) -> Option<BTreeMap<String, String>> {
    let Some(col) = raw.headers.iter().position(|h| NAME_COLUMN.is_match(h)) else {
        debug!(sheet, "no source-name column");
        return None;
    };
    let needle = name.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }

    let row = raw.rows.iter().find(|row| {
        row.get(col)
            .map_or(false, |cell| cell.to_lowercase().contains(&needle))
    })?;

    Some(
        raw.headers
            .iter()
            .zip(row)
            .filter(|(h, cell)| !h.trim().is_empty() && !cell.trim().is_empty())
            .map(|(h, cell)| (h.trim().to_string(), cell.trim().to_string()))
            .collect(),
    )
}
