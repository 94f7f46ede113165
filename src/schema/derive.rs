use std::collections::HashSet;

use tracing::{debug, warn};

use super::types::Value;

/// Cell strings treated as missing, matching what spreadsheet exports and
/// dataframe writers commonly emit for empty cells.
const MISSING: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-NaN", "-nan", "<NA>", "N/A", "NA", "NULL", "NaN", "None",
    "n/a", "nan", "null",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Int,
    Float,
    Text,
}

impl ColumnType {
    fn widen(self, other: ColumnType) -> ColumnType {
        match (self, other) {
            (a, b) if a == b => a,
            (ColumnType::Int, ColumnType::Float) | (ColumnType::Float, ColumnType::Int) => {
                ColumnType::Float
            }
            _ => ColumnType::Text,
        }
    }
}

/// A column as read from a delimited file or sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub ty: ColumnType,
}

pub fn is_missing(cell: &str) -> bool {
    MISSING.contains(&cell.trim())
}

/// For each column, look at every row:
///  - Ignore missing cells
///  - Integers stay integers until a float shows up, then the column is float
///  - Anything non-numeric makes the column text
///  - A column with no samples at all is text
///
/// Blank headers become `unnamed_<idx>`, repeated ones get a `.<n>` suffix.
pub fn derive_types(table_name: &str, header_names: &[String], rows: &[Vec<String>]) -> Vec<Column> {
    if rows.iter().any(|r| r.len() > header_names.len()) {
        warn!(
            "derive_types: some rows in `{}` have more cells than headers ({} headers)",
            table_name,
            header_names.len()
        );
    }

    let mut seen_names: HashSet<String> = HashSet::new();
    let mut cols = Vec::with_capacity(header_names.len());

    for (idx, raw_name) in header_names.iter().enumerate() {
        let mut name = raw_name.trim().to_string();
        if name.is_empty() {
            name = format!("unnamed_{}", idx);
            debug!("derive_types: blank header at {} in `{}` → {}", idx, table_name, name);
        }
        if seen_names.contains(&name) {
            let base = name.clone();
            let mut n = 1;
            while seen_names.contains(&format!("{}.{}", base, n)) {
                n += 1;
            }
            name = format!("{}.{}", base, n);
            warn!("derive_types: duplicate header `{}` in `{}` renamed to `{}`", base, table_name, name);
        }
        seen_names.insert(name.clone());

        let mut ty: Option<ColumnType> = None;
        for row in rows {
            let cell = row.get(idx).map(|s| s.trim()).unwrap_or("");
            if is_missing(cell) {
                continue;
            }
            let inferred = infer_type(cell);
            ty = Some(match ty {
                None => inferred,
                Some(prev) => prev.widen(inferred),
            });
            if ty == Some(ColumnType::Text) {
                break;
            }
        }

        let ty = ty.unwrap_or_else(|| {
            debug!("derive_types: no samples for `{}` in `{}`, defaulting to text", name, table_name);
            ColumnType::Text
        });
        cols.push(Column { name, ty });
    }

    cols
}

/// Convert one raw cell according to its column type.
pub fn parse_cell(raw: &str, ty: ColumnType) -> Value {
    let v = raw.trim();
    if is_missing(v) {
        return Value::Null;
    }
    match ty {
        ColumnType::Int => v.parse().map(Value::Int).unwrap_or_else(|_| Value::from(v)),
        ColumnType::Float => v.parse().map(Value::Float).unwrap_or_else(|_| Value::from(v)),
        ColumnType::Text => Value::from(v),
    }
}

fn infer_type(v: &str) -> ColumnType {
    if v.parse::<i64>().is_ok() {
        ColumnType::Int
    } else if v.parse::<f64>().is_ok() {
        ColumnType::Float
    } else {
        ColumnType::Text
    }
}
