use std::collections::{BTreeMap, HashSet};

use tracing::warn;

use crate::process::utils::clean_str;
use crate::schema::{derive, Record, RecordId, UnifiedTable, Value, RECORD_ID};

/// Header row plus string cells, before any typing.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Type each column and build the unified table.
    ///
    /// A `record_id` column is used as the row identity when every row
    /// carries a distinct non-negative integer in it. Otherwise the column is
    /// dropped and each row's id is its 0-based position, which keeps
    /// positional link references working.
    pub fn into_table(self, name: &str) -> UnifiedTable {
        let rows: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(|cell| clean_str(cell)).collect())
            .collect();
        let cols = derive::derive_types(name, &self.headers, &rows);

        let typed: Vec<Vec<Value>> = rows
            .iter()
            .map(|row| {
                cols.iter()
                    .enumerate()
                    .map(|(i, col)| {
                        row.get(i)
                            .map(|cell| derive::parse_cell(cell, col.ty))
                            .unwrap_or(Value::Null)
                    })
                    .collect()
            })
            .collect();

        let id_col = cols.iter().position(|c| c.name == RECORD_ID);
        let ids = id_col.and_then(|i| stable_ids(name, &typed, i));
        if id_col.is_some() && ids.is_none() {
            warn!(
                "`{}` has a {} column that is not a complete set of unique ids; using row positions",
                name, RECORD_ID
            );
        }

        let columns: Vec<String> = cols
            .iter()
            .filter(|c| c.name != RECORD_ID)
            .map(|c| c.name.clone())
            .collect();

        let records = typed
            .into_iter()
            .enumerate()
            .map(|(pos, row)| {
                let id = ids.as_ref().map_or(pos as RecordId, |ids| ids[pos]);
                let fields: BTreeMap<String, Value> = cols
                    .iter()
                    .zip(row)
                    .filter(|(c, _)| c.name != RECORD_ID)
                    .map(|(c, v)| (c.name.clone(), v))
                    .collect();
                Record::new(id, fields)
            })
            .collect();

        UnifiedTable::from_parts(columns, records)
    }
}

fn stable_ids(name: &str, rows: &[Vec<Value>], col: usize) -> Option<Vec<RecordId>> {
    let mut seen = HashSet::with_capacity(rows.len());
    let mut ids = Vec::with_capacity(rows.len());
    for (pos, row) in rows.iter().enumerate() {
        let id = row[col].as_record_id()?;
        if !seen.insert(id) {
            warn!("`{}` repeats {} {} at row {}", name, RECORD_ID, id, pos);
            return None;
        }
        ids.push(id);
    }
    Some(ids)
}
