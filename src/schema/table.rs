use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use super::types::{RecordId, RecordKind, Value, RECORD_TYPE};

static NULL: Value = Value::Null;

/// One row of the unified table. Cells not present in `fields` read as null.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub id: RecordId,
    fields: BTreeMap<String, Value>,
}

impl Record {
    pub fn new(id: RecordId, fields: BTreeMap<String, Value>) -> Self {
        let fields = fields.into_iter().filter(|(_, v)| !v.is_null()).collect();
        Self { id, fields }
    }

    /// Cell for `column`, `Value::Null` when the row has none.
    pub fn get(&self, column: &str) -> &Value {
        self.fields.get(column).unwrap_or(&NULL)
    }

    pub fn text(&self, column: &str) -> Option<&str> {
        self.get(column).as_str()
    }

    /// Parsed discriminator; `None` for a missing or unknown `record_type`.
    pub fn kind(&self) -> Option<RecordKind> {
        self.text(RECORD_TYPE).and_then(RecordKind::parse_kind)
    }

    pub fn is(&self, kind: RecordKind) -> bool {
        self.kind() == Some(kind)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// In-memory unified record table.
///
/// `columns` is the union of every column ever used, in first-seen order;
/// `record_id` is implicit and not part of it. Rows are append-only and ids
/// are never reused, so `next_id` only grows.
#[derive(Debug, Clone, Default)]
pub struct UnifiedTable {
    columns: Vec<String>,
    records: Vec<Record>,
    by_id: HashMap<RecordId, usize>,
    next_id: RecordId,
}

impl UnifiedTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from already-typed rows without any validation.
    /// Duplicate ids keep the first occurrence in the index.
    pub fn from_parts(columns: Vec<String>, records: Vec<Record>) -> Self {
        let mut table = Self::new();
        for col in columns {
            table.ensure_column(&col);
        }
        for record in records {
            table.push(record);
        }
        table
    }

    /// Convenience for tests and small fixtures: ids are row positions.
    pub fn from_rows<I, R, K>(columns: &[&str], rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let records = rows
            .into_iter()
            .enumerate()
            .map(|(i, row)| {
                let fields = row.into_iter().map(|(k, v)| (k.into(), v)).collect();
                Record::new(i as RecordId, fields)
            })
            .collect();
        Self::from_parts(columns.iter().map(|c| c.to_string()).collect(), records)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }

    pub fn of_kind(&self, kind: RecordKind) -> impl Iterator<Item = &Record> {
        self.records.iter().filter(move |r| r.is(kind))
    }

    pub fn get(&self, id: RecordId) -> Option<&Record> {
        self.by_id.get(&id).map(|&pos| &self.records[pos])
    }

    /// Resolve a reference cell to a row of `kind`. Anything else is `None`.
    pub fn resolve(&self, reference: &Value, kind: RecordKind) -> Option<&Record> {
        reference
            .as_record_id()
            .and_then(|id| self.get(id))
            .filter(|r| r.is(kind))
    }

    /// The id the next appended row will receive.
    pub fn next_id(&self) -> RecordId {
        self.next_id
    }

    /// Count of rows per discriminator value, nulls excluded.
    pub fn kind_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        if !self.has_column(RECORD_TYPE) {
            return counts;
        }
        for record in &self.records {
            let v = record.get(RECORD_TYPE);
            if !v.is_null() {
                *counts.entry(v.to_cell()).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Append a row built by the caller, issuing it a fresh id. New columns
    /// are registered in the order the fields arrive.
    pub(crate) fn append<I>(&mut self, fields: I) -> RecordId
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        let id = self.next_id;
        let mut row = BTreeMap::new();
        for (key, value) in fields {
            self.ensure_column(&key);
            row.insert(key, value);
        }
        self.push(Record::new(id, row));
        id
    }

    fn ensure_column(&mut self, name: &str) {
        if !self.has_column(name) {
            self.columns.push(name.to_string());
        }
    }

    fn push(&mut self, record: Record) {
        for key in record.fields.keys() {
            if !self.columns.iter().any(|c| c == key) {
                self.columns.push(key.clone());
            }
        }
        self.next_id = self.next_id.max(record.id + 1);
        self.by_id.entry(record.id).or_insert(self.records.len());
        self.records.push(record);
    }
}
