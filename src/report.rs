use std::collections::BTreeMap;

use serde::Serialize;

use crate::schema::{
    RecordKind, UnifiedTable, CONFIDENCE, PILLAR, RECORD_TYPE, SOURCE_TYPE, YEAR,
};

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct YearRange {
    pub min: Option<i64>,
    pub max: Option<i64>,
}

/// Dataset composition counts. Nulls are never counted.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct CompositionStats {
    pub total_records: usize,
    pub by_record_type: BTreeMap<String, usize>,
    pub by_pillar: BTreeMap<String, usize>,
    pub by_source_type: BTreeMap<String, usize>,
    pub by_confidence: BTreeMap<String, usize>,
    pub year_range: YearRange,
}

/// Never fails: each grouping is empty when its column is missing, and the
/// year range is `None` when there are no years.
pub fn quantify_dataset_composition(table: &UnifiedTable) -> CompositionStats {
    let by_pillar = if table.has_column(RECORD_TYPE) && table.has_column(PILLAR) {
        count_values(table, PILLAR, Some(RecordKind::Observation))
    } else {
        BTreeMap::new()
    };

    CompositionStats {
        total_records: table.len(),
        by_record_type: table.kind_counts(),
        by_pillar,
        by_source_type: count_values(table, SOURCE_TYPE, None),
        by_confidence: count_values(table, CONFIDENCE, None),
        year_range: year_range(table),
    }
}

fn count_values(
    table: &UnifiedTable,
    column: &str,
    only: Option<RecordKind>,
) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    if !table.has_column(column) {
        return counts;
    }
    for record in table.iter() {
        if only.is_some_and(|kind| !record.is(kind)) {
            continue;
        }
        let v = record.get(column);
        if !v.is_null() {
            *counts.entry(v.to_cell()).or_insert(0) += 1;
        }
    }
    counts
}

fn year_range(table: &UnifiedTable) -> YearRange {
    if !table.has_column(YEAR) {
        return YearRange::default();
    }
    let years: Vec<f64> = table.iter().filter_map(|r| r.get(YEAR).as_f64()).collect();
    YearRange {
        min: years.iter().copied().reduce(f64::min).map(|y| y as i64),
        max: years.iter().copied().reduce(f64::max).map(|y| y as i64),
    }
}
