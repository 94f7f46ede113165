//! Read-only views for the dashboard. Nothing here fails: missing columns or
//! rows just make the result smaller.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::schema::{
    Pillar, Record, RecordId, RecordKind, UnifiedTable, Value, EVENT_NAME, EVENT_TYPE,
    IMPACT_DIRECTION, IMPACT_MAGNITUDE, LAG_MONTHS, PILLAR, SOURCE_EVENT, TARGET_OBSERVATION,
    VALUE, YEAR,
};

/// One row of the event → indicator summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImpactSummary {
    pub event_name: String,
    pub event_year: Option<i64>,
    pub indicator: String,
    pub direction: String,
    pub magnitude: Option<f64>,
    pub lag_months: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearPoint {
    pub year: i64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineEvent {
    pub id: RecordId,
    pub year: i64,
    pub event_name: String,
    pub event_type: Option<String>,
}

pub fn get_observations_by_pillar<'a>(table: &'a UnifiedTable, pillar: &str) -> Vec<&'a Record> {
    table
        .of_kind(RecordKind::Observation)
        .filter(|r| r.text(PILLAR) == Some(pillar))
        .collect()
}

/// All events, or only those in `year`.
pub fn get_events_by_year(table: &UnifiedTable, year: Option<i64>) -> Vec<&Record> {
    table
        .of_kind(RecordKind::Event)
        .filter(|r| year.map_or(true, |y| r.get(YEAR).as_i64() == Some(y)))
        .collect()
}

pub fn get_impact_links_for_event(table: &UnifiedTable, event: RecordId) -> Vec<&Record> {
    table
        .of_kind(RecordKind::ImpactLink)
        .filter(|r| r.get(SOURCE_EVENT).as_record_id() == Some(event))
        .collect()
}

/// Display name for an event: its name, else its type, else `Event <id>`.
/// Any non-null cell counts, whatever type the column was read as.
pub fn event_label(event: &Record) -> String {
    cell_string(event, EVENT_NAME)
        .or_else(|| cell_string(event, EVENT_TYPE))
        .unwrap_or_else(|| format!("Event {}", event.id))
}

fn cell_string(record: &Record, column: &str) -> Option<String> {
    match record.get(column) {
        Value::Null => None,
        v => Some(v.to_cell()),
    }
}

/// Join every impact link to its event and observation. Links that do not
/// resolve are dropped.
pub fn get_events_with_impacts(table: &UnifiedTable) -> Vec<ImpactSummary> {
    let has = |kind| table.of_kind(kind).next().is_some();
    if !(has(RecordKind::Observation) && has(RecordKind::Event) && has(RecordKind::ImpactLink)) {
        return Vec::new();
    }

    table
        .of_kind(RecordKind::ImpactLink)
        .filter_map(|link| {
            let event = table.resolve(link.get(SOURCE_EVENT), RecordKind::Event)?;
            let obs = table.resolve(link.get(TARGET_OBSERVATION), RecordKind::Observation)?;
            Some(ImpactSummary {
                event_name: event_label(event),
                event_year: event.get(YEAR).as_i64(),
                indicator: match obs.get(PILLAR) {
                    Value::Null => "Unknown".to_string(),
                    v => v.to_cell(),
                },
                direction: link
                    .text(IMPACT_DIRECTION)
                    .unwrap_or("positive")
                    .to_string(),
                magnitude: link.get(IMPACT_MAGNITUDE).as_f64(),
                lag_months: link.get(LAG_MONTHS).as_f64(),
            })
        })
        .collect()
}

/// Mean observation value per year for one pillar, ascending by year.
pub fn pillar_series(table: &UnifiedTable, pillar: Pillar) -> Vec<YearPoint> {
    let mut by_year: BTreeMap<i64, (f64, usize)> = BTreeMap::new();
    for obs in get_observations_by_pillar(table, pillar.as_str()) {
        let (Some(year), Some(value)) = (obs.get(YEAR).as_i64(), obs.get(VALUE).as_f64()) else {
            continue;
        };
        let slot = by_year.entry(year).or_insert((0.0, 0));
        slot.0 += value;
        slot.1 += 1;
    }
    by_year
        .into_iter()
        .map(|(year, (sum, n))| YearPoint {
            year,
            value: sum / n as f64,
        })
        .collect()
}

/// Events that have a year, in table order.
pub fn event_timeline(table: &UnifiedTable) -> Vec<TimelineEvent> {
    table
        .of_kind(RecordKind::Event)
        .filter_map(|event| {
            Some(TimelineEvent {
                id: event.id,
                year: event.get(YEAR).as_i64()?,
                event_name: event_label(event),
                event_type: cell_string(event, EVENT_TYPE),
            })
        })
        .collect()
}
