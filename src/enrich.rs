//! Append-only enrichment: new observations, events and impact links.
//!
//! Each add checks its own constraints first and leaves the table untouched
//! on error. Columns the new row does not use stay null for it, and columns
//! introduced through metadata stay null for every earlier row.

use std::collections::BTreeMap;

use tracing::info;

use crate::error::SchemaError;
use crate::schema::{
    ImpactDirection, Pillar, RecordId, RecordKind, UnifiedTable, Value, CONFIDENCE, EVENT_NAME,
    EVENT_TYPE, IMPACT_DIRECTION, PILLAR, RECORD_ID, RECORD_TYPE, SOURCE_EVENT, SOURCE_TYPE,
    TARGET_OBSERVATION, VALUE, YEAR,
};

/// Extra per-row fields. Keys may name new columns.
pub type Metadata = BTreeMap<String, Value>;

pub fn add_observation(
    table: &mut UnifiedTable,
    year: i64,
    value: f64,
    pillar: &str,
    source_type: &str,
    confidence: &str,
    metadata: Option<&Metadata>,
) -> Result<RecordId, SchemaError> {
    let pillar: Pillar = pillar.parse()?;

    let fields = vec![
        (RECORD_TYPE, Value::from(RecordKind::Observation.as_str())),
        (YEAR, Value::Int(year)),
        (VALUE, Value::Float(value)),
        (PILLAR, Value::from(pillar.as_str())),
        (SOURCE_TYPE, Value::from(source_type)),
        (CONFIDENCE, Value::from(confidence)),
    ];
    let id = append(table, RecordKind::Observation, fields, metadata)?;

    info!(
        "Added observation: {} {} = {} ({}, {})",
        pillar, year, value, source_type, confidence
    );
    Ok(id)
}

/// Events are pillar-agnostic: the new row never gets a pillar cell.
pub fn add_event(
    table: &mut UnifiedTable,
    year: i64,
    event_name: &str,
    event_type: &str,
    source_type: &str,
    confidence: &str,
    metadata: Option<&Metadata>,
) -> Result<RecordId, SchemaError> {
    let fields = vec![
        (RECORD_TYPE, Value::from(RecordKind::Event.as_str())),
        (YEAR, Value::Int(year)),
        (EVENT_NAME, Value::from(event_name)),
        (EVENT_TYPE, Value::from(event_type)),
        (SOURCE_TYPE, Value::from(source_type)),
        (CONFIDENCE, Value::from(confidence)),
    ];
    let id = append(table, RecordKind::Event, fields, metadata)?;

    info!(
        "Added event: {} ({}, {}, {})",
        event_name, year, event_type, confidence
    );
    Ok(id)
}

/// Both ends must already exist with the right kind; this is a hard check,
/// unlike the load-time link validation.
pub fn add_impact_link(
    table: &mut UnifiedTable,
    source_event: RecordId,
    target_observation: RecordId,
    impact_direction: ImpactDirection,
    confidence: &str,
    metadata: Option<&Metadata>,
) -> Result<RecordId, SchemaError> {
    expect_kind(table, SOURCE_EVENT, source_event, RecordKind::Event)?;
    expect_kind(
        table,
        TARGET_OBSERVATION,
        target_observation,
        RecordKind::Observation,
    )?;

    let fields = vec![
        (RECORD_TYPE, Value::from(RecordKind::ImpactLink.as_str())),
        (SOURCE_EVENT, Value::from(source_event as i64)),
        (TARGET_OBSERVATION, Value::from(target_observation as i64)),
        (IMPACT_DIRECTION, Value::from(impact_direction.as_str())),
        (CONFIDENCE, Value::from(confidence)),
    ];
    let id = append(table, RecordKind::ImpactLink, fields, metadata)?;

    info!(
        "Added impact_link: event {} -> observation {} ({})",
        source_event, target_observation, impact_direction
    );
    Ok(id)
}

fn expect_kind(
    table: &UnifiedTable,
    field: &'static str,
    id: RecordId,
    expected: RecordKind,
) -> Result<(), SchemaError> {
    let record = table
        .get(id)
        .ok_or(SchemaError::UnknownRecord { field, id })?;
    if record.is(expected) {
        Ok(())
    } else {
        Err(SchemaError::WrongKind {
            field,
            id,
            expected,
            found: record.get(RECORD_TYPE).to_string(),
        })
    }
}

/// Metadata may add columns but never overwrite the row's own fields, its
/// identity, or give an event a pillar.
fn append(
    table: &mut UnifiedTable,
    kind: RecordKind,
    fields: Vec<(&'static str, Value)>,
    metadata: Option<&Metadata>,
) -> Result<RecordId, SchemaError> {
    let mut row: Vec<(String, Value)> = fields
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

    if let Some(meta) = metadata {
        for (key, value) in meta {
            let reserved = key == RECORD_ID
                || key == RECORD_TYPE
                || (kind == RecordKind::Event && key == PILLAR)
                || row.iter().any(|(k, _)| k == key);
            if reserved {
                return Err(SchemaError::ReservedField {
                    key: key.clone(),
                    kind,
                });
            }
            row.push((key.clone(), value.clone()));
        }
    }

    Ok(table.append(row))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::UnifiedSchemaValidator;

    fn event_and_observation() -> (UnifiedTable, RecordId, RecordId) {
        let mut table = UnifiedTable::new();
        let ev = add_event(&mut table, 2020, "Policy X", "policy", "regulator", "high", None).unwrap();
        let obs = add_observation(&mut table, 2020, 40.0, "access", "survey", "high", None).unwrap();
        (table, ev, obs)
    }

    #[test]
    fn observation_rejects_unknown_pillar() {
        let mut table = UnifiedTable::new();
        let err = add_observation(&mut table, 2021, 10.0, "savings", "survey", "high", None)
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::InvalidPillar {
                value: "savings".to_string()
            }
        );
        assert!(table.is_empty());
    }

    #[test]
    fn event_never_carries_a_pillar() {
        let mut table = UnifiedTable::new();
        add_observation(&mut table, 2021, 46.0, "access", "survey", "high", None).unwrap();
        assert!(table.has_column(PILLAR));

        let id = add_event(&mut table, 2021, "Telebirr launch", "product_launch", "operator", "high", None)
            .unwrap();
        assert!(table.get(id).unwrap().get(PILLAR).is_null());
        assert!(UnifiedSchemaValidator::validate_events_no_pillar(&table));
    }

    #[test]
    fn event_metadata_cannot_smuggle_a_pillar() {
        let mut table = UnifiedTable::new();
        let meta = Metadata::from([(PILLAR.to_string(), Value::from("usage"))]);
        let err = add_event(&mut table, 2021, "M-Pesa entry", "market", "operator", "medium", Some(&meta))
            .unwrap_err();
        assert!(matches!(err, SchemaError::ReservedField { .. }));
        assert!(table.is_empty());
    }

    #[test]
    fn metadata_cannot_override_core_fields() {
        let mut table = UnifiedTable::new();
        for key in [RECORD_TYPE, RECORD_ID, YEAR] {
            let meta = Metadata::from([(key.to_string(), Value::from("x"))]);
            let res = add_observation(&mut table, 2021, 1.0, "usage", "gsma", "low", Some(&meta));
            assert!(res.is_err(), "{} should be reserved", key);
        }
        assert!(table.is_empty());
    }

    #[test]
    fn metadata_adds_columns_without_backfilling() {
        let (mut table, _, first_obs) = event_and_observation();
        let meta = Metadata::from([
            ("indicator_code".to_string(), Value::from("ACC_OWNERSHIP")),
            ("notes".to_string(), Value::from("Findex")),
        ]);
        let id = add_observation(&mut table, 2021, 46.0, "access", "survey", "high", Some(&meta))
            .unwrap();

        assert!(table.has_column("indicator_code"));
        assert_eq!(table.get(id).unwrap().text("indicator_code"), Some("ACC_OWNERSHIP"));
        assert!(table.get(first_obs).unwrap().get("indicator_code").is_null());
    }

    #[test]
    fn link_requires_event_source() {
        let (mut table, ev, obs) = event_and_observation();
        let err = add_impact_link(&mut table, obs, obs, ImpactDirection::Positive, "high", None)
            .unwrap_err();
        assert!(err.is_reference());
        assert!(matches!(
            err,
            SchemaError::WrongKind { field: "source_event", expected: RecordKind::Event, .. }
        ));

        let err = add_impact_link(&mut table, ev, ev, ImpactDirection::Positive, "high", None)
            .unwrap_err();
        assert!(matches!(
            err,
            SchemaError::WrongKind {
                field: "target_observation",
                expected: RecordKind::Observation,
                ..
            }
        ));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn link_to_missing_row_is_a_reference_error() {
        let (mut table, ev, _) = event_and_observation();
        let err = add_impact_link(&mut table, ev, 99, ImpactDirection::Negative, "low", None)
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnknownRecord {
                field: "target_observation",
                id: 99
            }
        );
    }

    #[test]
    fn links_never_point_at_links() {
        let (mut table, ev, obs) = event_and_observation();
        let link = add_impact_link(&mut table, ev, obs, ImpactDirection::Neutral, "medium", None)
            .unwrap();
        assert!(add_impact_link(&mut table, link, obs, ImpactDirection::Neutral, "medium", None).is_err());
        assert!(UnifiedSchemaValidator::check_impact_links(&table).is_clean());
    }

    #[test]
    fn load_time_check_tolerates_what_insert_rejects() {
        let mut table = UnifiedTable::from_rows(
            &[RECORD_TYPE, SOURCE_EVENT, TARGET_OBSERVATION],
            vec![
                vec![(RECORD_TYPE, Value::from("observation"))],
                vec![
                    (RECORD_TYPE, Value::from("impact_link")),
                    (SOURCE_EVENT, Value::Int(0)),
                    (TARGET_OBSERVATION, Value::Int(0)),
                ],
            ],
        );
        assert!(UnifiedSchemaValidator::validate_impact_links(&table));
        assert!(add_impact_link(&mut table, 0, 0, ImpactDirection::Positive, "high", None).is_err());
    }
}
