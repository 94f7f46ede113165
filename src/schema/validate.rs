//! Consistency checks over a loaded table. Nothing in here mutates.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::{error, warn};

use super::table::UnifiedTable;
use super::types::{RecordId, RecordKind, PILLAR, RECORD_TYPE, SOURCE_EVENT, TARGET_OBSERVATION};

/// Links whose references do not resolve to a row of the expected kind.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct LinkReport {
    pub checked: usize,
    pub dangling_sources: Vec<RecordId>,
    pub dangling_targets: Vec<RecordId>,
}

impl LinkReport {
    pub fn is_clean(&self) -> bool {
        self.dangling_sources.is_empty() && self.dangling_targets.is_empty()
    }
}

pub struct UnifiedSchemaValidator;

impl UnifiedSchemaValidator {
    /// Every row's `record_type` must be one of the six kinds. A missing
    /// discriminator column fails outright.
    pub fn validate_record_type(table: &UnifiedTable) -> bool {
        if !table.has_column(RECORD_TYPE) {
            warn!("no `{}` column; cannot validate", RECORD_TYPE);
            return false;
        }
        let invalid = Self::invalid_record_types(table);
        if !invalid.is_empty() {
            warn!("Invalid record_type values found: {:?}", invalid);
            return false;
        }
        true
    }

    /// Distinct discriminator values outside the six kinds, nulls as `<null>`.
    pub fn invalid_record_types(table: &UnifiedTable) -> Vec<String> {
        table
            .iter()
            .filter(|r| r.kind().is_none())
            .map(|r| r.get(RECORD_TYPE).to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Events are pillar-agnostic. Empty tables and tables without a
    /// discriminator pass, since there is nothing to check.
    pub fn validate_events_no_pillar(table: &UnifiedTable) -> bool {
        let count = Self::events_with_pillar(table);
        if count > 0 {
            error!("Events must NOT have pillar assignments ({} offending rows)", count);
            return false;
        }
        true
    }

    pub fn events_with_pillar(table: &UnifiedTable) -> usize {
        if table.is_empty() || !table.has_column(RECORD_TYPE) || !table.has_column(PILLAR) {
            return 0;
        }
        table
            .of_kind(RecordKind::Event)
            .filter(|r| !r.get(PILLAR).is_null())
            .count()
    }

    /// Reports dangling link references as warnings and always passes:
    /// bulk-loaded history is tolerated, new links are checked on insert.
    pub fn validate_impact_links(table: &UnifiedTable) -> bool {
        let report = Self::check_impact_links(table);
        for id in &report.dangling_sources {
            warn!(link = id, "impact link source_event does not resolve to an event");
        }
        for id in &report.dangling_targets {
            warn!(
                link = id,
                "impact link target_observation does not resolve to an observation"
            );
        }
        if !report.dangling_sources.is_empty() {
            warn!(
                "Impact links reference invalid events: {}",
                report.dangling_sources.len()
            );
        }
        if !report.dangling_targets.is_empty() {
            warn!(
                "Impact links reference invalid observations: {}",
                report.dangling_targets.len()
            );
        }
        true
    }

    pub fn check_impact_links(table: &UnifiedTable) -> LinkReport {
        let mut report = LinkReport::default();
        if table.is_empty() || !table.has_column(RECORD_TYPE) {
            return report;
        }
        for link in table.of_kind(RecordKind::ImpactLink) {
            report.checked += 1;
            if table
                .resolve(link.get(SOURCE_EVENT), RecordKind::Event)
                .is_none()
            {
                report.dangling_sources.push(link.id);
            }
            if table
                .resolve(link.get(TARGET_OBSERVATION), RecordKind::Observation)
                .is_none()
            {
                report.dangling_targets.push(link.id);
            }
        }
        report
    }

    /// Required columns absent from the table, per validated kind present.
    pub fn missing_required_columns(table: &UnifiedTable) -> BTreeMap<RecordKind, Vec<&'static str>> {
        let mut missing = BTreeMap::new();
        for kind in [RecordKind::Observation, RecordKind::Event, RecordKind::ImpactLink] {
            if table.of_kind(kind).next().is_none() {
                continue;
            }
            let absent: Vec<&'static str> = kind
                .required_columns()
                .iter()
                .copied()
                .filter(|c| !table.has_column(c))
                .collect();
            if !absent.is_empty() {
                missing.insert(kind, absent);
            }
        }
        missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::{Value, IMPACT_DIRECTION, VALUE, YEAR};
    use proptest::prelude::*;

    fn kinds(rows: &[(&str, Option<&str>)]) -> UnifiedTable {
        UnifiedTable::from_rows(
            &[RECORD_TYPE, PILLAR, YEAR],
            rows.iter().map(|(kind, pillar)| {
                vec![
                    (RECORD_TYPE, Value::from(*kind)),
                    (PILLAR, Value::from(*pillar)),
                ]
            }),
        )
    }

    #[test]
    fn record_type_valid() {
        let table = kinds(&[
            ("observation", None),
            ("event", None),
            ("impact_link", None),
            ("target", None),
        ]);
        assert!(UnifiedSchemaValidator::validate_record_type(&table));
    }

    #[test]
    fn record_type_invalid() {
        let table = kinds(&[("observation", None), ("invalid_type", None), ("event", None)]);
        assert!(!UnifiedSchemaValidator::validate_record_type(&table));
        assert_eq!(
            UnifiedSchemaValidator::invalid_record_types(&table),
            vec!["invalid_type".to_string()]
        );
    }

    #[test]
    fn record_type_missing_column() {
        let table = UnifiedTable::from_rows(
            &[YEAR, VALUE],
            vec![vec![(YEAR, Value::Int(2021)), (VALUE, Value::Float(50.0))]],
        );
        assert!(!UnifiedSchemaValidator::validate_record_type(&table));
        assert!(!UnifiedSchemaValidator::validate_record_type(&UnifiedTable::new()));
    }

    #[test]
    fn null_record_type_is_invalid() {
        let table = UnifiedTable::from_rows(
            &[RECORD_TYPE, YEAR],
            vec![
                vec![(RECORD_TYPE, Value::from("event"))],
                vec![(YEAR, Value::Int(2020))],
            ],
        );
        assert!(!UnifiedSchemaValidator::validate_record_type(&table));
        assert_eq!(
            UnifiedSchemaValidator::invalid_record_types(&table),
            vec!["<null>".to_string()]
        );
    }

    #[test]
    fn events_without_pillar_pass() {
        let table = kinds(&[("event", None), ("event", None), ("observation", Some("access"))]);
        assert!(UnifiedSchemaValidator::validate_events_no_pillar(&table));
    }

    #[test]
    fn events_with_pillar_fail() {
        let table = kinds(&[("event", Some("access")), ("event", Some("usage"))]);
        assert!(!UnifiedSchemaValidator::validate_events_no_pillar(&table));
        assert_eq!(UnifiedSchemaValidator::events_with_pillar(&table), 2);
    }

    #[test]
    fn events_check_is_vacuous_without_data() {
        assert!(UnifiedSchemaValidator::validate_events_no_pillar(&UnifiedTable::new()));
        let no_discriminator = UnifiedTable::from_rows(
            &[PILLAR],
            vec![vec![(PILLAR, Value::from("access"))]],
        );
        assert!(UnifiedSchemaValidator::validate_events_no_pillar(&no_discriminator));
    }

    #[test]
    fn dangling_links_warn_but_pass() {
        let table = UnifiedTable::from_rows(
            &[RECORD_TYPE, SOURCE_EVENT, TARGET_OBSERVATION, IMPACT_DIRECTION],
            vec![
                vec![(RECORD_TYPE, Value::from("observation"))],
                vec![
                    (RECORD_TYPE, Value::from("impact_link")),
                    (SOURCE_EVENT, Value::Int(42)),
                    (TARGET_OBSERVATION, Value::Int(0)),
                    (IMPACT_DIRECTION, Value::from("positive")),
                ],
            ],
        );
        assert!(UnifiedSchemaValidator::validate_impact_links(&table));

        let report = UnifiedSchemaValidator::check_impact_links(&table);
        assert_eq!(report.checked, 1);
        assert_eq!(report.dangling_sources, vec![1]);
        assert!(report.dangling_targets.is_empty());
    }

    #[test]
    fn links_with_string_references_still_pass() {
        let table = UnifiedTable::from_rows(
            &[RECORD_TYPE, SOURCE_EVENT],
            vec![vec![
                (RECORD_TYPE, Value::from("impact_link")),
                (SOURCE_EVENT, Value::from("event_1")),
            ]],
        );
        assert!(UnifiedSchemaValidator::validate_impact_links(&table));
        let report = UnifiedSchemaValidator::check_impact_links(&table);
        assert_eq!(report.dangling_sources, vec![0]);
        assert_eq!(report.dangling_targets, vec![0]);
    }

    #[test]
    fn missing_required_columns_only_for_present_kinds() {
        let table = UnifiedTable::from_rows(
            &[RECORD_TYPE, YEAR],
            vec![vec![(RECORD_TYPE, Value::from("event")), (YEAR, Value::Int(2021))]],
        );
        let missing = UnifiedSchemaValidator::missing_required_columns(&table);
        assert_eq!(missing.len(), 1);
        assert_eq!(
            missing[&RecordKind::Event],
            vec!["event_name", "event_type", "source_type", "confidence"]
        );
    }

    fn arb_kind() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("observation".to_string()),
            Just("event".to_string()),
            Just("impact_link".to_string()),
            Just("target".to_string()),
            Just("baseline".to_string()),
            Just("forecast".to_string()),
            "[a-z_]{1,12}",
        ]
    }

    fn arb_pillar() -> impl Strategy<Value = Option<String>> {
        prop_oneof![
            Just(None),
            Just(Some("access".to_string())),
            Just(Some("usage".to_string())),
        ]
    }

    proptest! {
        #[test]
        fn record_type_fails_iff_some_kind_is_unknown(
            rows in prop::collection::vec(arb_kind(), 0..20)
        ) {
            let table = UnifiedTable::from_rows(
                &[RECORD_TYPE],
                rows.iter().map(|k| vec![(RECORD_TYPE, Value::from(k.as_str()))]),
            );
            let any_unknown = rows.iter().any(|k| RecordKind::parse_kind(k).is_none());
            prop_assert_eq!(
                UnifiedSchemaValidator::validate_record_type(&table),
                !any_unknown
            );
        }

        #[test]
        fn events_fail_iff_one_carries_a_pillar(
            rows in prop::collection::vec((arb_kind(), arb_pillar()), 0..20)
        ) {
            let table = UnifiedTable::from_rows(
                &[RECORD_TYPE, PILLAR],
                rows.iter().map(|(k, p)| {
                    vec![
                        (RECORD_TYPE, Value::from(k.as_str())),
                        (PILLAR, Value::from(p.clone())),
                    ]
                }),
            );
            let offending = rows.iter().any(|(k, p)| k == "event" && p.is_some());
            prop_assert_eq!(
                UnifiedSchemaValidator::validate_events_no_pillar(&table),
                !offending
            );
        }
    }
}
