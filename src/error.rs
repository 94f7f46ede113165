//! Hard failures raised by the loader and the add operations.
//!
//! Referential problems found while loading are only logged; everything in
//! here is returned to the caller and never corrected silently.

use thiserror::Error;

use crate::schema::{RecordId, RecordKind};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SchemaError {
    #[error("table has no `record_type` column")]
    MissingRecordType,

    #[error("invalid record_type values in dataset: {values:?}")]
    InvalidRecordTypes { values: Vec<String> },

    #[error("events must not have pillar assignments ({count} event rows carry one)")]
    EventsWithPillar { count: usize },

    #[error("pillar must be 'access' or 'usage', got '{value}'")]
    InvalidPillar { value: String },

    #[error("impact_direction must be 'positive', 'negative' or 'neutral', got '{value}'")]
    InvalidDirection { value: String },

    #[error("metadata key `{key}` is reserved for {kind} records")]
    ReservedField { key: String, kind: RecordKind },

    #[error("{field} refers to record {id}, which does not exist")]
    UnknownRecord { field: &'static str, id: RecordId },

    #[error("{field} refers to record {id}, which is a {found} record, not {expected}")]
    WrongKind {
        field: &'static str,
        id: RecordId,
        expected: RecordKind,
        found: String,
    },
}

impl SchemaError {
    /// True for the errors raised by a link pointing at the wrong row.
    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            SchemaError::UnknownRecord { .. } | SchemaError::WrongKind { .. }
        )
    }
}
