// src/schema/types.rs

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::error::SchemaError;

/// Stable row identifier, persisted in the `record_id` column.
pub type RecordId = u64;

pub const RECORD_ID: &str = "record_id";
pub const RECORD_TYPE: &str = "record_type";
pub const PILLAR: &str = "pillar";
pub const YEAR: &str = "year";
pub const VALUE: &str = "value";
pub const SOURCE_TYPE: &str = "source_type";
pub const CONFIDENCE: &str = "confidence";
pub const EVENT_NAME: &str = "event_name";
pub const EVENT_TYPE: &str = "event_type";
pub const SOURCE_EVENT: &str = "source_event";
pub const TARGET_OBSERVATION: &str = "target_observation";
pub const IMPACT_DIRECTION: &str = "impact_direction";
pub const IMPACT_MAGNITUDE: &str = "impact_magnitude";
pub const LAG_MONTHS: &str = "lag_months";

/// The `record_type` discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Observation,
    Event,
    ImpactLink,
    Target,
    Baseline,
    Forecast,
}

impl RecordKind {
    pub const ALL: [RecordKind; 6] = [
        RecordKind::Observation,
        RecordKind::Event,
        RecordKind::ImpactLink,
        RecordKind::Target,
        RecordKind::Baseline,
        RecordKind::Forecast,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Observation => "observation",
            RecordKind::Event => "event",
            RecordKind::ImpactLink => "impact_link",
            RecordKind::Target => "target",
            RecordKind::Baseline => "baseline",
            RecordKind::Forecast => "forecast",
        }
    }

    pub fn parse_kind(s: &str) -> Option<Self> {
        RecordKind::ALL.into_iter().find(|k| k.as_str() == s)
    }

    /// Columns every row of this kind is expected to carry. Empty for the
    /// externally produced kinds, which only pass structural checks.
    pub fn required_columns(&self) -> &'static [&'static str] {
        match self {
            RecordKind::Observation => &[RECORD_TYPE, YEAR, VALUE, PILLAR, SOURCE_TYPE, CONFIDENCE],
            RecordKind::Event => &[
                RECORD_TYPE,
                YEAR,
                EVENT_NAME,
                EVENT_TYPE,
                SOURCE_TYPE,
                CONFIDENCE,
            ],
            RecordKind::ImpactLink => &[
                RECORD_TYPE,
                SOURCE_EVENT,
                TARGET_OBSERVATION,
                IMPACT_DIRECTION,
                CONFIDENCE,
            ],
            RecordKind::Target | RecordKind::Baseline | RecordKind::Forecast => &[],
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pillar {
    /// Account ownership.
    Access,
    /// Active digital payment use.
    Usage,
}

impl Pillar {
    pub fn as_str(&self) -> &'static str {
        match self {
            Pillar::Access => "access",
            Pillar::Usage => "usage",
        }
    }
}

impl FromStr for Pillar {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "access" => Ok(Pillar::Access),
            "usage" => Ok(Pillar::Usage),
            other => Err(SchemaError::InvalidPillar {
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Pillar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactDirection {
    Positive,
    Negative,
    Neutral,
}

impl ImpactDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImpactDirection::Positive => "positive",
            ImpactDirection::Negative => "negative",
            ImpactDirection::Neutral => "neutral",
        }
    }
}

impl FromStr for ImpactDirection {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "positive" => Ok(ImpactDirection::Positive),
            "negative" => Ok(ImpactDirection::Negative),
            "neutral" => Ok(ImpactDirection::Neutral),
            other => Err(SchemaError::InvalidDirection {
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for ImpactDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single cell. Columns are typed on read; anything absent is `Null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) if f.is_finite() => Some(*f),
            _ => None,
        }
    }

    /// Integers, and floats with no fractional part (`2020.0`).
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Float(f) if f.is_finite() && f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }

    pub fn as_record_id(&self) -> Option<RecordId> {
        self.as_i64().and_then(|i| RecordId::try_from(i).ok())
    }

    /// Textual form used when grouping and when writing a delimited cell.
    /// Floats keep a trailing `.0` so a reload types the column the same way.
    pub fn to_cell(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) if f.is_finite() && f.fract() == 0.0 => format!("{:.1}", f),
            Value::Float(f) => f.to_string(),
            Value::Text(s) => s.clone(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("<null>"),
            other => f.write_str(&other.to_cell()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}
