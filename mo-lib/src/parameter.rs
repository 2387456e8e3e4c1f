//! Parameter values as stored and exchanged by the MO services.
use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// A parameter value.
///
/// Deserializes from plain JSON scalars. Integers that fit an `i64` become
/// [ParameterValue::Integer], all other numbers [ParameterValue::Float].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum ParameterValue {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl ParameterValue {
    /// Convert a JSON telemetry leaf. Nulls have no value, and arrays or objects are
    /// kept as their JSON text.
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(b) => Some(Self::Boolean(*b)),
            Value::Number(n) => Some(Self::from_number(n)),
            Value::String(s) => Some(Self::String(s.clone())),
            Value::Array(_) | Value::Object(_) => Some(Self::String(value.to_string())),
        }
    }

    fn from_number(n: &Number) -> Self {
        match n.as_i64() {
            Some(i) => Self::Integer(i),
            None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
        }
    }

    /// Numeric view of the value, if it has one.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Integer(i) => Some(*i as f64),
            Self::Boolean(_) | Self::String(_) => None,
        }
    }
}

impl Display for ParameterValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::String(s) => write!(f, "{s}"),
        }
    }
}

impl From<f64> for ParameterValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<i64> for ParameterValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for ParameterValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<&str> for ParameterValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Validity {
    #[default]
    Valid,
    Invalid,
}

impl Display for Validity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Valid => write!(f, "VALID"),
            Self::Invalid => write!(f, "INVALID"),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Quality {
    #[default]
    Good,
    Unknown,
}

impl Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Good => write!(f, "GOOD"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// The latest known value of a named parameter.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    /// `None` only for results synthesized for unknown parameters.
    pub value: Option<ParameterValue>,
    #[serde(rename = "timestamp")]
    pub generation_time: DateTime<Utc>,
    #[serde(default)]
    pub validity: Validity,
    #[serde(default)]
    pub quality: Quality,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl Parameter {
    /// A valid, good quality parameter.
    #[must_use]
    pub fn new(name: &str, value: ParameterValue, generation_time: DateTime<Utc>) -> Self {
        Self {
            name: normalize_name(name),
            value: Some(value),
            generation_time,
            validity: Validity::Valid,
            quality: Quality::Good,
            units: None,
            source: None,
        }
    }

    /// Placeholder returned when a requested parameter is not known.
    #[must_use]
    pub fn missing(name: &str, now: DateTime<Utc>) -> Self {
        Self {
            name: normalize_name(name),
            value: None,
            generation_time: now,
            validity: Validity::Invalid,
            quality: Quality::Unknown,
            units: None,
            source: None,
        }
    }

    #[must_use]
    pub fn with_units(mut self, units: &str) -> Self {
        self.units = Some(units.to_string());
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: &str) -> Self {
        self.source = Some(source.to_string());
        self
    }
}

/// Parameter names are keyed case-insensitively, stored upper-case.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.trim().to_uppercase()
}

/// Engineering units for a measurement, derived from its name.
#[must_use]
pub fn units_for(name: &str) -> &'static str {
    let name = name.to_lowercase();
    if name.contains("temp") {
        "°C"
    } else if name.contains("voltage") {
        "V"
    } else if name.contains("current") {
        "A"
    } else if name.contains("gyro") {
        "rad/s"
    } else if name.contains("charge") {
        "%"
    } else {
        ""
    }
}
