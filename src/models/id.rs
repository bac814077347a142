//! Normalized person identifier.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// A validated, non-zero person identifier.
///
/// External records carry ids as JSON numbers or numeric strings. They are
/// converted once at the boundary with [`PersonId::from_value`]; zero,
/// non-finite, fractional and non-numeric values mean "absent".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PersonId(i64);

impl PersonId {
    /// Wraps a raw integer, rejecting zero.
    pub fn new(raw: i64) -> Option<Self> {
        (raw != 0).then_some(Self(raw))
    }

    /// Returns the underlying integer.
    pub fn get(self) -> i64 {
        self.0
    }

    /// Coerces a loosely-typed JSON value into an id.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::new(i)
                } else {
                    n.as_f64().and_then(Self::from_f64)
                }
            }
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    fn from_f64(f: f64) -> Option<Self> {
        if !f.is_finite() || f.fract() != 0.0 || f.abs() > i64::MAX as f64 {
            return None;
        }
        Self::new(f as i64)
    }
}

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PersonId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let parsed = match trimmed.parse::<i64>() {
            Ok(i) => Self::new(i),
            Err(_) => trimmed.parse::<f64>().ok().and_then(Self::from_f64),
        };
        parsed.ok_or_else(|| format!("invalid person id: {s:?}"))
    }
}

impl Serialize for PersonId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.0)
    }
}

impl<'de> Deserialize<'de> for PersonId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(&value)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid person id: {value}")))
    }
}
