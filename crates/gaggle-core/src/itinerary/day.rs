use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// The `day` value attached to an itinerary item.
///
/// Generated items are not validated, so a tag is either a day number
/// (integers, integral floats and integer strings all land here, including
/// zero and negatives) or whatever raw text was sent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DayTag {
    Number(i64),
    Raw(String),
}

impl DayTag {
    /// Day used when an item carries no tag.
    pub const DEFAULT: DayTag = DayTag::Number(1);

    /// Resolve an optional tag, defaulting to day 1.
    pub fn or_default(tag: Option<&DayTag>) -> DayTag {
        tag.cloned().unwrap_or(Self::DEFAULT)
    }

    /// The day number when it falls inside `1..=days`.
    pub fn in_range(&self, days: u32) -> Option<u32> {
        match self {
            Self::Number(n) if *n >= 1 && *n <= i64::from(days) => u32::try_from(*n).ok(),
            _ => None,
        }
    }

    fn from_value(value: Value) -> Self {
        match value {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Number(i)
                } else {
                    match n.as_f64() {
                        Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 => {
                            Self::Number(f as i64)
                        }
                        _ => Self::Raw(n.to_string()),
                    }
                }
            }
            Value::String(s) => match s.trim().parse::<i64>() {
                Ok(i) => Self::Number(i),
                Err(_) => Self::Raw(s),
            },
            other => Self::Raw(other.to_string()),
        }
    }
}

impl fmt::Display for DayTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Raw(s) => write!(f, "{s:?}"),
        }
    }
}

impl Serialize for DayTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Number(n) => serializer.serialize_i64(*n),
            Self::Raw(s) => serializer.serialize_str(s),
        }
    }
}

impl<'de> Deserialize<'de> for DayTag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from_value)
    }
}
