use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use super::enums::RecordStatus;

/// Result value of one clinical entry, kept in the shape the service sent it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordValue {
    Number(f64),
    Text(String),
}

impl RecordValue {
    pub fn empty() -> Self {
        Self::Text(String::new())
    }

    /// Numeric reading of the value. Text that parses as a finite number
    /// counts; anything else (including NaN/inf) does not.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) if n.is_finite() => Some(*n),
            Self::Number(_) => None,
            Self::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        }
    }
}

impl Default for RecordValue {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Display for RecordValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for RecordValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for RecordValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// One flattened clinical entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub test_name: String,
    pub value: RecordValue,
    pub status: RecordStatus,
    pub timestamp: Option<DateTime<FixedOffset>>,
}

impl Record {
    pub fn new(
        test_name: impl Into<String>,
        value: impl Into<RecordValue>,
        status: RecordStatus,
    ) -> Self {
        Self {
            test_name: test_name.into(),
            value: value.into(),
            status,
            timestamp: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<FixedOffset>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}
