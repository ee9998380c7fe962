use chrono::{SecondsFormat, TimeZone, Utc};
use std::fmt::{Debug, Display, Formatter};

use crate::common::get_current_time_or_zero;

/// A UTC instant with millisecond precision, stored as milliseconds since the
/// Unix epoch.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DateTime(i64);

impl DateTime {
    pub const MIN: DateTime = DateTime(i64::MIN);
    pub const MAX: DateTime = DateTime(i64::MAX);

    pub fn from_millis(millis: i64) -> Self {
        DateTime(millis)
    }

    pub fn now() -> Self {
        DateTime(get_current_time_or_zero() as i64)
    }

    pub fn timestamp_millis(&self) -> i64 {
        self.0
    }

    /// Converts to a chrono instant. Returns `None` for instants chrono
    /// cannot represent.
    pub fn to_chrono(&self) -> Option<chrono::DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.0).single()
    }
}

impl From<chrono::DateTime<Utc>> for DateTime {
    fn from(value: chrono::DateTime<Utc>) -> Self {
        DateTime(value.timestamp_millis())
    }
}

impl Debug for DateTime {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.to_chrono() {
            Some(dt) => write!(f, "DateTime({})", dt.to_rfc3339_opts(SecondsFormat::Millis, true)),
            None => write!(f, "DateTime({}ms)", self.0),
        }
    }
}

impl Display for DateTime {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.to_chrono() {
            Some(dt) => write!(f, "{}", dt.to_rfc3339_opts(SecondsFormat::Millis, true)),
            None => write!(f, "{}", self.0),
        }
    }
}
