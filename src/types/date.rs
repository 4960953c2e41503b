// src/types/date.rs

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::ParseError;

/// Represents a Parse Date type, `{"__type":"Date","iso":"..."}`.
/// Parse stores dates in UTC with millisecond precision.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ParseDate {
    #[serde(rename = "__type")]
    pub __type: String, // Should always be "Date"
    pub iso: String,
}

impl ParseDate {
    /// Creates a new ParseDate from an ISO 8601 string.
    /// Note: This does not validate the string format.
    pub fn new(iso_string: impl Into<String>) -> Self {
        ParseDate {
            __type: "Date".to_string(),
            iso: iso_string.into(),
        }
    }

    pub fn iso(&self) -> &str {
        &self.iso
    }

    /// Builds a date in the exact form Parse Server emits (`YYYY-MM-DDTHH:MM:SS.mmmZ`).
    pub fn from_datetime(datetime: DateTime<Utc>) -> Self {
        ParseDate::new(datetime.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn to_datetime(&self) -> Result<DateTime<Utc>, ParseError> {
        parse_iso(&self.iso)
    }
}

impl From<DateTime<Utc>> for ParseDate {
    fn from(datetime: DateTime<Utc>) -> Self {
        ParseDate::from_datetime(datetime)
    }
}

/// Parses an RFC 3339 timestamp as sent in `iso`, `createdAt` and `updatedAt`.
pub fn parse_iso(iso: &str) -> Result<DateTime<Utc>, ParseError> {
    DateTime::parse_from_rfc3339(iso)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ParseError::InvalidInput(format!("'{}' is not an ISO 8601 date: {}", iso, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn formats_with_millis_and_z_suffix() {
        let dt = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        let date = ParseDate::from_datetime(dt);
        assert_eq!(date.iso(), "2024-03-09T14:05:07.000Z");
        assert_eq!(date.to_datetime().unwrap(), dt);
    }

    #[test]
    fn rejects_garbage() {
        assert!(ParseDate::new("yesterday").to_datetime().is_err());
    }

    #[test]
    fn serializes_with_type_tag() {
        let value = serde_json::to_value(ParseDate::new("2020-01-01T00:00:00.000Z")).unwrap();
        assert_eq!(value["__type"], "Date");
        assert_eq!(value["iso"], "2020-01-01T00:00:00.000Z");
    }
}
