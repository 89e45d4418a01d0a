//! Naive local wall-clock timestamps as exchanged at the API boundary
//! (`YYYY-MM-DD HH:MM:SS`, no timezone conversion).

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serializer;

use crate::error::{AppError, AppResult};

pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse a required timestamp field, reporting the field name on failure.
pub fn parse_required(field: &str, value: Option<&str>) -> AppResult<NaiveDateTime> {
    let value = value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::BadRequest(format!("Missing '{}'", field)))?;

    NaiveDateTime::parse_from_str(value, FORMAT).map_err(|_| {
        AppError::BadRequest(format!(
            "Invalid '{}': expected YYYY-MM-DD HH:MM:SS, got '{}'",
            field, value
        ))
    })
}

/// Parse a `YYYY-MM-DD` date query parameter.
pub fn parse_date(field: &str, value: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest(format!("Invalid '{}': expected YYYY-MM-DD", field)))
}

pub fn format(value: &NaiveDateTime) -> String {
    value.format(FORMAT).to_string()
}

/// `serialize_with` helper for `NaiveDateTime` fields
pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format(value))
}

/// `serialize_with` helpers for `Option<NaiveDateTime>` fields
pub mod option {
    use chrono::NaiveDateTime;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(
        value: &Option<NaiveDateTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.serialize_some(&super::format(v)),
            None => serializer.serialize_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_required() {
        let ts = parse_required("from", Some("2026-01-28 08:00:00")).unwrap();
        assert_eq!(format(&ts), "2026-01-28 08:00:00");
    }

    #[test]
    fn test_parse_required_missing() {
        assert!(matches!(parse_required("from", None), Err(AppError::BadRequest(_))));
        assert!(matches!(parse_required("from", Some("  ")), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_parse_required_rejects_iso_t_separator() {
        assert!(parse_required("to", Some("2026-01-28T08:00:00")).is_err());
    }
}
