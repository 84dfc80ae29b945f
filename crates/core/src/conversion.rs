//! Conversions between submitted JSON values and domain field types.
//!
//! Setters receive raw JSON. These helpers turn it into the typed values the model holds
//! and report anything unusable as [`ReprError::InvalidInput`].

use crate::constants::DATETIME_FORMAT;
use crate::{ReprError, ReprResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use obsrest_uuid::EntityUuid;
use serde_json::Value;

/// A JSON string, or a number/boolean rendered as text.
pub fn expect_string(property: &str, value: &Value) -> ReprResult<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(ReprError::InvalidInput(format!(
            "{property} must be a string, got {other}"
        ))),
    }
}

/// Like [`expect_string`] but `null` clears the field.
pub fn optional_string(property: &str, value: &Value) -> ReprResult<Option<String>> {
    match value {
        Value::Null => Ok(None),
        other => expect_string(property, other).map(Some),
    }
}

/// Identifier of a referenced entity, given either as the bare uuid string or as an
/// object carrying a `uuid` member (the shape of a rendered reference stub).
pub fn reference_uuid(property: &str, value: &Value) -> ReprResult<EntityUuid> {
    let raw = match value {
        Value::String(s) => s.as_str(),
        Value::Object(map) => map.get("uuid").and_then(Value::as_str).ok_or_else(|| {
            ReprError::InvalidInput(format!("{property} reference has no uuid"))
        })?,
        other => {
            return Err(ReprError::InvalidInput(format!(
                "{property} must reference an entity by uuid, got {other}"
            )))
        }
    };
    Ok(EntityUuid::parse(raw.trim())?)
}

pub fn expect_bool(property: &str, value: &Value) -> ReprResult<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(ReprError::InvalidInput(format!(
                "{property} must be true or false, got {s}"
            ))),
        },
        other => Err(ReprError::InvalidInput(format!(
            "{property} must be a boolean, got {other}"
        ))),
    }
}

/// Parses a submitted timestamp.
///
/// Accepts RFC 3339, the wire format used on output, a naive date-time (taken as UTC) and
/// a bare date (midnight UTC).
pub fn parse_datetime(raw: &str) -> ReprResult<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }
    Err(ReprError::InvalidInput(format!("{raw} is not a valid date")))
}

pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.format(DATETIME_FORMAT).to_string()
}
