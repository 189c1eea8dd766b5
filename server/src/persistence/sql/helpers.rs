//! Column decoding shared by the repositories.
//!
//! Timestamps are always selected as `CAST(col AS TEXT)` so both engines
//! hand back a string; these helpers turn that string into a UTC instant.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::persistence::PersistenceError;

// Engine output (`CURRENT_TIMESTAMP` or `strftime`, cast to text) has no offset.
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

// Rows written by older clients may carry an explicit offset.
const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%#z"];

/// Decode a timestamp column. Values without an offset are taken as UTC.
pub fn decode_timestamp(raw: &str) -> Result<DateTime<Utc>, PersistenceError> {
    let raw = raw.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(ts.and_utc());
        }
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(ts) = DateTime::parse_from_str(raw, fmt) {
            return Ok(ts.with_timezone(&Utc));
        }
    }

    Err(PersistenceError::Timestamp(raw.to_string()))
}
