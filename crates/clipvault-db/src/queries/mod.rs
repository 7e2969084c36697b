//! Database query operations, one module per entity.
//!
//! Every statement binds its parameters; nothing is built by string
//! concatenation. Rows are decoded into the typed models here, failing
//! fast on malformed fields.

pub mod assets;
pub mod links;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use uuid::Uuid;

/// Decode an RFC 3339 timestamp column, failing the row on malformed input.
pub(crate) fn decode_datetime(idx: usize, value: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Decode a UUID column, failing the row on malformed input.
pub(crate) fn decode_uuid(idx: usize, value: String) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(&value)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
