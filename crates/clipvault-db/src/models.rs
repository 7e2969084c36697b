//! Internal Rust models matching the database schema.
//!
//! Strongly-typed structures decoded at the query boundary. Rows that fail
//! to decode (missing or malformed fields) surface as errors there rather
//! than leaking untyped values upward.

use chrono::{DateTime, Utc};
use clipvault_common::{AssetId, LinkId};
use serde::{Deserialize, Serialize};

/// A stored media file plus its metadata record.
///
/// `storage_path` is the authoritative on-disk location. `size_bytes` and
/// `duration_seconds` describe the file at `storage_path` at the moment it
/// became authoritative.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Asset {
    pub id: AssetId,
    pub original_name: String,
    pub storage_path: String,
    /// Set once by the first trim, preserving the pre-trim path. Never
    /// overwritten by later trims.
    pub original_storage_path: Option<String>,
    pub size_bytes: i64,
    pub duration_seconds: f64,
    /// Source asset ids for merge results, in exact input order.
    pub derived_from: Option<Vec<AssetId>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A bearer token granting time-limited access to stream one asset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShareableLink {
    pub id: LinkId,
    pub asset_id: AssetId,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl ShareableLink {
    /// A link is valid iff `now` is strictly before its expiry.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
