//! Shareable link issuance and validation.
//!
//! A link is a bearer token granting time-limited streaming access to one
//! asset. Expiry is enforced lazily: the first validation attempt after
//! `expires_at` deletes the link and reports it expired; every attempt
//! after that sees an unknown token. There is no background sweep.

use chrono::{Duration, Utc};
use clipvault_common::{AssetId, Error, Result};
use clipvault_db::models::{Asset, ShareableLink};
use clipvault_db::pool::{get_conn, DbPool};
use clipvault_db::queries::{assets, links};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::Serialize;

/// A freshly issued link together with its fully-formed access URL.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedLink {
    #[serde(flatten)]
    pub link: ShareableLink,
    pub url: String,
}

/// Issues and validates expiring share tokens bound to an asset.
pub struct LinkManager {
    pool: DbPool,
    public_base_url: String,
}

impl LinkManager {
    pub fn new(pool: DbPool, public_base_url: impl Into<String>) -> Self {
        Self {
            pool,
            public_base_url: public_base_url.into(),
        }
    }

    /// The streaming URL for a token.
    pub fn share_url(&self, token: &str) -> String {
        format!("{}/api/share/{}", self.public_base_url, token)
    }

    /// Issue a new link for `asset_id`, valid for `ttl_hours` from now.
    ///
    /// `ttl_hours` must be a finite positive number; it is rejected before
    /// any side effect. Token generation uses 128 bits of OS randomness; a
    /// collision with an existing token is a generation failure, not an
    /// overwrite.
    pub fn issue(&self, asset_id: AssetId, ttl_hours: f64) -> Result<IssuedLink> {
        if !ttl_hours.is_finite() || ttl_hours <= 0.0 {
            return Err(Error::validation(format!(
                "ttl_hours must be a positive number, got {ttl_hours}"
            )));
        }

        let conn = get_conn(&self.pool)?;
        assets::get_asset(&conn, asset_id)?
            .ok_or_else(|| Error::not_found(format!("asset {asset_id} not found")))?;

        let token = generate_token();
        let expires_at = Utc::now() + Duration::milliseconds((ttl_hours * 3_600_000.0) as i64);

        let link = links::create_link(&conn, asset_id, &token, expires_at)?;
        let url = self.share_url(&link.token);

        Ok(IssuedLink { link, url })
    }

    /// Validate a token and resolve the asset it grants access to.
    ///
    /// State machine per token: unknown -> NotFound; known and unexpired ->
    /// the asset; known and expired -> the record is deleted, then Expired.
    /// Re-validating an expired token therefore yields NotFound. A valid
    /// link whose asset has vanished is a consistency fault reported as
    /// NotFound on the asset, distinct from an unknown link.
    pub fn validate(&self, token: &str) -> Result<(AssetId, Asset)> {
        let conn = get_conn(&self.pool)?;

        let link = links::get_link_by_token(&conn, token)?
            .ok_or_else(|| Error::not_found("share link not found"))?;

        if link.is_expired(Utc::now()) {
            links::delete_link_by_token(&conn, token)?;
            return Err(Error::expired("share link has expired"));
        }

        let asset = assets::get_asset(&conn, link.asset_id)?.ok_or_else(|| {
            Error::not_found(format!(
                "asset {} referenced by share link no longer exists",
                link.asset_id
            ))
        })?;

        Ok((link.asset_id, asset))
    }
}

fn generate_token() -> String {
    // 128 bits, hex-encoded: 32 characters
    let mut bytes = [0u8; 16];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
