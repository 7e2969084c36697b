//! Shareable link database queries.
//!
//! Links are written once, read by token, and deleted exactly once when
//! observed expired. The token column carries a UNIQUE constraint; a
//! collision on insert is reported as a generation failure, never an
//! overwrite.

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use clipvault_common::{AssetId, Error, LinkId, Result};

use crate::models::ShareableLink;
use crate::queries::{decode_datetime, decode_uuid};

fn row_to_link(row: &rusqlite::Row<'_>) -> rusqlite::Result<ShareableLink> {
    Ok(ShareableLink {
        id: LinkId::from(decode_uuid(0, row.get::<_, String>(0)?)?),
        asset_id: AssetId::from(decode_uuid(1, row.get::<_, String>(1)?)?),
        token: row.get(2)?,
        expires_at: decode_datetime(3, row.get::<_, String>(3)?)?,
        created_at: decode_datetime(4, row.get::<_, String>(4)?)?,
    })
}

fn is_token_collision(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, Some(msg))
            if e.code == rusqlite::ErrorCode::ConstraintViolation
                && msg.contains("shareable_links.token")
    )
}

/// Create a new shareable link.
///
/// The caller supplies the token and expiry; the id is assigned here.
///
/// # Returns
///
/// * `Ok(ShareableLink)` - The created link
/// * `Err(Error::Storage)` - On token collision (generation failure) or any
///   other database error
pub fn create_link(
    conn: &Connection,
    asset_id: AssetId,
    token: &str,
    expires_at: DateTime<Utc>,
) -> Result<ShareableLink> {
    let id = LinkId::new();
    let now = Utc::now();

    conn.execute(
        "INSERT INTO shareable_links (id, asset_id, token, expires_at, created_at)
         VALUES (:id, :asset_id, :token, :expires_at, :created_at)",
        rusqlite::named_params! {
            ":id": id.to_string(),
            ":asset_id": asset_id.to_string(),
            ":token": token,
            ":expires_at": expires_at.to_rfc3339(),
            ":created_at": now.to_rfc3339(),
        },
    )
    .map_err(|e| {
        if is_token_collision(&e) {
            Error::storage("share token generation collided with an existing token")
        } else {
            Error::storage(e.to_string())
        }
    })?;

    Ok(ShareableLink {
        id,
        asset_id,
        token: token.to_string(),
        expires_at,
        created_at: now,
    })
}

/// Look up a link by its token.
///
/// # Returns
///
/// * `Ok(Some(ShareableLink))` - The link if the token is known
/// * `Ok(None)` - If the token does not exist
/// * `Err(Error)` - If a database error occurs
pub fn get_link_by_token(conn: &Connection, token: &str) -> Result<Option<ShareableLink>> {
    let result = conn.query_row(
        "SELECT id, asset_id, token, expires_at, created_at
         FROM shareable_links
         WHERE token = :token",
        rusqlite::named_params! { ":token": token },
        row_to_link,
    );

    match result {
        Ok(link) => Ok(Some(link)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::storage(e.to_string())),
    }
}

/// Delete a link by its token.
///
/// # Returns
///
/// * `Ok(true)` - If the link was deleted
/// * `Ok(false)` - If no link had this token
/// * `Err(Error)` - If a database error occurs
pub fn delete_link_by_token(conn: &Connection, token: &str) -> Result<bool> {
    let rows_affected = conn
        .execute(
            "DELETE FROM shareable_links WHERE token = :token",
            rusqlite::named_params! { ":token": token },
        )
        .map_err(|e| Error::storage(e.to_string()))?;

    Ok(rows_affected > 0)
}
