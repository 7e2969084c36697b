//! Asset database queries.
//!
//! Insertion, lookup, and the in-place trim update. Ids are assigned here
//! at insert time and are stable afterwards. The lifecycle manager is
//! responsible for only calling `create_*` after the backing file has been
//! verified; these functions persist exactly what they are given.

use chrono::Utc;
use rusqlite::Connection;
use clipvault_common::{AssetId, Error, Result};

use crate::models::Asset;
use crate::queries::{decode_datetime, decode_uuid};

const ASSET_COLUMNS: &str = "id, original_name, storage_path, original_storage_path, \
     size_bytes, duration_seconds, derived_from, created_at, updated_at";

fn row_to_asset(row: &rusqlite::Row<'_>) -> rusqlite::Result<Asset> {
    let derived_from = match row.get::<_, Option<String>>(6)? {
        Some(json) => Some(serde_json::from_str::<Vec<AssetId>>(&json).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e))
        })?),
        None => None,
    };

    Ok(Asset {
        id: AssetId::from(decode_uuid(0, row.get::<_, String>(0)?)?),
        original_name: row.get(1)?,
        storage_path: row.get(2)?,
        original_storage_path: row.get(3)?,
        size_bytes: row.get(4)?,
        duration_seconds: row.get(5)?,
        derived_from,
        created_at: decode_datetime(7, row.get::<_, String>(7)?)?,
        updated_at: decode_datetime(8, row.get::<_, String>(8)?)?,
    })
}

/// Insert a new asset record for a verified upload.
///
/// The id is assigned here. `storage_path` must already point at a
/// confirmed, correctly-sized file.
///
/// # Returns
///
/// * `Ok(Asset)` - The created record
/// * `Err(Error)` - If a database error occurs
pub fn create_asset(
    conn: &Connection,
    original_name: &str,
    storage_path: &str,
    size_bytes: i64,
    duration_seconds: f64,
) -> Result<Asset> {
    insert_asset(
        conn,
        original_name,
        storage_path,
        size_bytes,
        duration_seconds,
        None,
    )
}

/// Insert a new asset record produced by a merge.
///
/// `derived_from` is persisted order-preserving, exactly as given.
pub fn create_derived_asset(
    conn: &Connection,
    original_name: &str,
    storage_path: &str,
    size_bytes: i64,
    duration_seconds: f64,
    derived_from: &[AssetId],
) -> Result<Asset> {
    insert_asset(
        conn,
        original_name,
        storage_path,
        size_bytes,
        duration_seconds,
        Some(derived_from),
    )
}

fn insert_asset(
    conn: &Connection,
    original_name: &str,
    storage_path: &str,
    size_bytes: i64,
    duration_seconds: f64,
    derived_from: Option<&[AssetId]>,
) -> Result<Asset> {
    let id = AssetId::new();
    let now = Utc::now();
    let derived_json = match derived_from {
        Some(ids) => Some(
            serde_json::to_string(ids)
                .map_err(|e| Error::storage(format!("Failed to encode derived_from: {}", e)))?,
        ),
        None => None,
    };

    conn.execute(
        "INSERT INTO assets (id, original_name, storage_path, size_bytes, duration_seconds, derived_from, created_at, updated_at)
         VALUES (:id, :original_name, :storage_path, :size_bytes, :duration_seconds, :derived_from, :created_at, :updated_at)",
        rusqlite::named_params! {
            ":id": id.to_string(),
            ":original_name": original_name,
            ":storage_path": storage_path,
            ":size_bytes": size_bytes,
            ":duration_seconds": duration_seconds,
            ":derived_from": derived_json,
            ":created_at": now.to_rfc3339(),
            ":updated_at": now.to_rfc3339(),
        },
    )
    .map_err(|e| Error::storage(e.to_string()))?;

    Ok(Asset {
        id,
        original_name: original_name.to_string(),
        storage_path: storage_path.to_string(),
        original_storage_path: None,
        size_bytes,
        duration_seconds,
        derived_from: derived_from.map(<[AssetId]>::to_vec),
        created_at: now,
        updated_at: now,
    })
}

/// Get an asset by id.
///
/// # Returns
///
/// * `Ok(Some(Asset))` - The asset if found
/// * `Ok(None)` - If no asset has this id
/// * `Err(Error)` - If a database error occurs
pub fn get_asset(conn: &Connection, id: AssetId) -> Result<Option<Asset>> {
    let result = conn.query_row(
        &format!("SELECT {ASSET_COLUMNS} FROM assets WHERE id = :id"),
        rusqlite::named_params! { ":id": id.to_string() },
        row_to_asset,
    );

    match result {
        Ok(asset) => Ok(Some(asset)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::storage(e.to_string())),
    }
}

/// Apply a trim result to an existing asset, in place.
///
/// Overwrites `storage_path`, `size_bytes`, and `duration_seconds`,
/// refreshes `updated_at`, and sets `original_storage_path` to
/// `prior_storage_path` only if it was previously unset, so the first trim
/// in a chain records true provenance and later trims leave it alone.
///
/// # Returns
///
/// * `Ok(Some(Asset))` - The updated record
/// * `Ok(None)` - If no asset has this id
/// * `Err(Error)` - If a database error occurs
pub fn apply_trim(
    conn: &Connection,
    id: AssetId,
    new_storage_path: &str,
    size_bytes: i64,
    duration_seconds: f64,
    prior_storage_path: &str,
) -> Result<Option<Asset>> {
    let now = Utc::now();

    let rows_affected = conn
        .execute(
            "UPDATE assets
             SET storage_path = :storage_path,
                 size_bytes = :size_bytes,
                 duration_seconds = :duration_seconds,
                 updated_at = :updated_at,
                 original_storage_path = COALESCE(original_storage_path, :prior_storage_path)
             WHERE id = :id",
            rusqlite::named_params! {
                ":id": id.to_string(),
                ":storage_path": new_storage_path,
                ":size_bytes": size_bytes,
                ":duration_seconds": duration_seconds,
                ":updated_at": now.to_rfc3339(),
                ":prior_storage_path": prior_storage_path,
            },
        )
        .map_err(|e| Error::storage(e.to_string()))?;

    if rows_affected == 0 {
        return Ok(None);
    }

    get_asset(conn, id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::init_memory_pool;

    #[test]
    fn test_create_and_get_asset() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        let asset = create_asset(&conn, "clip.mp4", "/data/uploads/abc.mp4", 2048, 30.5).unwrap();
        assert_eq!(asset.original_name, "clip.mp4");
        assert_eq!(asset.size_bytes, 2048);
        assert!(asset.original_storage_path.is_none());
        assert!(asset.derived_from.is_none());

        let fetched = get_asset(&conn, asset.id).unwrap().unwrap();
        assert_eq!(fetched, asset);
    }

    #[test]
    fn test_get_asset_not_found() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        assert!(get_asset(&conn, AssetId::new()).unwrap().is_none());
    }

    #[test]
    fn test_apply_trim_sets_provenance_once() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        let asset = create_asset(&conn, "clip.mp4", "/data/a.mp4", 100, 50.0).unwrap();

        let first = apply_trim(&conn, asset.id, "/data/b.mp4", 40, 10.0, "/data/a.mp4")
            .unwrap()
            .unwrap();
        assert_eq!(first.storage_path, "/data/b.mp4");
        assert_eq!(first.duration_seconds, 10.0);
        assert_eq!(first.original_storage_path.as_deref(), Some("/data/a.mp4"));

        // A second trim keeps the provenance recorded by the first.
        let second = apply_trim(&conn, asset.id, "/data/c.mp4", 20, 5.0, "/data/b.mp4")
            .unwrap()
            .unwrap();
        assert_eq!(second.storage_path, "/data/c.mp4");
        assert_eq!(second.original_storage_path.as_deref(), Some("/data/a.mp4"));
    }

    #[test]
    fn test_apply_trim_missing_asset() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        let updated = apply_trim(&conn, AssetId::new(), "/data/x.mp4", 1, 1.0, "/data/y.mp4").unwrap();
        assert!(updated.is_none());
    }

    #[test]
    fn test_derived_from_preserves_order() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        let a = create_asset(&conn, "a.mp4", "/data/a.mp4", 1, 1.0).unwrap();
        let b = create_asset(&conn, "b.mp4", "/data/b.mp4", 1, 1.0).unwrap();

        // Deliberately not sorted, with a repeat: stored verbatim.
        let order = vec![b.id, a.id, b.id];
        let merged =
            create_derived_asset(&conn, "merged.mp4", "/data/m.mp4", 2, 2.0, &order).unwrap();

        let fetched = get_asset(&conn, merged.id).unwrap().unwrap();
        assert_eq!(fetched.derived_from.as_deref(), Some(order.as_slice()));
    }
}
