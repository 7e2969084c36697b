//! Asset lifecycle orchestration.
//!
//! Owns the consistency contract between filesystem artifacts and metadata
//! records across upload, trim, and merge. The discipline is
//! verify-then-persist: a record is only written after its backing file is
//! confirmed present, correctly sized, and within duration bounds, and a
//! file that fails any step is deleted before the error propagates. Cleanup
//! failures are logged, never raised over the original cause.
//!
//! Writers to the same asset id are serialized by a keyed lock; the store
//! itself only guarantees single-statement atomicity.

use clipvault_common::{AssetId, Error, Result};
use clipvault_db::models::Asset;
use clipvault_db::pool::{get_conn, DbPool};
use clipvault_db::queries::assets;
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::gateway::TranscodeGateway;
use crate::staging::{self, Staging};

/// A file received by the HTTP layer, still at its transient staging path.
#[derive(Debug)]
pub struct ReceivedUpload {
    pub staging_path: PathBuf,
    pub original_name: String,
    /// Bytes observed while receiving; cross-checked against the stored
    /// file to catch truncated writes.
    pub size_bytes: u64,
}

/// Constraints an upload must satisfy before a record is created.
#[derive(Debug, Clone, Copy)]
pub struct UploadConstraints {
    pub max_size_bytes: i64,
    pub min_duration_seconds: f64,
    pub max_duration_seconds: f64,
}

impl UploadConstraints {
    /// Reject nonsensical constraint sets before any side effect.
    pub fn validate(&self) -> Result<()> {
        if self.max_size_bytes <= 0 {
            return Err(Error::validation("max_size_bytes must be positive"));
        }
        if !self.min_duration_seconds.is_finite() || !self.max_duration_seconds.is_finite() {
            return Err(Error::validation("duration bounds must be finite numbers"));
        }
        if self.min_duration_seconds < 0.0 {
            return Err(Error::validation("min_duration_seconds must be non-negative"));
        }
        if self.min_duration_seconds >= self.max_duration_seconds {
            return Err(Error::validation(
                "min_duration_seconds must be less than max_duration_seconds",
            ));
        }
        Ok(())
    }
}

/// Orchestrates upload, trim, and merge against the store, staging area,
/// and transcoding gateway.
pub struct AssetLifecycle {
    pool: DbPool,
    staging: Staging,
    gateway: Arc<dyn TranscodeGateway>,
    write_locks: DashMap<AssetId, Arc<Mutex<()>>>,
}

impl AssetLifecycle {
    pub fn new(pool: DbPool, staging: Staging, gateway: Arc<dyn TranscodeGateway>) -> Self {
        Self {
            pool,
            staging,
            gateway,
            write_locks: DashMap::new(),
        }
    }

    pub fn staging(&self) -> &Staging {
        &self.staging
    }

    /// Ingest a received file as a new asset.
    ///
    /// The file is relocated to a permanent uniquely-named location first,
    /// then verified in order: readable and fully written, within the size
    /// limit, within the duration bounds. Only after every check passes is
    /// the record created. Any failure deletes the relocated file; no
    /// orphan survives a failed upload.
    pub async fn upload(
        &self,
        received: ReceivedUpload,
        constraints: &UploadConstraints,
    ) -> Result<Asset> {
        if let Err(err) = constraints.validate() {
            staging::remove_orphan(&received.staging_path).await;
            return Err(err);
        }

        let stored = self.staging.unique_path_like(&received.original_name);
        if let Err(err) = self.staging.promote(&received.staging_path, &stored).await {
            staging::remove_orphan(&received.staging_path).await;
            return Err(err);
        }

        match self.verify_and_record(&received, &stored, constraints).await {
            Ok(asset) => Ok(asset),
            Err(err) => {
                staging::remove_orphan(&stored).await;
                Err(err)
            }
        }
    }

    async fn verify_and_record(
        &self,
        received: &ReceivedUpload,
        stored: &Path,
        constraints: &UploadConstraints,
    ) -> Result<Asset> {
        let metadata = tokio::fs::metadata(stored).await?;

        if metadata.len() != received.size_bytes {
            return Err(Error::storage(format!(
                "stored file is {} bytes but {} bytes were received",
                metadata.len(),
                received.size_bytes
            )));
        }

        if metadata.len() as i64 > constraints.max_size_bytes {
            return Err(Error::validation(format!(
                "file size {} exceeds the limit of {} bytes",
                metadata.len(),
                constraints.max_size_bytes
            )));
        }

        let duration = self.gateway.probe_duration(stored).await?;
        if duration < constraints.min_duration_seconds
            || duration > constraints.max_duration_seconds
        {
            return Err(Error::validation(format!(
                "duration {} is outside the allowed range of {} to {} seconds",
                duration, constraints.min_duration_seconds, constraints.max_duration_seconds
            )));
        }

        let conn = get_conn(&self.pool)?;
        assets::create_asset(
            &conn,
            &received.original_name,
            &path_str(stored),
            metadata.len() as i64,
            duration,
        )
    }

    /// Replace an asset's file with a sub-range of itself.
    ///
    /// All-or-nothing from the caller's perspective: on any failure after
    /// the new file is produced, the file is deleted and the record is left
    /// untouched. The first trim records the pre-trim path as provenance;
    /// later trims do not overwrite it.
    pub async fn trim(&self, asset_id: AssetId, start_seconds: f64, end_seconds: f64) -> Result<Asset> {
        if !start_seconds.is_finite()
            || !end_seconds.is_finite()
            || start_seconds < 0.0
            || end_seconds <= start_seconds
        {
            return Err(Error::validation(format!(
                "invalid trim range {start_seconds}-{end_seconds}: requires 0 <= start < end"
            )));
        }

        let lock = self.write_lock(asset_id);
        let _guard = lock.lock().await;

        let source = self.get_asset_required(asset_id)?;
        let output = self.staging.unique_path_like(&source.storage_path);

        match self
            .trim_inner(&source, &output, start_seconds, end_seconds)
            .await
        {
            Ok(asset) => Ok(asset),
            Err(err) => {
                staging::remove_orphan(&output).await;
                Err(err)
            }
        }
    }

    async fn trim_inner(&self, source: &Asset, output: &Path, start: f64, end: f64) -> Result<Asset> {
        // The gateway bounds-checks the range against the real duration;
        // its rejection passes through unchanged.
        self.gateway
            .trim(Path::new(&source.storage_path), output, start, end)
            .await?;

        let duration = self.gateway.probe_duration(output).await?;
        let metadata = tokio::fs::metadata(output).await?;

        let conn = get_conn(&self.pool)?;
        assets::apply_trim(
            &conn,
            source.id,
            &path_str(output),
            metadata.len() as i64,
            duration,
            &source.storage_path,
        )?
        .ok_or_else(|| Error::not_found(format!("asset {} vanished during trim", source.id)))
    }

    /// Concatenate two or more assets into a brand-new asset.
    ///
    /// Sources are resolved in order and recorded in `derived_from` exactly
    /// as given. The concat manifest is temporary and deleted on every exit
    /// path; a failed merge also deletes the output file. Inputs are
    /// assumed codec-compatible; the gateway's failure says otherwise and
    /// is surfaced unchanged.
    pub async fn merge(&self, asset_ids: &[AssetId]) -> Result<Asset> {
        if asset_ids.len() < 2 {
            return Err(Error::validation(
                "at least two asset ids are required for merging",
            ));
        }

        // Inputs locked in sorted, deduplicated order so concurrent merges
        // cannot deadlock, and a racing trim cannot swap a source file
        // mid-concat.
        let _guards = self.lock_many(asset_ids).await;

        let sources = {
            let conn = get_conn(&self.pool)?;
            let mut sources = Vec::with_capacity(asset_ids.len());
            for id in asset_ids {
                let asset = assets::get_asset(&conn, *id)?
                    .ok_or_else(|| Error::not_found(format!("asset {id} not found")))?;
                sources.push(asset);
            }
            sources
        };

        // Manifest entries must be absolute; concat runs with an arbitrary
        // working directory.
        let mut input_paths = Vec::with_capacity(sources.len());
        for source in &sources {
            input_paths.push(tokio::fs::canonicalize(&source.storage_path).await?);
        }

        let manifest_path = self.staging.unique_path_with_ext("txt");
        let output = self.staging.unique_path_like(&sources[0].storage_path);

        let result = self
            .concat_and_record(&manifest_path, &input_paths, &output, asset_ids)
            .await;

        staging::remove_orphan(&manifest_path).await;

        match result {
            Ok(asset) => Ok(asset),
            Err(err) => {
                staging::remove_orphan(&output).await;
                Err(err)
            }
        }
    }

    async fn concat_and_record(
        &self,
        manifest_path: &Path,
        input_paths: &[PathBuf],
        output: &Path,
        asset_ids: &[AssetId],
    ) -> Result<Asset> {
        tokio::fs::write(manifest_path, clipvault_av::manifest::render(input_paths)).await?;

        self.gateway.concat(manifest_path, output).await?;

        let duration = self.gateway.probe_duration(output).await?;
        let metadata = tokio::fs::metadata(output).await?;

        let original_name = output
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "merged".to_string());

        let conn = get_conn(&self.pool)?;
        assets::create_derived_asset(
            &conn,
            &original_name,
            &path_str(output),
            metadata.len() as i64,
            duration,
            asset_ids,
        )
    }

    /// Resolve an asset or fail with NotFound.
    pub fn get_asset_required(&self, id: AssetId) -> Result<Asset> {
        let conn = get_conn(&self.pool)?;
        assets::get_asset(&conn, id)?
            .ok_or_else(|| Error::not_found(format!("asset {id} not found")))
    }

    fn write_lock(&self, id: AssetId) -> Arc<Mutex<()>> {
        self.write_locks.entry(id).or_default().clone()
    }

    async fn lock_many(&self, ids: &[AssetId]) -> Vec<OwnedMutexGuard<()>> {
        let mut ordered: Vec<AssetId> = ids.to_vec();
        ordered.sort();
        ordered.dedup();

        let mut guards = Vec::with_capacity(ordered.len());
        for id in ordered {
            guards.push(self.write_lock(id).lock_owned().await);
        }
        guards
    }
}

fn path_str(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
