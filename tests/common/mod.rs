//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which creates a temp-dir database and staging
//! area, a stub transcoding gateway, and a full [`AppContext`]. The
//! [`TestHarness::with_server`] constructor starts Axum on a random port
//! for HTTP-level testing.
//!
//! The stub gateway derives durations from byte length at a fixed rate, so
//! every test runs without ffmpeg installed: a 10,000,000-byte file probes
//! as 50 seconds, a trim of `[10, 20)` writes 2,000,000 bytes, and concat
//! concatenates the manifest's files byte-for-byte.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use clipvault::config::Config;
use clipvault::gateway::TranscodeGateway;
use clipvault::lifecycle::{AssetLifecycle, ReceivedUpload, UploadConstraints};
use clipvault::server::{create_router, AppContext};
use clipvault::share::LinkManager;
use clipvault::staging::Staging;
use clipvault_common::{Error, Result};
use clipvault_db::pool::{get_conn, init_pool, DbPool, PooledConnection};

/// Bytes-per-second rate the stub gateway times files at.
pub const STUB_BYTES_PER_SECOND: f64 = 200_000.0;

/// Gateway stand-in that needs no external tools.
#[derive(Default)]
pub struct StubGateway {
    pub fail_probe: AtomicBool,
    pub fail_concat: AtomicBool,
}

#[async_trait]
impl TranscodeGateway for StubGateway {
    async fn probe_duration(&self, path: &Path) -> Result<f64> {
        if self.fail_probe.load(Ordering::Relaxed) {
            return Err(Error::gateway("probe failed (stub)"));
        }
        let len = tokio::fs::metadata(path)
            .await
            .map_err(|e| Error::gateway(format!("probe failed: {e}")))?
            .len();
        Ok(len as f64 / STUB_BYTES_PER_SECOND)
    }

    async fn trim(&self, input: &Path, output: &Path, start: f64, end: f64) -> Result<()> {
        // Mirrors the real gateway: the range is checked against the
        // source's actual duration before anything is written.
        let duration = self.probe_duration(input).await?;
        if start < 0.0 || end <= start || start > duration || end > duration {
            return Err(Error::validation(format!(
                "trim range {start}-{end} is outside the source duration of {duration} seconds"
            )));
        }

        let bytes = ((end - start) * STUB_BYTES_PER_SECOND) as usize;
        tokio::fs::write(output, vec![0u8; bytes])
            .await
            .map_err(|e| Error::gateway(e.to_string()))?;
        Ok(())
    }

    async fn concat(&self, manifest: &Path, output: &Path) -> Result<()> {
        if self.fail_concat.load(Ordering::Relaxed) {
            return Err(Error::gateway("concat failed (stub)"));
        }

        let text = tokio::fs::read_to_string(manifest)
            .await
            .map_err(|e| Error::gateway(format!("manifest unreadable: {e}")))?;

        let mut merged = Vec::new();
        for line in text.lines() {
            let path = parse_manifest_line(line)?;
            let bytes = tokio::fs::read(&path)
                .await
                .map_err(|e| Error::gateway(format!("input unreadable: {e}")))?;
            merged.extend_from_slice(&bytes);
        }

        tokio::fs::write(output, merged)
            .await
            .map_err(|e| Error::gateway(e.to_string()))?;
        Ok(())
    }
}

fn parse_manifest_line(line: &str) -> Result<PathBuf> {
    let quoted = line
        .strip_prefix("file ")
        .and_then(|rest| rest.strip_prefix('\''))
        .and_then(|rest| rest.strip_suffix('\''))
        .ok_or_else(|| Error::gateway(format!("malformed manifest line: {line}")))?;
    Ok(PathBuf::from(quoted.replace("'\\''", "'")))
}

/// Test harness wrapping a fully-constructed [`AppContext`] backed by a
/// temp-dir database and staging area.
pub struct TestHarness {
    pub ctx: AppContext,
    pub db: DbPool,
    pub stub: Arc<StubGateway>,
    dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new harness with default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create a new harness with a custom configuration. The storage dir is
    /// always redirected into the harness's temp dir.
    pub fn with_config(mut config: Config) -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        config.storage.data_dir = dir.path().to_path_buf();

        let db = init_pool(&config.storage.db_path().to_string_lossy())
            .expect("failed to create pool");

        std::fs::create_dir_all(config.storage.uploads_dir()).expect("failed to create uploads dir");
        let staging = Staging::new(config.storage.uploads_dir());

        let stub = Arc::new(StubGateway::default());
        let gateway: Arc<dyn TranscodeGateway> = stub.clone();
        let lifecycle = Arc::new(AssetLifecycle::new(db.clone(), staging, gateway));
        let links = Arc::new(LinkManager::new(
            db.clone(),
            config.server.resolved_base_url(),
        ));

        let ctx = AppContext {
            config: Arc::new(config),
            db_pool: db.clone(),
            lifecycle,
            links,
        };

        Self { ctx, db, stub, dir }
    }

    /// Start an Axum server on a random port and return the harness
    /// together with the bound socket address.
    pub async fn with_server() -> (Self, SocketAddr) {
        Self::serve(Self::new()).await
    }

    /// Start an Axum server with custom config on a random port.
    pub async fn with_server_config(config: Config) -> (Self, SocketAddr) {
        Self::serve(Self::with_config(config)).await
    }

    async fn serve(harness: Self) -> (Self, SocketAddr) {
        let app = create_router(harness.ctx.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (harness, addr)
    }

    /// Get a database connection from the pool.
    pub fn conn(&self) -> PooledConnection {
        get_conn(&self.db).expect("failed to get db connection")
    }

    /// Write `bytes` zeros to a transient staging path, as the HTTP layer
    /// would after receiving a body, and describe it as a received upload.
    pub async fn stage_upload(&self, name: &str, bytes: usize) -> ReceivedUpload {
        let path = self.ctx.lifecycle.staging().transient_path();
        tokio::fs::write(&path, vec![0u8; bytes]).await.unwrap();
        ReceivedUpload {
            staging_path: path,
            original_name: name.to_string(),
            size_bytes: bytes as u64,
        }
    }

    /// Constraints matching the end-to-end scenario: 20 MB, 5 to 120 seconds.
    pub fn default_constraints() -> UploadConstraints {
        UploadConstraints {
            max_size_bytes: 20_000_000,
            min_duration_seconds: 5.0,
            max_duration_seconds: 120.0,
        }
    }

    /// Every file currently in the staging area, sorted for stable asserts.
    pub fn staged_files(&self) -> Vec<PathBuf> {
        let uploads = self.ctx.config.storage.uploads_dir();
        let mut files: Vec<PathBuf> = match std::fs::read_dir(uploads) {
            Ok(entries) => entries.filter_map(|e| e.ok()).map(|e| e.path()).collect(),
            Err(_) => Vec::new(),
        };
        files.sort();
        files
    }

    /// Count of asset rows, straight from the store.
    pub fn asset_count(&self) -> i64 {
        self.conn()
            .query_row("SELECT COUNT(*) FROM assets", [], |row| row.get(0))
            .unwrap()
    }
}
