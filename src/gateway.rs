//! Transcoding gateway seam.
//!
//! The lifecycle manager talks to an opaque [`TranscodeGateway`] capability
//! (probe / trim / concat). The shipped implementation shells out to
//! ffprobe/ffmpeg through `clipvault-av` on the blocking pool; tests swap in
//! a stub so no external tools are needed.

use async_trait::async_trait;
use clipvault_common::{Error, Result};
use std::path::Path;

/// External transcoding capability.
///
/// Implementations validate trim ranges against the source's actual
/// duration themselves; the lifecycle manager propagates that rejection
/// unchanged.
#[async_trait]
pub trait TranscodeGateway: Send + Sync {
    /// Duration of the media file at `path`, in seconds.
    async fn probe_duration(&self, path: &Path) -> Result<f64>;

    /// Produce `[start, end)` seconds of `input` as a new file at `output`.
    async fn trim(&self, input: &Path, output: &Path, start: f64, end: f64) -> Result<()>;

    /// Concatenate the files listed in `manifest` into `output` without
    /// re-encoding.
    async fn concat(&self, manifest: &Path, output: &Path) -> Result<()>;
}

/// Gateway backed by the ffmpeg/ffprobe CLIs.
#[derive(Debug, Default, Clone)]
pub struct FfmpegGateway;

impl FfmpegGateway {
    pub fn new() -> Self {
        Self
    }
}

/// A rejected trim range is a constraint violation; everything else the
/// tool layer reports is a gateway fault wrapping the tool's message.
fn map_av_error(err: clipvault_av::Error) -> Error {
    match err {
        clipvault_av::Error::InvalidInput(msg) => Error::validation(msg),
        other => Error::gateway(other.to_string()),
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> clipvault_av::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::gateway(format!("transcode task failed: {e}")))?
        .map_err(map_av_error)
}

#[async_trait]
impl TranscodeGateway for FfmpegGateway {
    async fn probe_duration(&self, path: &Path) -> Result<f64> {
        let path = path.to_path_buf();
        run_blocking(move || clipvault_av::probe_duration(&path)).await
    }

    async fn trim(&self, input: &Path, output: &Path, start: f64, end: f64) -> Result<()> {
        let input = input.to_path_buf();
        let output = output.to_path_buf();
        run_blocking(move || clipvault_av::trim(&input, &output, start, end)).await
    }

    async fn concat(&self, manifest: &Path, output: &Path) -> Result<()> {
        let manifest = manifest.to_path_buf();
        let output = output.to_path_buf();
        run_blocking(move || clipvault_av::concat(&manifest, &output)).await
    }
}
