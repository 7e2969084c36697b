//! FFprobe-based duration probing.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use std::process::Command;

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    // ffprobe emits numeric fields as JSON strings
    duration: Option<String>,
}

/// Probe a media file and return its duration in seconds.
///
/// Runs `ffprobe -print_format json -show_format` and reads
/// `format.duration`. A file ffprobe cannot time (no format duration)
/// is a parse failure, not zero.
pub fn probe_duration(path: &Path) -> Result<f64> {
    if !path.exists() {
        return Err(Error::file_not_found(path));
    }

    let output = Command::new("ffprobe")
        .args(["-v", "quiet", "-print_format", "json", "-show_format"])
        .arg(path)
        .output()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::tool_not_found("ffprobe")
            } else {
                Error::Io(e)
            }
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::tool_failed("ffprobe", stderr.to_string()));
    }

    let parsed: FfprobeOutput = serde_json::from_slice(&output.stdout)?;

    let duration = parsed
        .format
        .duration
        .ok_or_else(|| Error::parse_error("ffprobe", "no format duration reported"))?;

    duration
        .parse::<f64>()
        .map_err(|e| Error::parse_error("ffprobe", format!("bad duration {duration:?}: {e}")))
}
