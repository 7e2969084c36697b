//! Trim and concat operations via the ffmpeg CLI.

use crate::{probe, Error, Result};
use std::path::Path;
use std::process::Command;

/// Trim `[start, end)` seconds of `input` into a new file at `output`.
///
/// The range is validated against the source's probed duration before
/// ffmpeg is spawned: `start` must be non-negative, `end` greater than
/// `start`, and both within the source. The output is re-encoded so the
/// cut lands on exact timestamps rather than the nearest keyframe.
pub fn trim(input: &Path, output: &Path, start: f64, end: f64) -> Result<()> {
    let duration = probe::probe_duration(input)?;

    if start < 0.0 || end <= start || start > duration || end > duration {
        return Err(Error::invalid_input(format!(
            "trim range {start}-{end} is outside the source duration of {duration} seconds"
        )));
    }

    let status_output = Command::new("ffmpeg")
        .args(["-nostdin", "-y", "-ss"])
        .arg(format!("{start}"))
        .arg("-i")
        .arg(input)
        .arg("-t")
        .arg(format!("{}", end - start))
        .arg(output)
        .output()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::tool_not_found("ffmpeg")
            } else {
                Error::Io(e)
            }
        })?;

    if !status_output.status.success() {
        let stderr = String::from_utf8_lossy(&status_output.stderr);
        return Err(Error::tool_failed("ffmpeg", stderr.to_string()));
    }

    Ok(())
}

/// Concatenate the files listed in `manifest` into `output` without
/// re-encoding (`-c copy`).
///
/// The manifest must be in the format produced by [`crate::manifest::render`].
/// All inputs are assumed to share a compatible codec and container; when
/// they don't, ffmpeg fails and that failure is returned as-is.
pub fn concat(manifest: &Path, output: &Path) -> Result<()> {
    if !manifest.exists() {
        return Err(Error::file_not_found(manifest));
    }

    let status_output = Command::new("ffmpeg")
        .args(["-nostdin", "-y", "-f", "concat", "-safe", "0", "-i"])
        .arg(manifest)
        .args(["-c", "copy"])
        .arg(output)
        .output()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::tool_not_found("ffmpeg")
            } else {
                Error::Io(e)
            }
        })?;

    if !status_output.status.success() {
        let stderr = String::from_utf8_lossy(&status_output.stderr);
        return Err(Error::tool_failed("ffmpeg", stderr.to_string()));
    }

    Ok(())
}
