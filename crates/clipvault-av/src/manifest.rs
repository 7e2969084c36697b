//! Concat manifest serialization.
//!
//! ffmpeg's concat demuxer reads an ordered list of `file '<path>'` lines.
//! Paths are single-quoted; a quote inside a path is escaped by closing the
//! quote, inserting an escaped quote, and reopening: `'` becomes `'\''`.

use std::path::Path;

/// Quote one path for a manifest line.
pub fn quote_path(path: &Path) -> String {
    let raw = path.to_string_lossy();
    format!("'{}'", raw.replace('\'', "'\\''"))
}

/// Render the full manifest: one `file '<path>'` line per input, in order.
pub fn render<P: AsRef<Path>>(paths: &[P]) -> String {
    let mut out = String::new();
    for path in paths {
        out.push_str("file ");
        out.push_str(&quote_path(path.as_ref()));
        out.push('\n');
    }
    out
}
