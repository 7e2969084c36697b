//! Direct streaming with HTTP range requests.
//!
//! Serves the bytes of the asset a share token resolves to, honoring a
//! single byte-range request. The file is stat-ed before any headers are
//! committed, and bodies are streamed (seek + take), never buffered whole.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::Response,
};
use clipvault_common::Error;
use std::io::SeekFrom;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

use crate::server::AppContext;

/// Serve a shared asset, gated by link validation.
///
/// An expired link maps to 410 so callers can tell it from a token that
/// never existed. A missing or unreadable backing file is a not-found
/// condition detected up front, before any bytes are written.
pub async fn stream_shared(
    State(ctx): State<AppContext>,
    Path(token): Path<String>,
    headers: HeaderMap,
) -> Result<Response, StatusCode> {
    let (_asset_id, asset) = ctx.links.validate(&token).map_err(|e| match e {
        Error::Expired(_) => StatusCode::GONE,
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    })?;

    let file_path = std::path::Path::new(&asset.storage_path);

    // Fail fast before headers are committed.
    let metadata = tokio::fs::metadata(file_path)
        .await
        .map_err(|_| StatusCode::NOT_FOUND)?;

    let file_size = metadata.len();
    let content_type = content_type_for(&asset.storage_path);

    let range = match headers.get(header::RANGE) {
        None => None,
        Some(value) => {
            let raw = value.to_str().map_err(|_| StatusCode::RANGE_NOT_SATISFIABLE)?;
            Some(parse_range_header(raw, file_size).ok_or(StatusCode::RANGE_NOT_SATISFIABLE)?)
        }
    };

    match range {
        Some((start, end)) => {
            // Partial content response
            let length = end - start + 1;

            let mut file = File::open(file_path)
                .await
                .map_err(|_| StatusCode::NOT_FOUND)?;

            file.seek(SeekFrom::Start(start))
                .await
                .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

            let stream = ReaderStream::new(file.take(length));
            let body = Body::from_stream(stream);

            Response::builder()
                .status(StatusCode::PARTIAL_CONTENT)
                .header(header::CONTENT_TYPE, content_type)
                .header(header::CONTENT_LENGTH, length.to_string())
                .header(
                    header::CONTENT_RANGE,
                    format!("bytes {}-{}/{}", start, end, file_size),
                )
                .header(header::ACCEPT_RANGES, "bytes")
                .body(body)
                .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
        }
        None => {
            // Full file response
            let file = File::open(file_path)
                .await
                .map_err(|_| StatusCode::NOT_FOUND)?;

            let stream = ReaderStream::new(file);
            let body = Body::from_stream(stream);

            Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, content_type)
                .header(header::CONTENT_LENGTH, file_size.to_string())
                .header(header::ACCEPT_RANGES, "bytes")
                .body(body)
                .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Parse an HTTP Range header into an inclusive byte range.
///
/// Supports single closed (`bytes=0-499`) and open-ended (`bytes=500-`)
/// ranges. An end past EOF is clamped. Multi-range requests, suffix ranges
/// (`bytes=-500`), and malformed or unsatisfiable ranges return `None`,
/// which the handler reports as 416.
fn parse_range_header(header: &str, file_size: u64) -> Option<(u64, u64)> {
    let header = header.strip_prefix("bytes=")?;

    if header.contains(',') {
        return None;
    }

    let (start, end) = header.split_once('-')?;
    let start = start.trim();
    let end = end.trim();

    if start.is_empty() {
        return None;
    }

    let start: u64 = start.parse().ok()?;
    if start >= file_size {
        return None;
    }

    let end: u64 = if end.is_empty() {
        file_size - 1
    } else {
        end.parse::<u64>().ok()?.min(file_size - 1)
    };

    if start > end {
        return None;
    }

    Some((start, end))
}

/// Determine content type from the storage path's extension.
fn content_type_for(storage_path: &str) -> &'static str {
    let ext = std::path::Path::new(storage_path)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "mp4" | "m4v" => "video/mp4",
        "mkv" => "video/x-matroska",
        "webm" => "video/webm",
        "avi" => "video/x-msvideo",
        "mov" => "video/quicktime",
        "ts" | "m2ts" => "video/mp2t",
        "m4a" => "audio/mp4",
        "mp3" => "audio/mpeg",
        "flac" => "audio/flac",
        "wav" => "audio/wav",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_range_header_closed() {
        assert_eq!(parse_range_header("bytes=0-99", 1000), Some((0, 99)));
        assert_eq!(parse_range_header("bytes=500-999", 1000), Some((500, 999)));
    }

    #[test]
    fn test_parse_range_header_open_end() {
        assert_eq!(parse_range_header("bytes=900-", 1000), Some((900, 999)));
    }

    #[test]
    fn test_parse_range_header_end_clamped() {
        assert_eq!(parse_range_header("bytes=0-2000", 1000), Some((0, 999)));
    }

    #[test]
    fn test_parse_range_header_start_past_eof() {
        assert_eq!(parse_range_header("bytes=1500-", 1000), None);
        assert_eq!(parse_range_header("bytes=1000-", 1000), None);
    }

    #[test]
    fn test_parse_range_header_suffix_rejected() {
        assert_eq!(parse_range_header("bytes=-200", 1000), None);
    }

    #[test]
    fn test_parse_range_header_multi_rejected() {
        assert_eq!(parse_range_header("bytes=0-99,200-299", 1000), None);
    }

    #[test]
    fn test_parse_range_header_malformed() {
        assert_eq!(parse_range_header("bytes=-", 1000), None);
        assert_eq!(parse_range_header("bytes=abc-def", 1000), None);
        assert_eq!(parse_range_header("chunks=0-99", 1000), None);
        assert_eq!(parse_range_header("bytes=99-0", 1000), None);
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("/data/a.mp4"), "video/mp4");
        assert_eq!(content_type_for("/data/a.MKV"), "video/x-matroska");
        assert_eq!(content_type_for("/data/a.mp3"), "audio/mpeg");
        assert_eq!(content_type_for("/data/noext"), "application/octet-stream");
    }
}
