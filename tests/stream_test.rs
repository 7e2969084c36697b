//! Integration tests for shared streaming: range semantics, link gating,
//! and the up-front stat contract.

mod common;

use chrono::{Duration, Utc};
use clipvault_db::queries::{assets, links};
use common::TestHarness;

/// Insert an asset whose backing file holds a recognizable byte pattern.
fn seed_streamable(h: &TestHarness, name: &str, size: usize) -> (clipvault_db::models::Asset, Vec<u8>) {
    let data: Vec<u8> = (0..=255u8).cycle().take(size).collect();
    let path = h.ctx.config.storage.uploads_dir().join(name);
    std::fs::write(&path, &data).unwrap();

    let conn = h.conn();
    let asset = assets::create_asset(
        &conn,
        name,
        &path.to_string_lossy(),
        size as i64,
        size as f64 / common::STUB_BYTES_PER_SECOND,
    )
    .unwrap();

    (asset, data)
}

fn share(h: &TestHarness, asset_id: clipvault_common::AssetId, token: &str, hours: i64) {
    let conn = h.conn();
    links::create_link(&conn, asset_id, token, Utc::now() + Duration::hours(hours)).unwrap();
}

#[tokio::test]
async fn full_request_streams_whole_file() {
    let (h, addr) = TestHarness::with_server().await;
    let (asset, data) = seed_streamable(&h, "full.mp4", 1000);
    share(&h, asset.id, "fulltoken", 1);

    let resp = reqwest::get(format!("http://{addr}/api/share/fulltoken"))
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers().get("content-type").unwrap().to_str().unwrap(),
        "video/mp4"
    );
    assert_eq!(
        resp.headers().get("content-length").unwrap().to_str().unwrap(),
        "1000"
    );
    assert_eq!(
        resp.headers().get("accept-ranges").unwrap().to_str().unwrap(),
        "bytes"
    );

    let body = resp.bytes().await.unwrap();
    assert_eq!(body.as_ref(), data.as_slice());
}

#[tokio::test]
async fn closed_range_returns_exact_slice() {
    let (h, addr) = TestHarness::with_server().await;
    let (asset, data) = seed_streamable(&h, "range.mp4", 1000);
    share(&h, asset.id, "rangetoken", 1);

    let client = reqwest::Client::new();
    let resp = client
        .get(format!("http://{addr}/api/share/rangetoken"))
        .header("Range", "bytes=0-99")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 206);
    assert_eq!(
        resp.headers().get("content-range").unwrap().to_str().unwrap(),
        "bytes 0-99/1000"
    );
    assert_eq!(
        resp.headers().get("content-length").unwrap().to_str().unwrap(),
        "100"
    );

    let body = resp.bytes().await.unwrap();
    assert_eq!(body.len(), 100);
    assert_eq!(body.as_ref(), &data[0..100]);
}

#[tokio::test]
async fn open_ended_range_returns_tail() {
    let (h, addr) = TestHarness::with_server().await;
    let (asset, data) = seed_streamable(&h, "tail.mp4", 1000);
    share(&h, asset.id, "tailtoken", 1);

    let client = reqwest::Client::new();
    let resp = client
        .get(format!("http://{addr}/api/share/tailtoken"))
        .header("Range", "bytes=900-")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 206);
    assert_eq!(
        resp.headers().get("content-range").unwrap().to_str().unwrap(),
        "bytes 900-999/1000"
    );

    let body = resp.bytes().await.unwrap();
    assert_eq!(body.len(), 100);
    assert_eq!(body.as_ref(), &data[900..]);
}

#[tokio::test]
async fn unsatisfiable_ranges_get_416() {
    let (h, addr) = TestHarness::with_server().await;
    let (asset, _) = seed_streamable(&h, "bad.mp4", 1000);
    share(&h, asset.id, "badtoken", 1);

    let client = reqwest::Client::new();
    for range in ["bytes=-100", "bytes=0-49,60-99", "bytes=2000-", "bytes=x-y"] {
        let resp = client
            .get(format!("http://{addr}/api/share/badtoken"))
            .header("Range", range)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 416, "range {range:?} not rejected");
    }
}

#[tokio::test]
async fn unknown_token_is_404() {
    let (_h, addr) = TestHarness::with_server().await;

    let resp = reqwest::get(format!("http://{addr}/api/share/neverissued"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn expired_token_is_410_then_404() {
    let (h, addr) = TestHarness::with_server().await;
    let (asset, _) = seed_streamable(&h, "old.mp4", 1000);

    {
        let conn = h.conn();
        links::create_link(&conn, asset.id, "oldtoken", Utc::now() - Duration::hours(1)).unwrap();
    }

    let resp = reqwest::get(format!("http://{addr}/api/share/oldtoken"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 410);

    // The expired link was deleted by the first attempt.
    let resp = reqwest::get(format!("http://{addr}/api/share/oldtoken"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn missing_backing_file_fails_before_streaming() {
    let (h, addr) = TestHarness::with_server().await;
    let (asset, _) = seed_streamable(&h, "gone.mp4", 1000);
    share(&h, asset.id, "gonetoken", 1);

    std::fs::remove_file(h.ctx.config.storage.uploads_dir().join("gone.mp4")).unwrap();

    let resp = reqwest::get(format!("http://{addr}/api/share/gonetoken"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}
