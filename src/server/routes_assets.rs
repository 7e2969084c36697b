//! Asset routes: upload, trim, merge.

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use clipvault_common::{AssetId, Error};
use clipvault_db::models::Asset;
use futures::StreamExt;
use serde::Deserialize;
use tokio::io::AsyncWriteExt;

use crate::lifecycle::{ReceivedUpload, UploadConstraints};
use crate::server::{error_response, parse_asset_id, AppContext};
use crate::staging;

type ApiError = (StatusCode, Json<serde_json::Value>);

pub fn asset_routes() -> Router<AppContext> {
    Router::new()
        .route("/assets", post(upload_asset))
        .route("/assets/:id/trim", post(trim_asset))
        .route("/assets/merge/:ids", post(merge_assets))
}

#[derive(Deserialize)]
struct UploadParams {
    filename: Option<String>,
    max_size_bytes: Option<i64>,
    min_duration_seconds: Option<f64>,
    max_duration_seconds: Option<f64>,
}

/// Receive a raw streamed body into the staging area and ingest it.
///
/// Constraints default to the configured limits when the request doesn't
/// carry its own. The transient file is cleaned up on every failure path;
/// once the lifecycle manager takes over, it owns cleanup.
async fn upload_asset(
    State(ctx): State<AppContext>,
    Query(params): Query<UploadParams>,
    body: Body,
) -> Result<(StatusCode, Json<Asset>), ApiError> {
    let limits = &ctx.config.limits;
    let constraints = UploadConstraints {
        max_size_bytes: params.max_size_bytes.unwrap_or(limits.max_size_bytes),
        min_duration_seconds: params
            .min_duration_seconds
            .unwrap_or(limits.min_duration_seconds),
        max_duration_seconds: params
            .max_duration_seconds
            .unwrap_or(limits.max_duration_seconds),
    };
    constraints.validate().map_err(error_response)?;

    let staging_handle = ctx.lifecycle.staging().clone();
    staging_handle.ensure_root().await.map_err(error_response)?;
    let transient = staging_handle.transient_path();

    let size_bytes = match write_body_to(&transient, body).await {
        Ok(size) => size,
        Err(err) => {
            staging::remove_orphan(&transient).await;
            return Err(error_response(err));
        }
    };

    let received = ReceivedUpload {
        staging_path: transient,
        original_name: params.filename.unwrap_or_else(|| "upload.bin".to_string()),
        size_bytes,
    };

    let asset = ctx
        .lifecycle
        .upload(received, &constraints)
        .await
        .map_err(error_response)?;

    Ok((StatusCode::CREATED, Json(asset)))
}

async fn write_body_to(path: &std::path::Path, body: Body) -> clipvault_common::Result<u64> {
    let mut file = tokio::fs::File::create(path).await?;
    let mut stream = body.into_data_stream();
    let mut received: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk =
            chunk.map_err(|e| Error::storage(format!("failed reading upload body: {e}")))?;
        received += chunk.len() as u64;
        file.write_all(&chunk).await?;
    }

    file.flush().await?;
    Ok(received)
}

#[derive(Deserialize)]
struct TrimRequest {
    start_seconds: f64,
    end_seconds: f64,
}

async fn trim_asset(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    Json(req): Json<TrimRequest>,
) -> Result<Json<Asset>, ApiError> {
    let asset_id = parse_asset_id(&id).map_err(error_response)?;

    let asset = ctx
        .lifecycle
        .trim(asset_id, req.start_seconds, req.end_seconds)
        .await
        .map_err(error_response)?;

    Ok(Json(asset))
}

async fn merge_assets(
    State(ctx): State<AppContext>,
    Path(ids): Path<String>,
) -> Result<(StatusCode, Json<Asset>), ApiError> {
    let asset_ids = parse_merge_ids(&ids).map_err(error_response)?;

    let asset = ctx
        .lifecycle
        .merge(&asset_ids)
        .await
        .map_err(error_response)?;

    Ok((StatusCode::CREATED, Json(asset)))
}

/// Parse the comma-separated id list of a merge request.
///
/// Order is preserved and duplicates are allowed; at least two ids are
/// required and every one must be a well-formed asset id.
fn parse_merge_ids(raw: &str) -> clipvault_common::Result<Vec<AssetId>> {
    let ids = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(parse_asset_id)
        .collect::<clipvault_common::Result<Vec<_>>>()?;

    if ids.len() < 2 {
        return Err(Error::validation(
            "at least two asset ids are required for merging",
        ));
    }

    Ok(ids)
}
