//! Share link routes: issuance and validation.
//!
//! Streaming itself lives in `crate::streaming`; its route is registered
//! outside the auth layer because the share token is the credential there.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::server::{error_response, parse_asset_id, AppContext};
use crate::share::IssuedLink;

type ApiError = (StatusCode, Json<serde_json::Value>);

pub fn share_routes() -> Router<AppContext> {
    Router::new()
        .route("/assets/:id/share", post(issue_link))
        .route("/share/validate/:token", get(validate_link))
}

#[derive(Deserialize)]
struct ShareRequest {
    ttl_hours: f64,
}

async fn issue_link(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    Json(req): Json<ShareRequest>,
) -> Result<(StatusCode, Json<IssuedLink>), ApiError> {
    let asset_id = parse_asset_id(&id).map_err(error_response)?;

    let issued = ctx
        .links
        .issue(asset_id, req.ttl_hours)
        .map_err(error_response)?;

    Ok((StatusCode::CREATED, Json(issued)))
}

async fn validate_link(
    State(ctx): State<AppContext>,
    Path(token): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let (asset_id, asset) = ctx.links.validate(&token).map_err(error_response)?;

    Ok(Json(serde_json::json!({
        "valid": true,
        "asset_id": asset_id,
        "asset": asset,
    })))
}
