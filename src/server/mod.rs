//! HTTP surface: router, shared context, error-to-status mapping.
//!
//! This layer is thin plumbing over the lifecycle and link managers.
//! Validation failures map to 400, missing records to 404, expired links
//! to 410 (distinct, so clients can tell "link gone" from "link was real
//! but timed out"), and storage/gateway faults to 500 with full context
//! logged.

pub mod auth;
pub mod routes_assets;
pub mod routes_share;

use crate::config::Config;
use crate::lifecycle::AssetLifecycle;
use crate::share::LinkManager;
use crate::streaming;
use anyhow::Result;
use axum::{
    http::{header, Method, StatusCode},
    middleware,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use clipvault_common::{AssetId, Error};
use clipvault_db::pool::DbPool;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Shared application context
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub db_pool: DbPool,
    pub lifecycle: Arc<AssetLifecycle>,
    pub links: Arc<LinkManager>,
}

/// Create the Axum router with all routes
pub fn create_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::RANGE]);

    // API routes behind optional bearer-token auth.
    let mut protected = routes_assets::asset_routes().merge(routes_share::share_routes());
    if ctx.config.server.auth.enabled {
        protected = protected.layer(middleware::from_fn_with_state(
            ctx.clone(),
            auth::require_bearer_token,
        ));
    }

    // The share token itself is the credential for streaming.
    let public = Router::new().route("/share/:token", get(streaming::stream_shared));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", protected.merge(public))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Map a core error onto the response the API contract promises.
pub(crate) fn error_response(err: Error) -> (StatusCode, Json<serde_json::Value>) {
    let status = match &err {
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::Expired(_) => StatusCode::GONE,
        Error::Validation(_) => StatusCode::BAD_REQUEST,
        Error::Storage(_) | Error::Gateway(_) | Error::Io(_) => {
            tracing::error!("internal failure: {err}");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    (status, Json(serde_json::json!({ "error": err.to_string() })))
}

/// Parse an asset id from a URL path segment.
pub(crate) fn parse_asset_id(raw: &str) -> clipvault_common::Result<AssetId> {
    raw.parse::<AssetId>()
        .map_err(|_| Error::validation(format!("malformed asset id: {raw}")))
}

/// Bind and serve until shutdown.
pub async fn start_server(ctx: AppContext) -> Result<()> {
    let addr: SocketAddr =
        format!("{}:{}", ctx.config.server.host, ctx.config.server.port).parse()?;
    let app = create_router(ctx);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("Shutdown signal received");
}
