//! Static bearer-token authentication middleware.
//!
//! Guards the API routes when enabled. The accepted tokens come from the
//! config; there are no sessions or password hashes behind this surface.
//! The public streaming route is not behind this middleware: for it, the
//! share token is the credential.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};

use super::AppContext;

/// Require a configured bearer token on the request.
pub async fn require_bearer_token(
    State(ctx): State<AppContext>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    match token {
        Some(token) if ctx.config.server.auth.tokens.iter().any(|t| t == token) => {
            Ok(next.run(request).await)
        }
        _ => Err(StatusCode::FORBIDDEN),
    }
}
