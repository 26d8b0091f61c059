//! Resolver Middleware
//!
//! Access gate and per-client rate limiting for `/resolve`.

use crate::domain::services::AccessGate;
use crate::error::ResolveError;
use axum::body::Body;
use axum::extract::{ConnectInfo, Query, State};
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use platform::client::{client_identity, extract_api_token};
use platform::rate_limit::{RateLimitConfig, RateLimitStore, now_ms};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;

#[derive(Debug, Default, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Rejects requests whose token does not match the configured secret
pub async fn require_api_token(
    State(gate): State<Arc<AccessGate>>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, Response> {
    if !gate.is_enabled() {
        return Ok(next.run(req).await);
    }

    let query_token = Query::<TokenQuery>::try_from_uri(req.uri())
        .map(|Query(q)| q.token)
        .unwrap_or_default();
    let token = extract_api_token(query_token.as_deref(), req.headers());

    if !gate.admit(token.as_deref()) {
        return Err(ResolveError::Unauthorized.into_response());
    }

    Ok(next.run(req).await)
}

/// Middleware state
pub struct RateLimitState<S>
where
    S: RateLimitStore + Send + Sync + 'static,
{
    pub store: Arc<S>,
    pub config: Arc<RateLimitConfig>,
}

impl<S> Clone for RateLimitState<S>
where
    S: RateLimitStore + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            config: self.config.clone(),
        }
    }
}

/// Sliding-window limit keyed by the peer address
///
/// A failing store admits the request.
pub async fn rate_limit<S>(
    State(state): State<RateLimitState<S>>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, Response>
where
    S: RateLimitStore + Send + Sync + 'static,
{
    let peer_ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip());
    let key = client_identity(peer_ip);

    match state.store.check_and_increment(&key, &state.config).await {
        Ok(result) if !result.allowed => {
            let retry_after_secs = result.retry_after_secs(now_ms());
            return Err(ResolveError::RateLimitExceeded { retry_after_secs }.into_response());
        }
        Ok(_) => {}
        Err(e) => {
            tracing::warn!(error = %e, key = %key, "Rate limit store failed, admitting request");
        }
    }

    Ok(next.run(req).await)
}
