//! Resolver Router

use crate::application::config::ResolverConfig;
use crate::domain::browser::BrowserEngine;
use crate::domain::services::AccessGate;
use crate::presentation::handlers::{self, ResolverAppState};
use crate::presentation::middleware::{self, RateLimitState};
use axum::{Router, middleware::from_fn_with_state, routing::get};
use platform::rate_limit::RateLimitStore;
use std::sync::Arc;

/// Create the resolver router for any engine and rate limit store
///
/// `/resolve` passes the access gate first, then the rate limiter, so
/// rejected tokens never spend a client's budget.
pub fn resolver_router<E, S>(engine: Arc<E>, store: Arc<S>, config: ResolverConfig) -> Router
where
    E: BrowserEngine + Sync + 'static,
    S: RateLimitStore + Send + Sync + 'static,
{
    if config.api_secret.is_none() {
        tracing::warn!("API secret not set, /resolve is open to every client");
    }

    let gate = Arc::new(AccessGate::new(config.api_secret.clone()));
    let limiter = RateLimitState {
        store,
        config: Arc::new(config.rate_limit.clone()),
    };
    let state = ResolverAppState {
        engine,
        config: Arc::new(config),
    };

    Router::new()
        .route("/", get(handlers::service_info))
        .route("/health", get(handlers::health))
        .route(
            "/resolve",
            get(handlers::resolve::<E>)
                .route_layer(from_fn_with_state(limiter, middleware::rate_limit::<S>))
                .route_layer(from_fn_with_state(gate, middleware::require_api_token)),
        )
        .fallback(handlers::not_found)
        .with_state(state)
}
