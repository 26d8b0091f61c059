//! HTTP Handlers

use crate::application::config::ResolverConfig;
use crate::application::resolve_url::ResolveUrlUseCase;
use crate::domain::browser::BrowserEngine;
use crate::error::ResolveResult;
use crate::presentation::dto::{
    HealthResponse, ResolveFailureResponse, ResolveQuery, ResolveSuccessResponse,
    ServiceInfoResponse,
};
use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::app_error::AppError;
use std::sync::Arc;

/// Shared state for resolver handlers
pub struct ResolverAppState<E>
where
    E: BrowserEngine + Sync + 'static,
{
    pub engine: Arc<E>,
    pub config: Arc<ResolverConfig>,
}

impl<E> Clone for ResolverAppState<E>
where
    E: BrowserEngine + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
            config: self.config.clone(),
        }
    }
}

/// GET /
pub async fn service_info() -> Json<ServiceInfoResponse> {
    Json(ServiceInfoResponse::default())
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// GET /resolve
///
/// Input errors are answered before any browser is launched. Resolution
/// failures are reported with 500 and a failure-shaped body.
pub async fn resolve<E>(
    State(state): State<ResolverAppState<E>>,
    Query(query): Query<ResolveQuery>,
) -> ResolveResult<Response>
where
    E: BrowserEngine + Sync + 'static,
{
    let input = query.into_input();

    let use_case = ResolveUrlUseCase::new(state.engine.clone(), state.config.clone());
    let request = use_case.prepare(&input)?;

    let result = use_case.execute(request).await;

    if result.success {
        Ok(Json(ResolveSuccessResponse::from(result)).into_response())
    } else {
        Ok((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ResolveFailureResponse::from(result)),
        )
            .into_response())
    }
}

/// Fallback for unknown routes
pub async fn not_found() -> Response {
    AppError::not_found("Route not found").into_response()
}
