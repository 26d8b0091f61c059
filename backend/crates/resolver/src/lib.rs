//! Redirect Resolver Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Value objects, entities, browser-engine ports, pure services
//! - `application/` - Configuration and the resolution use case
//! - `infra/` - Chrome DevTools Protocol engine adapter
//! - `presentation/` - HTTP handlers, DTOs, middleware, router
//!
//! ## Resolution Model
//! - Every resolution launches its own browser session and always closes it
//! - The redirect chain is the ordered, de-duplicated list of main-frame URLs
//! - Caller-supplied waits and timeouts are clamped to fixed ceilings
//! - Requests pass the access gate first, then the per-client rate limiter

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::ResolverConfig;
pub use application::resolve_url::{ResolveInput, ResolveUrlUseCase};
pub use error::{ResolveError, ResolveResult};
pub use infra::chromium::ChromiumEngine;
pub use presentation::router::resolver_router;

// Re-export kernel error types for unified error handling
pub use kernel::error::{app_error::AppError, kind::ErrorKind};
