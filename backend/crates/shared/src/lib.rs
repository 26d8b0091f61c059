//! Shared Kernel - Domain-crossing minimal core
//!
//! This crate contains the "smallest core" of the resolver's vocabulary:
//! - The HTTP-facing error value and its status classification
//! - Correlation ID types used across logs and responses
//!
//! **Design Principle**: Only include things that are "hard to change"
//! and have consistent meaning across all layers.

pub mod error {
    pub mod app_error;
    pub mod kind;
    #[cfg(feature = "axum")]
    mod response;
}
pub mod id;
