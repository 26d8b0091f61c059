//! Application Layer - Use Cases
//!
//! This layer orchestrates domain logic and the browser engine.

pub mod config;
pub mod resolve_url;
