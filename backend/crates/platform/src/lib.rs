//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Sliding-window rate limiting (in-memory, per client identity)
//! - Client identity and API token extraction
//! - Constant-time secret comparison

pub mod client;
pub mod crypto;
pub mod rate_limit;
