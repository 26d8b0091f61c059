//! Infrastructure Layer
//!
//! Browser engine adapters.

pub mod chromium;
