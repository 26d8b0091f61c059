//! Domain Layer - Business logic and entities
//!
//! This layer contains:
//! - Domain entities (ResolutionRequest, ResolutionResult)
//! - Domain value objects (TargetUrl, ProxyDescriptor, RedirectChain)
//! - Domain services (access gate, resource policy, redirect tracking)
//! - Browser engine traits (interfaces)

pub mod browser;
pub mod entities;
pub mod services;
pub mod value_objects;
