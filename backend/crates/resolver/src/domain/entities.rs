//! Domain Entities

use crate::domain::value_objects::{ProxyDescriptor, TargetUrl};
use crate::error::ResolveError;
use kernel::id::ResolutionId;
use std::time::Duration;

/// A validated resolution job
///
/// Waits and timeouts are already clamped to their ceilings.
#[derive(Debug, Clone)]
pub struct ResolutionRequest {
    pub id: ResolutionId,
    pub target: TargetUrl,
    pub proxy: Option<ProxyDescriptor>,
    /// Extra time to let client-side redirects fire after navigation settles
    pub settle_wait: Duration,
    pub navigation_timeout: Duration,
}

impl ResolutionRequest {
    pub fn new(
        target: TargetUrl,
        proxy: Option<ProxyDescriptor>,
        settle_wait: Duration,
        navigation_timeout: Duration,
    ) -> Self {
        Self {
            id: ResolutionId::new(),
            target,
            proxy,
            settle_wait,
            navigation_timeout,
        }
    }
}

/// Outcome of one resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionResult {
    pub success: bool,
    pub original_url: String,
    pub final_url: String,
    /// `final_url != original_url`, compared verbatim
    pub changed: bool,
    pub title: String,
    pub redirect_chain: Vec<String>,
    /// `host:port` of the proxy, when one was used
    pub proxy_used: Option<String>,
    pub error: Option<String>,
}

impl ResolutionResult {
    pub fn succeeded(
        request: &ResolutionRequest,
        final_url: String,
        title: String,
        redirect_chain: Vec<String>,
    ) -> Self {
        let original_url = request.target.as_str().to_string();
        Self {
            success: true,
            changed: final_url != original_url,
            original_url,
            final_url,
            title,
            redirect_chain,
            proxy_used: request.proxy.as_ref().map(ProxyDescriptor::endpoint),
            error: None,
        }
    }

    /// A failed resolution reports the original URL as the final one
    pub fn failed(request: &ResolutionRequest, error: &ResolveError) -> Self {
        let original_url = request.target.as_str().to_string();
        Self {
            success: false,
            final_url: original_url.clone(),
            redirect_chain: vec![original_url.clone()],
            original_url,
            changed: false,
            title: String::new(),
            proxy_used: request.proxy.as_ref().map(ProxyDescriptor::endpoint),
            error: Some(error.to_string()),
        }
    }
}
