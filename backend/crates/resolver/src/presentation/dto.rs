//! API DTOs (Data Transfer Objects)

use crate::application::resolve_url::ResolveInput;
use crate::domain::entities::ResolutionResult;
use crate::domain::value_objects::ProxyParams;
use serde::{Deserialize, Serialize};

pub const SERVICE_NAME: &str = "URL Redirect Resolver";

pub const USAGE: &str = "GET /resolve?url=https://example.com&token=YOUR_TOKEN\
     &proxy_host=IP&proxy_port=PORT&proxy_user=USER&proxy_pass=PASS";

/// Value of `proxy_used` when the resolution ran without a proxy
pub const NO_PROXY: &str = "none";

/// Query for GET /resolve
///
/// Every field is taken as a raw string so that malformed numbers never
/// reject the request at extraction time.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResolveQuery {
    pub url: Option<String>,
    pub token: Option<String>,
    pub wait: Option<String>,
    #[serde(alias = "navigation_timeout")]
    pub timeout: Option<String>,
    pub proxy_host: Option<String>,
    pub proxy_port: Option<String>,
    pub proxy_user: Option<String>,
    pub proxy_pass: Option<String>,
    pub proxy_proto: Option<String>,
}

impl ResolveQuery {
    /// Unparseable `wait`/`timeout` values fall back to the defaults
    pub fn into_input(self) -> ResolveInput {
        ResolveInput {
            url: self.url,
            wait_ms: parse_millis(self.wait.as_deref()),
            timeout_ms: parse_millis(self.timeout.as_deref()),
            proxy: ProxyParams {
                host: self.proxy_host,
                port: self.proxy_port,
                scheme: self.proxy_proto,
                username: self.proxy_user,
                password: self.proxy_pass,
            },
        }
    }
}

fn parse_millis(value: Option<&str>) -> Option<u64> {
    value.and_then(|v| v.trim().parse::<u64>().ok())
}

/// Response for GET /
#[derive(Debug, Clone, Serialize)]
pub struct ServiceInfoResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub usage: &'static str,
}

impl Default for ServiceInfoResponse {
    fn default() -> Self {
        Self {
            status: "ok",
            service: SERVICE_NAME,
            usage: USAGE,
        }
    }
}

/// Response for GET /health
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// 200 response for GET /resolve
#[derive(Debug, Clone, Serialize)]
pub struct ResolveSuccessResponse {
    pub success: bool,
    pub original_url: String,
    pub final_url: String,
    pub changed: bool,
    pub title: String,
    pub redirect_chain: Vec<String>,
    pub proxy_used: String,
}

impl From<ResolutionResult> for ResolveSuccessResponse {
    fn from(result: ResolutionResult) -> Self {
        Self {
            success: result.success,
            original_url: result.original_url,
            final_url: result.final_url,
            changed: result.changed,
            title: result.title,
            redirect_chain: result.redirect_chain,
            proxy_used: result.proxy_used.unwrap_or_else(|| NO_PROXY.to_string()),
        }
    }
}

/// 500 response for GET /resolve
#[derive(Debug, Clone, Serialize)]
pub struct ResolveFailureResponse {
    pub success: bool,
    pub error: String,
    pub original_url: String,
    pub final_url: String,
}

impl From<ResolutionResult> for ResolveFailureResponse {
    fn from(result: ResolutionResult) -> Self {
        Self {
            success: false,
            error: result.error.unwrap_or_default(),
            original_url: result.original_url,
            final_url: result.final_url,
        }
    }
}
