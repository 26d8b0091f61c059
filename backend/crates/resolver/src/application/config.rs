//! Application Configuration
//!
//! Configuration for the resolver application layer.

use crate::domain::browser::{LaunchOptions, Viewport};
use crate::domain::value_objects::ProxyDescriptor;
use platform::rate_limit::RateLimitConfig;
use std::path::PathBuf;
use std::time::Duration;

/// Flags for running Chrome inside a container with the least baggage
pub const DEFAULT_LAUNCH_ARGS: &[&str] = &[
    "--no-sandbox",
    "--disable-setuid-sandbox",
    "--disable-dev-shm-usage",
    "--disable-gpu",
    "--no-zygote",
    "--disable-extensions",
    "--disable-background-networking",
    "--disable-default-apps",
    "--disable-sync",
    "--disable-translate",
    "--mute-audio",
    "--hide-scrollbars",
    "--metrics-recording-only",
];

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";

pub const DEFAULT_ACCEPT_LANGUAGE: &str = "tr-TR,tr;q=0.9,en-US;q=0.8,en;q=0.7";

/// Resolver application configuration
#[derive(Clone)]
pub struct ResolverConfig {
    /// Shared secret for `/resolve`; `None` disables the check
    pub api_secret: Option<String>,
    /// Per-client request budget
    pub rate_limit: RateLimitConfig,
    /// Run the browser without a window
    pub headless: bool,
    /// Explicit browser binary; auto-detected when unset
    pub chrome_executable: Option<PathBuf>,
    /// Launch flags, proxy flag excluded
    pub launch_args: Vec<String>,
    /// Per-command protocol timeout without a proxy
    pub protocol_timeout_base: Duration,
    /// Per-command protocol timeout through a proxy
    pub protocol_timeout_proxy: Duration,
    pub navigation_timeout_default: Duration,
    pub navigation_timeout_max: Duration,
    pub proxy_navigation_timeout_default: Duration,
    pub proxy_navigation_timeout_max: Duration,
    /// Extra wait after network idle for client-side redirects
    pub settle_wait_default: Duration,
    pub settle_wait_max: Duration,
    pub user_agent: String,
    pub accept_language: String,
    pub viewport: Viewport,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            api_secret: None,
            rate_limit: RateLimitConfig::default(),
            headless: true,
            chrome_executable: None,
            launch_args: DEFAULT_LAUNCH_ARGS.iter().map(|s| s.to_string()).collect(),
            protocol_timeout_base: Duration::from_secs(60),
            protocol_timeout_proxy: Duration::from_secs(120),
            navigation_timeout_default: Duration::from_secs(45),
            navigation_timeout_max: Duration::from_secs(60),
            proxy_navigation_timeout_default: Duration::from_secs(90),
            proxy_navigation_timeout_max: Duration::from_secs(120),
            settle_wait_default: Duration::from_secs(8),
            settle_wait_max: Duration::from_secs(15),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
            viewport: Viewport {
                width: 1366,
                height: 768,
            },
        }
    }
}

impl std::fmt::Debug for ResolverConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverConfig")
            .field("api_secret", &self.api_secret.as_ref().map(|_| "<redacted>"))
            .field("rate_limit", &self.rate_limit)
            .field("headless", &self.headless)
            .field("chrome_executable", &self.chrome_executable)
            .field("navigation_timeout_max", &self.navigation_timeout_max)
            .field("settle_wait_max", &self.settle_wait_max)
            .finish_non_exhaustive()
    }
}

impl ResolverConfig {
    /// Config with the given API secret; an empty secret disables the check
    pub fn with_api_secret(secret: Option<String>) -> Self {
        Self {
            api_secret: secret.filter(|s| !s.is_empty()),
            ..Default::default()
        }
    }

    /// Launch parameters for one session
    pub fn launch_options(&self, proxy: Option<&ProxyDescriptor>) -> LaunchOptions {
        LaunchOptions {
            headless: self.headless,
            args: self.launch_args.clone(),
            proxy_server: proxy.map(ProxyDescriptor::server_url),
            protocol_timeout: self.protocol_timeout(proxy.is_some()),
            executable: self.chrome_executable.clone(),
        }
    }

    pub fn protocol_timeout(&self, proxy: bool) -> Duration {
        if proxy {
            self.protocol_timeout_proxy
        } else {
            self.protocol_timeout_base
        }
    }

    /// Requested navigation timeout clamped to the mode's ceiling
    pub fn navigation_timeout(&self, requested_ms: Option<u64>, proxy: bool) -> Duration {
        let (default, max) = if proxy {
            (
                self.proxy_navigation_timeout_default,
                self.proxy_navigation_timeout_max,
            )
        } else {
            (self.navigation_timeout_default, self.navigation_timeout_max)
        };
        clamp(requested_ms, default, max)
    }

    /// Requested settle wait clamped to its ceiling
    pub fn settle_wait(&self, requested_ms: Option<u64>) -> Duration {
        clamp(requested_ms, self.settle_wait_default, self.settle_wait_max)
    }

    /// Headers sent with every page request
    pub fn extra_headers(&self) -> Vec<(String, String)> {
        vec![("Accept-Language".to_string(), self.accept_language.clone())]
    }
}

fn clamp(requested_ms: Option<u64>, default: Duration, max: Duration) -> Duration {
    requested_ms
        .map(Duration::from_millis)
        .unwrap_or(default)
        .min(max)
}
