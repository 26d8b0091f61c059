//! Browser Engine Ports
//!
//! Interfaces for driving a headless browser. The Chrome DevTools Protocol
//! implementation lives in the infrastructure layer; tests script their own.

use crate::domain::value_objects::ProxyCredentials;
use crate::error::ResolveResult;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Browser process launch parameters
#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    pub headless: bool,
    /// Command-line flags, excluding the proxy flag
    pub args: Vec<String>,
    /// `scheme://host:port` of the upstream proxy, if any
    pub proxy_server: Option<String>,
    /// Ceiling on every individual protocol command
    pub protocol_timeout: Duration,
    /// Explicit browser binary; auto-detected when unset
    pub executable: Option<PathBuf>,
}

impl LaunchOptions {
    /// Flags as passed to the browser process, proxy flag included
    pub fn all_args(&self) -> Vec<String> {
        let mut args = self.args.clone();
        if let Some(server) = &self.proxy_server {
            args.push(format!("--proxy-server={}", server));
        }
        args
    }
}

/// Kind of resource a page is about to fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceType {
    Document,
    Stylesheet,
    Image,
    Media,
    Font,
    Script,
    Xhr,
    Fetch,
    Other,
}

/// What to do with an intercepted request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterceptDecision {
    Continue,
    Abort,
}

/// Per-request interception rule
pub type InterceptionPolicy = fn(ResourceType) -> InterceptDecision;

/// Callback fired with the new URL each time the main frame navigates
pub type NavigationObserver = Arc<dyn Fn(&str) + Send + Sync>;

/// Condition that ends a navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitUntil {
    /// At most two in-flight network connections for 500 ms
    #[default]
    NetworkIdle,
}

#[derive(Debug, Clone)]
pub struct NavigateOptions {
    pub wait_until: WaitUntil,
    pub timeout: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Browser engine trait
#[trait_variant::make(BrowserEngine: Send)]
pub trait LocalBrowserEngine {
    type Session: BrowserSession;

    /// Start an isolated browser session
    async fn launch(&self, options: &LaunchOptions) -> ResolveResult<Self::Session>;
}

/// A running browser process, exclusively owned by one resolution
#[trait_variant::make(BrowserSession: Send)]
pub trait LocalBrowserSession {
    type Page: BrowserPage;

    /// Open a fresh tab on the blank page
    async fn new_page(&mut self) -> ResolveResult<Self::Page>;

    /// Terminate the browser process
    async fn close(&mut self) -> ResolveResult<()>;
}

/// A single tab
///
/// All `set_*`/`on_*` calls must happen before [`LocalBrowserPage::navigate`].
#[trait_variant::make(BrowserPage: Send)]
pub trait LocalBrowserPage {
    /// Answer proxy authentication challenges with these credentials
    async fn authenticate(&mut self, credentials: &ProxyCredentials) -> ResolveResult<()>;

    async fn set_user_agent(&mut self, user_agent: &str) -> ResolveResult<()>;

    /// Headers added to every outgoing request
    async fn set_extra_headers(&mut self, headers: &[(String, String)]) -> ResolveResult<()>;

    async fn set_viewport(&mut self, viewport: Viewport) -> ResolveResult<()>;

    /// Route every outgoing request through `policy`
    async fn set_request_interception(&mut self, policy: InterceptionPolicy)
    -> ResolveResult<()>;

    /// Subscribe to main-frame navigations; sub-frames are not reported
    async fn on_main_frame_navigated(&mut self, observer: NavigationObserver)
    -> ResolveResult<()>;

    /// Load `url` and wait for the completion condition
    ///
    /// Fails with [`crate::error::ResolveError::NavigationTimeout`] when the
    /// condition is not met within `options.timeout`.
    async fn navigate(&mut self, url: &str, options: NavigateOptions) -> ResolveResult<()>;

    async fn current_url(&self) -> ResolveResult<String>;

    async fn title(&self) -> ResolveResult<String>;
}
