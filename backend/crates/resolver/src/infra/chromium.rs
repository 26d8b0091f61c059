//! Chrome DevTools Protocol Engine
//!
//! [`BrowserEngine`] implementation on top of `chromiumoxide`. Every session
//! is a dedicated Chrome process with its own throwaway profile directory;
//! every page listener runs as its own task and is aborted when the page is
//! dropped.

use crate::domain::browser::{
    BrowserEngine, BrowserPage, BrowserSession, InterceptDecision, InterceptionPolicy,
    LaunchOptions, NavigateOptions, NavigationObserver, ResourceType, Viewport, WaitUntil,
};
use crate::domain::value_objects::{BLANK_PAGE_URL, ProxyCredentials};
use crate::error::{ResolveError, ResolveResult};
use chromiumoxide::auth::Credentials;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::fetch::{
    ContinueRequestParams, EventRequestPaused, FailRequestParams,
};
use chromiumoxide::cdp::browser_protocol::network::{
    self, ErrorReason, Headers, LoaderId, SetExtraHttpHeadersParams, SetUserAgentOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::page::{
    EventFrameNavigated, EventLifecycleEvent, FrameId, NavigateParams,
    SetLifecycleEventsEnabledParams,
};
use chromiumoxide::error::CdpError;
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::time::Duration;
use tempfile::TempDir;
use tokio::task::JoinHandle;

/// How long a closing browser gets to exit before it is killed
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Lifecycle event Chrome emits after 500 ms with at most two connections
const NETWORK_ALMOST_IDLE: &str = "networkAlmostIdle";

/// Lifecycle event marking a new document in the frame
const LIFECYCLE_INIT: &str = "init";

const PROFILE_PREFIX: &str = "resolver-profile-";

fn browser_error(err: CdpError) -> ResolveError {
    ResolveError::Browser(err.to_string())
}

/// Empty user data directory for one browser process, removed on drop
fn fresh_profile() -> ResolveResult<TempDir> {
    tempfile::Builder::new()
        .prefix(PROFILE_PREFIX)
        .tempdir()
        .map_err(|e| ResolveError::SessionLaunch(format!("cannot create profile directory: {e}")))
}

fn to_credentials(credentials: &ProxyCredentials) -> Credentials {
    Credentials {
        username: credentials.username.clone(),
        password: credentials.password.clone(),
    }
}

/// URL reported for a navigated frame, `None` for subframes
fn main_frame_url(
    parent_id: Option<&FrameId>,
    url: &str,
    fragment: Option<&str>,
) -> Option<String> {
    if parent_id.is_some() {
        return None;
    }
    Some(match fragment {
        Some(fragment) => format!("{url}{fragment}"),
        None => url.to_string(),
    })
}

/// Tracks one frame's current document until it reaches network idle
///
/// A redirect or script navigation starts a new document (`init`), after
/// which only idle events for that new loader count.
struct IdleWatch {
    frame_id: FrameId,
    loader: LoaderId,
}

impl IdleWatch {
    fn new(frame_id: FrameId, loader: LoaderId) -> Self {
        Self { frame_id, loader }
    }

    /// Feed one lifecycle event; `true` once the watched document is idle
    fn step(&mut self, name: &str, frame_id: &FrameId, loader_id: &LoaderId) -> bool {
        if *frame_id != self.frame_id {
            return false;
        }
        if name == LIFECYCLE_INIT {
            self.loader = loader_id.clone();
            false
        } else {
            name == NETWORK_ALMOST_IDLE && *loader_id == self.loader
        }
    }
}

/// Launches one Chrome process per session
#[derive(Debug, Clone, Default)]
pub struct ChromiumEngine;

impl ChromiumEngine {
    pub fn new() -> Self {
        Self
    }
}

impl BrowserEngine for ChromiumEngine {
    type Session = ChromiumSession;

    async fn launch(&self, options: &LaunchOptions) -> ResolveResult<ChromiumSession> {
        let profile = fresh_profile()?;
        let mut builder = BrowserConfig::builder()
            .request_timeout(options.protocol_timeout)
            .user_data_dir(profile.path())
            .enable_request_intercept()
            .args(options.all_args());
        if !options.headless {
            builder = builder.with_head();
        }
        if let Some(executable) = &options.executable {
            builder = builder.chrome_executable(executable);
        }
        let config = builder.build().map_err(ResolveError::SessionLaunch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| ResolveError::SessionLaunch(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    tracing::debug!(error = %err, "Browser handler error");
                }
            }
        });

        tracing::debug!(
            proxy = options.proxy_server.is_some(),
            protocol_timeout_ms = options.protocol_timeout.as_millis() as u64,
            profile = %profile.path().display(),
            "Browser launched"
        );

        Ok(ChromiumSession {
            browser,
            handler_task,
            profile,
        })
    }
}

// Field order matters: the browser goes before its profile directory.
pub struct ChromiumSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
    profile: TempDir,
}

impl BrowserSession for ChromiumSession {
    type Page = ChromiumPage;

    async fn new_page(&mut self) -> ResolveResult<ChromiumPage> {
        let page = self
            .browser
            .new_page(BLANK_PAGE_URL)
            .await
            .map_err(browser_error)?;
        page.execute(SetLifecycleEventsEnabledParams::new(true))
            .await
            .map_err(browser_error)?;

        let mut page = ChromiumPage {
            page,
            paused_task: None,
            observer_tasks: Vec::new(),
        };
        // Intercepted requests stay paused until answered.
        page.answer_paused_requests(None).await?;
        Ok(page)
    }

    async fn close(&mut self) -> ResolveResult<()> {
        let closed = self
            .browser
            .close()
            .await
            .map(|_| ())
            .map_err(|e| ResolveError::Teardown(e.to_string()));

        match tokio::time::timeout(SHUTDOWN_GRACE, self.browser.wait()).await {
            Ok(Ok(_)) => {}
            Ok(Err(err)) => tracing::debug!(error = %err, "Browser exit status unavailable"),
            Err(_) => {
                tracing::warn!("Browser did not exit in time, killing");
                if let Some(Err(err)) = self.browser.kill().await {
                    tracing::warn!(error = %err, "Failed to kill browser");
                }
            }
        }

        self.handler_task.abort();
        tracing::debug!(profile = %self.profile.path().display(), "Browser closed");
        closed
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        self.handler_task.abort();
    }
}

pub struct ChromiumPage {
    page: Page,
    paused_task: Option<JoinHandle<()>>,
    observer_tasks: Vec<JoinHandle<()>>,
}

impl ChromiumPage {
    /// Replace the listener answering paused requests
    ///
    /// Without a policy every request is continued.
    async fn answer_paused_requests(
        &mut self,
        policy: Option<InterceptionPolicy>,
    ) -> ResolveResult<()> {
        let mut paused = self
            .page
            .event_listener::<EventRequestPaused>()
            .await
            .map_err(browser_error)?;
        if let Some(task) = self.paused_task.take() {
            task.abort();
        }

        let page = self.page.clone();
        self.paused_task = Some(tokio::spawn(async move {
            while let Some(event) = paused.next().await {
                let resource = map_resource_type(&event.resource_type);
                let decision = policy.map_or(InterceptDecision::Continue, |p| p(resource));
                let sent = match decision {
                    InterceptDecision::Abort => {
                        tracing::debug!(resource = ?resource, "Request aborted");
                        page.execute(FailRequestParams::new(
                            event.request_id.clone(),
                            ErrorReason::BlockedByClient,
                        ))
                        .await
                        .map(|_| ())
                    }
                    InterceptDecision::Continue => page
                        .execute(ContinueRequestParams::new(event.request_id.clone()))
                        .await
                        .map(|_| ()),
                };
                if let Err(err) = sent {
                    tracing::debug!(error = %err, "Failed to answer paused request");
                }
            }
        }));
        Ok(())
    }
}

impl BrowserPage for ChromiumPage {
    async fn authenticate(&mut self, credentials: &ProxyCredentials) -> ResolveResult<()> {
        self.page
            .authenticate(to_credentials(credentials))
            .await
            .map_err(browser_error)
    }

    async fn set_user_agent(&mut self, user_agent: &str) -> ResolveResult<()> {
        self.page
            .execute(SetUserAgentOverrideParams::new(user_agent))
            .await
            .map_err(browser_error)?;
        Ok(())
    }

    async fn set_extra_headers(&mut self, headers: &[(String, String)]) -> ResolveResult<()> {
        let map: serde_json::Map<String, serde_json::Value> = headers
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
            .collect();
        self.page
            .execute(SetExtraHttpHeadersParams::new(Headers::new(
                serde_json::Value::Object(map),
            )))
            .await
            .map_err(browser_error)?;
        Ok(())
    }

    async fn set_viewport(&mut self, viewport: Viewport) -> ResolveResult<()> {
        self.page
            .execute(SetDeviceMetricsOverrideParams::new(
                i64::from(viewport.width),
                i64::from(viewport.height),
                1.0,
                false,
            ))
            .await
            .map_err(browser_error)?;
        Ok(())
    }

    async fn set_request_interception(&mut self, policy: InterceptionPolicy) -> ResolveResult<()> {
        self.answer_paused_requests(Some(policy)).await
    }

    async fn on_main_frame_navigated(&mut self, observer: NavigationObserver) -> ResolveResult<()> {
        let mut navigations = self
            .page
            .event_listener::<EventFrameNavigated>()
            .await
            .map_err(browser_error)?;
        self.observer_tasks.push(tokio::spawn(async move {
            while let Some(event) = navigations.next().await {
                let frame = &event.frame;
                if let Some(url) = main_frame_url(
                    frame.parent_id.as_ref(),
                    &frame.url,
                    frame.url_fragment.as_deref(),
                ) {
                    observer(&url);
                }
            }
        }));
        Ok(())
    }

    async fn navigate(&mut self, url: &str, options: NavigateOptions) -> ResolveResult<()> {
        let WaitUntil::NetworkIdle = options.wait_until;

        let mut lifecycle = self
            .page
            .event_listener::<EventLifecycleEvent>()
            .await
            .map_err(browser_error)?;

        let page = &self.page;
        let wait = async move {
            let response = page
                .execute(NavigateParams::new(url))
                .await
                .map_err(|e| ResolveError::Navigation(e.to_string()))?;
            if let Some(error_text) = response.error_text.as_ref().filter(|t| !t.is_empty()) {
                return Err(ResolveError::Navigation(error_text.clone()));
            }

            // Same-document navigations carry no loader and have nothing to wait for.
            let Some(loader) = response.loader_id.clone() else {
                return Ok(());
            };
            let mut watch = IdleWatch::new(response.frame_id.clone(), loader);

            while let Some(event) = lifecycle.next().await {
                if watch.step(&event.name, &event.frame_id, &event.loader_id) {
                    return Ok(());
                }
            }
            Err(ResolveError::Navigation("page closed during navigation".to_string()))
        };

        match tokio::time::timeout(options.timeout, wait).await {
            Ok(result) => result,
            Err(_) => Err(ResolveError::NavigationTimeout(options.timeout)),
        }
    }

    async fn current_url(&self) -> ResolveResult<String> {
        self.page
            .url()
            .await
            .map_err(browser_error)?
            .ok_or_else(|| ResolveError::Browser("page has no URL".to_string()))
    }

    async fn title(&self) -> ResolveResult<String> {
        let title = self.page.get_title().await.map_err(browser_error)?;
        Ok(title.unwrap_or_default())
    }
}

impl Drop for ChromiumPage {
    fn drop(&mut self) {
        for task in self.paused_task.iter().chain(self.observer_tasks.iter()) {
            task.abort();
        }
    }
}

fn map_resource_type(resource: &network::ResourceType) -> ResourceType {
    match resource {
        network::ResourceType::Document => ResourceType::Document,
        network::ResourceType::Stylesheet => ResourceType::Stylesheet,
        network::ResourceType::Image => ResourceType::Image,
        network::ResourceType::Media => ResourceType::Media,
        network::ResourceType::Font => ResourceType::Font,
        network::ResourceType::Script => ResourceType::Script,
        network::ResourceType::Xhr => ResourceType::Xhr,
        network::ResourceType::Fetch => ResourceType::Fetch,
        _ => ResourceType::Other,
    }
}
