//! Resolve URL Use Case
//!
//! Drives one browser session from launch to teardown and reports where the
//! target URL ends up.

use crate::application::config::ResolverConfig;
use crate::domain::browser::{BrowserEngine, BrowserPage, BrowserSession, NavigateOptions, WaitUntil};
use crate::domain::entities::{ResolutionRequest, ResolutionResult};
use crate::domain::services::{RedirectTracker, resource_policy};
use crate::domain::value_objects::{ProxyDescriptor, ProxyParams, TargetUrl};
use crate::error::{ResolveError, ResolveResult};
use std::sync::Arc;
use tracing::Instrument;

/// Input DTO for resolve url
#[derive(Debug, Clone, Default)]
pub struct ResolveInput {
    pub url: Option<String>,
    /// Requested settle wait in ms
    pub wait_ms: Option<u64>,
    /// Requested navigation timeout in ms
    pub timeout_ms: Option<u64>,
    pub proxy: ProxyParams,
}

impl ResolutionRequest {
    /// Validate caller input and derive the clamped request
    pub fn from_params(input: &ResolveInput, config: &ResolverConfig) -> ResolveResult<Self> {
        let raw = input
            .url
            .as_deref()
            .filter(|u| !u.is_empty())
            .ok_or(ResolveError::MissingUrl)?;
        let target = TargetUrl::parse(raw)?;
        let proxy = input.proxy.build()?;

        let settle_wait = config.settle_wait(input.wait_ms);
        let navigation_timeout = config.navigation_timeout(input.timeout_ms, proxy.is_some());

        Ok(Self::new(target, proxy, settle_wait, navigation_timeout))
    }
}

/// Values read from the page once it has settled
struct Collected {
    final_url: String,
    title: String,
    redirect_chain: Vec<String>,
}

/// Resolve URL Use Case
pub struct ResolveUrlUseCase<E>
where
    E: BrowserEngine,
{
    engine: Arc<E>,
    config: Arc<ResolverConfig>,
}

impl<E> ResolveUrlUseCase<E>
where
    E: BrowserEngine + Sync + 'static,
{
    pub fn new(engine: Arc<E>, config: Arc<ResolverConfig>) -> Self {
        Self { engine, config }
    }

    /// Validate input without touching the engine
    pub fn prepare(&self, input: &ResolveInput) -> ResolveResult<ResolutionRequest> {
        ResolutionRequest::from_params(input, &self.config)
    }

    /// Run one resolution
    ///
    /// Never fails: engine errors are folded into a failed result. Once a
    /// session has been launched it is closed on every path.
    pub async fn execute(&self, request: ResolutionRequest) -> ResolutionResult {
        let span = tracing::info_span!(
            "resolution",
            resolution_id = %request.id,
            url = %request.target
        );
        self.run(request).instrument(span).await
    }

    async fn run(&self, request: ResolutionRequest) -> ResolutionResult {
        if let Some(proxy) = &request.proxy {
            tracing::info!(proxy = %proxy.endpoint(), scheme = %proxy.scheme(), "Using proxy");
        }

        let options = self.config.launch_options(request.proxy.as_ref());
        let mut session = match self.engine.launch(&options).await {
            Ok(session) => session,
            Err(err) => {
                err.log();
                return ResolutionResult::failed(&request, &err);
            }
        };

        let outcome = self.drive(&mut session, &request).await;

        if let Err(err) = session.close().await {
            tracing::warn!(error = %err, "Browser teardown failed");
        }

        match outcome {
            Ok(collected) => {
                let result = ResolutionResult::succeeded(
                    &request,
                    collected.final_url,
                    collected.title,
                    collected.redirect_chain,
                );
                tracing::info!(
                    final_url = %result.final_url,
                    changed = result.changed,
                    hops = result.redirect_chain.len(),
                    "Resolution finished"
                );
                result
            }
            Err(err) => {
                err.log();
                ResolutionResult::failed(&request, &err)
            }
        }
    }

    async fn drive(
        &self,
        session: &mut E::Session,
        request: &ResolutionRequest,
    ) -> ResolveResult<Collected> {
        let mut page = session.new_page().await?;
        let tracker = RedirectTracker::new(request.target.as_str());

        if let Some(credentials) = request.proxy.as_ref().and_then(ProxyDescriptor::credentials) {
            page.authenticate(credentials).await?;
        }
        page.set_user_agent(&self.config.user_agent).await?;
        page.set_extra_headers(&self.config.extra_headers()).await?;
        page.set_viewport(self.config.viewport).await?;
        page.set_request_interception(resource_policy).await?;
        page.on_main_frame_navigated(tracker.observer()).await?;

        page.navigate(
            request.target.as_str(),
            NavigateOptions {
                wait_until: WaitUntil::NetworkIdle,
                timeout: request.navigation_timeout,
            },
        )
        .await?;

        if !request.settle_wait.is_zero() {
            tokio::time::sleep(request.settle_wait).await;
        }

        let final_url = page.current_url().await?;
        let title = match page.title().await {
            Ok(title) => title,
            Err(err) => {
                tracing::warn!(error = %err, "Could not read page title");
                String::new()
            }
        };

        Ok(Collected {
            final_url,
            title,
            redirect_chain: tracker.finish(),
        })
    }
}
