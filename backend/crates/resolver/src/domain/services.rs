//! Domain Services
//!
//! Pure domain logic for access control, request filtering and redirect
//! tracking.

use crate::domain::browser::{InterceptDecision, NavigationObserver, ResourceType};
use crate::domain::value_objects::RedirectChain;
use platform::crypto::constant_time_eq;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// Shared-secret check in front of the resolve endpoint
///
/// With no secret configured every caller is admitted.
#[derive(Clone, Default)]
pub struct AccessGate {
    secret: Option<String>,
}

impl AccessGate {
    pub fn new(secret: Option<String>) -> Self {
        Self {
            secret: secret.filter(|s| !s.is_empty()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.secret.is_some()
    }

    pub fn admit(&self, presented: Option<&str>) -> bool {
        match (&self.secret, presented) {
            (None, _) => true,
            (Some(secret), Some(token)) => constant_time_eq(secret.as_bytes(), token.as_bytes()),
            (Some(_), None) => false,
        }
    }
}

impl fmt::Debug for AccessGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessGate")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

/// Interception rule for resolution pages
///
/// Heavy static resources never influence where a page ends up, so they are
/// aborted. Documents and scripts must load for redirects to fire.
pub fn resource_policy(resource: ResourceType) -> InterceptDecision {
    match resource {
        ResourceType::Image | ResourceType::Stylesheet | ResourceType::Font | ResourceType::Media => {
            InterceptDecision::Abort
        }
        _ => InterceptDecision::Continue,
    }
}

/// Collects main-frame navigations into a [`RedirectChain`]
///
/// The observer runs on the engine's event task while the use case awaits
/// navigation, hence the shared ownership.
#[derive(Debug, Clone)]
pub struct RedirectTracker {
    chain: Arc<Mutex<RedirectChain>>,
}

impl RedirectTracker {
    pub fn new(original: &str) -> Self {
        Self {
            chain: Arc::new(Mutex::new(RedirectChain::new(original))),
        }
    }

    pub fn observer(&self) -> NavigationObserver {
        let chain = Arc::clone(&self.chain);
        Arc::new(move |url: &str| {
            let mut chain = chain.lock().unwrap_or_else(PoisonError::into_inner);
            if chain.record(url) {
                tracing::debug!(url = %url, "Main frame navigated");
            }
        })
    }

    /// Snapshot the chain, de-duplicated in first-seen order
    pub fn finish(&self) -> Vec<String> {
        let chain = self.chain.lock().unwrap_or_else(PoisonError::into_inner);
        chain.clone().finalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_disabled_admits_everyone() {
        let gate = AccessGate::new(None);
        assert!(!gate.is_enabled());
        assert!(gate.admit(None));
        assert!(gate.admit(Some("anything")));

        let empty = AccessGate::new(Some(String::new()));
        assert!(!empty.is_enabled());
        assert!(empty.admit(None));
    }

    #[test]
    fn test_gate_enabled_requires_exact_secret() {
        let gate = AccessGate::new(Some("s3cret".into()));
        assert!(gate.is_enabled());
        assert!(gate.admit(Some("s3cret")));
        assert!(!gate.admit(Some("s3cre")));
        assert!(!gate.admit(Some("S3CRET")));
        assert!(!gate.admit(None));
    }

    #[test]
    fn test_gate_debug_hides_secret() {
        let gate = AccessGate::new(Some("s3cret".into()));
        assert!(!format!("{:?}", gate).contains("s3cret"));
    }

    #[test]
    fn test_resource_policy() {
        for aborted in [
            ResourceType::Image,
            ResourceType::Stylesheet,
            ResourceType::Font,
            ResourceType::Media,
        ] {
            assert_eq!(resource_policy(aborted), InterceptDecision::Abort);
        }
        for continued in [
            ResourceType::Document,
            ResourceType::Script,
            ResourceType::Xhr,
            ResourceType::Fetch,
            ResourceType::Other,
        ] {
            assert_eq!(resource_policy(continued), InterceptDecision::Continue);
        }
    }

    #[test]
    fn test_tracker_collects_from_observer() {
        let tracker = RedirectTracker::new("http://a.test/");
        let observer = tracker.observer();
        observer("about:blank");
        observer("http://a.test/");
        observer("http://b.test/");
        observer("http://b.test/");

        assert_eq!(tracker.finish(), vec!["http://a.test/", "http://b.test/"]);
    }

    #[test]
    fn test_tracker_observer_is_shareable_across_threads() {
        let tracker = RedirectTracker::new("http://a.test/");
        let observer = tracker.observer();
        std::thread::spawn(move || observer("http://c.test/"))
            .join()
            .unwrap();
        assert_eq!(tracker.finish(), vec!["http://a.test/", "http://c.test/"]);
    }
}
