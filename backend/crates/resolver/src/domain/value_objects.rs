//! Domain Value Objects
//!
//! Immutable value types for the resolver domain.

use crate::error::{ResolveError, ResolveResult};
use std::collections::HashSet;
use std::fmt;
use std::net::Ipv6Addr;
use url::Url;

/// URL of the blank document a fresh tab starts on
pub const BLANK_PAGE_URL: &str = "about:blank";

/// Target of a resolution
///
/// Keeps the caller's string verbatim; it is what the redirect chain starts
/// with and what the final URL is compared against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetUrl {
    raw: String,
}

impl TargetUrl {
    /// Parse a well-formed absolute http(s) URL
    pub fn parse(raw: &str) -> ResolveResult<Self> {
        if raw.is_empty() {
            return Err(ResolveError::MissingUrl);
        }

        let parsed = Url::parse(raw).map_err(|e| ResolveError::InvalidUrl(e.to_string()))?;

        match parsed.scheme() {
            "http" | "https" => {}
            other => return Err(ResolveError::UnsupportedScheme(other.to_string())),
        }

        if parsed.host_str().is_none_or(str::is_empty) {
            return Err(ResolveError::InvalidUrl("missing host".to_string()));
        }

        Ok(Self {
            raw: raw.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for TargetUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Proxy schemes Chrome accepts for `--proxy-server`
const PROXY_SCHEMES: &[&str] = &["http", "https", "socks4", "socks5"];

/// Raw, optional proxy parameters as received from the caller
#[derive(Debug, Clone, Default)]
pub struct ProxyParams {
    pub host: Option<String>,
    pub port: Option<String>,
    pub scheme: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl ProxyParams {
    /// Derive the proxy descriptor, if any
    ///
    /// Proxy mode requires both a host and a port. Anything less is "no
    /// proxy", not an error. Once enabled, the port must be a non-zero u16,
    /// the host must look like a host, and the scheme must be one Chrome
    /// understands. Credentials apply only when both halves are present.
    ///
    /// IPv6 literals are accepted with or without brackets and stored bare.
    pub fn build(&self) -> ResolveResult<Option<ProxyDescriptor>> {
        let (Some(raw_host), Some(port)) = (non_empty(&self.host), non_empty(&self.port)) else {
            return Ok(None);
        };

        let unbracketed = raw_host.strip_prefix('[').and_then(|h| h.strip_suffix(']'));
        let (host, bracketed) = match unbracketed {
            Some(inner) => (inner, true),
            None => (raw_host, false),
        };
        let malformed = if bracketed || host.contains(':') {
            host.parse::<Ipv6Addr>().is_err()
        } else {
            host.chars().any(|c| c.is_whitespace() || "/@?#[]".contains(c))
        };
        if malformed {
            return Err(ResolveError::InvalidProxy(format!("invalid host {:?}", raw_host)));
        }

        let port = match port.parse::<u16>() {
            Ok(p) if p != 0 => p,
            _ => return Err(ResolveError::InvalidProxy(format!("invalid port {:?}", port))),
        };

        let scheme = non_empty(&self.scheme)
            .map(str::to_ascii_lowercase)
            .unwrap_or_else(|| "http".to_string());
        if !PROXY_SCHEMES.contains(&scheme.as_str()) {
            return Err(ResolveError::InvalidProxy(format!(
                "unsupported scheme {:?}",
                scheme
            )));
        }

        let credentials = match (non_empty(&self.username), non_empty(&self.password)) {
            (Some(username), Some(password)) => Some(ProxyCredentials {
                username: username.to_string(),
                password: password.to_string(),
            }),
            _ => None,
        };

        Ok(Some(ProxyDescriptor {
            scheme,
            host: host.to_string(),
            port,
            credentials,
        }))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Upstream proxy a session is launched behind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyDescriptor {
    scheme: String,
    host: String,
    port: u16,
    credentials: Option<ProxyCredentials>,
}

impl ProxyDescriptor {
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn credentials(&self) -> Option<&ProxyCredentials> {
        self.credentials.as_ref()
    }

    /// `scheme://host:port`, the value handed to the browser at launch
    pub fn server_url(&self) -> String {
        format!("{}://{}", self.scheme, self.endpoint())
    }

    /// `host:port`, as reported back to the caller; IPv6 hosts are bracketed
    pub fn endpoint(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

/// Proxy authentication, applied on the page rather than at launch
#[derive(Clone, PartialEq, Eq)]
pub struct ProxyCredentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for ProxyCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Ordered log of URLs the main frame passed through
///
/// Starts with the original request URL. Recording is append-only; the
/// de-duplicated view is produced once, by [`RedirectChain::finalize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectChain {
    entries: Vec<String>,
}

impl RedirectChain {
    pub fn new(original: impl Into<String>) -> Self {
        Self {
            entries: vec![original.into()],
        }
    }

    /// Append an observed main-frame URL
    ///
    /// Empty URLs and the blank page are ignored. Returns whether the URL
    /// was recorded.
    pub fn record(&mut self, url: &str) -> bool {
        if url.is_empty() || url == BLANK_PAGE_URL {
            return false;
        }
        self.entries.push(url.to_string());
        true
    }

    /// Distinct URLs in first-seen order
    pub fn finalize(self) -> Vec<String> {
        let mut seen = HashSet::with_capacity(self.entries.len());
        self.entries
            .into_iter()
            .filter(|url| seen.insert(url.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(host: &str, port: &str) -> ProxyParams {
        ProxyParams {
            host: Some(host.to_string()),
            port: Some(port.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_target_url_keeps_raw_string() {
        let target = TargetUrl::parse("http://Example.com").unwrap();
        assert_eq!(target.as_str(), "http://Example.com");
        assert_eq!(target.to_string(), "http://Example.com");
    }

    #[test]
    fn test_target_url_rejects_malformed() {
        assert!(matches!(
            TargetUrl::parse("not a url"),
            Err(ResolveError::InvalidUrl(_))
        ));
        assert!(matches!(
            TargetUrl::parse("/relative/path"),
            Err(ResolveError::InvalidUrl(_))
        ));
        assert!(matches!(TargetUrl::parse(""), Err(ResolveError::MissingUrl)));
    }

    #[test]
    fn test_target_url_rejects_other_schemes() {
        assert!(matches!(
            TargetUrl::parse("ftp://example.com/file"),
            Err(ResolveError::UnsupportedScheme(s)) if s == "ftp"
        ));
        assert!(matches!(
            TargetUrl::parse("javascript:alert(1)"),
            Err(ResolveError::UnsupportedScheme(_))
        ));
    }

    #[test]
    fn test_proxy_requires_host_and_port() {
        assert_eq!(ProxyParams::default().build().unwrap(), None);

        let host_only = ProxyParams {
            host: Some("10.0.0.5".into()),
            ..Default::default()
        };
        assert_eq!(host_only.build().unwrap(), None);

        let port_only = ProxyParams {
            port: Some("8080".into()),
            ..Default::default()
        };
        assert_eq!(port_only.build().unwrap(), None);

        assert_eq!(params("", "8080").build().unwrap(), None);
    }

    #[test]
    fn test_proxy_defaults_to_http() {
        let proxy = params("10.0.0.5", "8080").build().unwrap().unwrap();
        assert_eq!(proxy.scheme(), "http");
        assert_eq!(proxy.server_url(), "http://10.0.0.5:8080");
        assert_eq!(proxy.endpoint(), "10.0.0.5:8080");
        assert!(proxy.credentials().is_none());
    }

    #[test]
    fn test_proxy_scheme_is_normalized() {
        let proxy = ProxyParams {
            scheme: Some("SOCKS5".into()),
            ..params("proxy.local", "1080")
        }
        .build()
        .unwrap()
        .unwrap();
        assert_eq!(proxy.server_url(), "socks5://proxy.local:1080");
    }

    #[test]
    fn test_proxy_rejects_bad_values() {
        assert!(matches!(
            params("10.0.0.5", "http").build(),
            Err(ResolveError::InvalidProxy(_))
        ));
        assert!(matches!(
            params("10.0.0.5", "0").build(),
            Err(ResolveError::InvalidProxy(_))
        ));
        assert!(matches!(
            params("10.0.0.5", "70000").build(),
            Err(ResolveError::InvalidProxy(_))
        ));
        assert!(matches!(
            params("user@10.0.0.5", "8080").build(),
            Err(ResolveError::InvalidProxy(_))
        ));
        let bad_scheme = ProxyParams {
            scheme: Some("gopher".into()),
            ..params("10.0.0.5", "8080")
        };
        assert!(matches!(bad_scheme.build(), Err(ResolveError::InvalidProxy(_))));
    }

    #[test]
    fn test_proxy_ipv6_host_is_bracketed() {
        for host in ["::1", "[::1]"] {
            let proxy = params(host, "8080").build().unwrap().unwrap();
            assert_eq!(proxy.server_url(), "http://[::1]:8080");
            assert_eq!(proxy.endpoint(), "[::1]:8080");
        }
    }

    #[test]
    fn test_proxy_rejects_malformed_ipv6() {
        for host in ["::zz", "fe80::1:", "[10.0.0.5]", "[::1"] {
            assert!(
                matches!(params(host, "8080").build(), Err(ResolveError::InvalidProxy(_))),
                "{host}"
            );
        }
    }

    #[test]
    fn test_proxy_credentials_need_both_halves() {
        let user_only = ProxyParams {
            username: Some("alice".into()),
            ..params("10.0.0.5", "8080")
        };
        assert!(user_only.build().unwrap().unwrap().credentials().is_none());

        let both = ProxyParams {
            username: Some("alice".into()),
            password: Some("hunter2".into()),
            ..params("10.0.0.5", "8080")
        };
        let proxy = both.build().unwrap().unwrap();
        let creds = proxy.credentials().unwrap();
        assert_eq!(creds.username, "alice");
        assert_eq!(creds.password, "hunter2");
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = ProxyCredentials {
            username: "alice".into(),
            password: "hunter2".into(),
        };
        let rendered = format!("{:?}", creds);
        assert!(rendered.contains("alice"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn test_chain_ignores_blank_and_empty() {
        let mut chain = RedirectChain::new("http://a.test/");
        assert!(!chain.record(""));
        assert!(!chain.record(BLANK_PAGE_URL));
        assert!(chain.record("http://b.test/"));
        assert_eq!(chain.finalize(), vec!["http://a.test/", "http://b.test/"]);
    }

    #[test]
    fn test_chain_finalize_dedups_in_first_seen_order() {
        let mut chain = RedirectChain::new("http://a.test/");
        for url in [
            "http://a.test/",
            "http://b.test/",
            "http://a.test/",
            "http://c.test/",
            "http://b.test/",
        ] {
            chain.record(url);
        }
        assert_eq!(
            chain.finalize(),
            vec!["http://a.test/", "http://b.test/", "http://c.test/"]
        );
    }
}
