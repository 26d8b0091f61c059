//! Client identification utilities
//!
//! Helpers for identifying the caller of a request and the credential it sent.

use axum::http::HeaderMap;
use std::net::IpAddr;

/// Header carrying the API token when it is not passed as a query parameter
pub const API_TOKEN_HEADER: &str = "x-api-token";

/// Identity used when the transport did not report a peer address
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Rate-limit identity for a caller
///
/// This is the peer address as seen by this process. Forwarding headers are
/// not consulted; a fronting proxy is expected to be handled by the layer
/// that supplies the address.
pub fn client_identity(peer_ip: Option<IpAddr>) -> String {
    peer_ip
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

/// Extract the API token from a request
///
/// A non-empty `token` query parameter wins; otherwise the
/// `x-api-token` header is used.
///
/// ## Arguments
/// * `query_token` - Value of the `token` query parameter, if any
/// * `headers` - HTTP request headers
pub fn extract_api_token(query_token: Option<&str>, headers: &HeaderMap) -> Option<String> {
    if let Some(token) = query_token.filter(|t| !t.is_empty()) {
        return Some(token.to_string());
    }
    headers
        .get(API_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_client_identity_from_peer() {
        let ip: IpAddr = "203.0.113.7".parse().unwrap();
        assert_eq!(client_identity(Some(ip)), "203.0.113.7");
    }

    #[test]
    fn test_client_identity_unknown() {
        assert_eq!(client_identity(None), UNKNOWN_CLIENT);
    }

    #[test]
    fn test_query_token_wins() {
        let mut headers = HeaderMap::new();
        headers.insert(API_TOKEN_HEADER, HeaderValue::from_static("from-header"));

        let token = extract_api_token(Some("from-query"), &headers);
        assert_eq!(token.as_deref(), Some("from-query"));
    }

    #[test]
    fn test_header_token_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert(API_TOKEN_HEADER, HeaderValue::from_static("from-header"));

        assert_eq!(
            extract_api_token(None, &headers).as_deref(),
            Some("from-header")
        );
        assert_eq!(
            extract_api_token(Some(""), &headers).as_deref(),
            Some("from-header")
        );
    }

    #[test]
    fn test_no_token() {
        assert!(extract_api_token(None, &HeaderMap::new()).is_none());
    }
}
