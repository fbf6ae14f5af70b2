//! Client identification utilities
//!
//! Extracts the request origin (IP) and device descriptor (User-Agent) used
//! for audit rows and rate-limit keys.

use axum::http::{HeaderMap, header};
use std::net::IpAddr;

/// Client information captured per request.
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    /// Origin address (from X-Forwarded-For or the direct connection)
    pub ip: Option<IpAddr>,
    /// Device descriptor (User-Agent header)
    pub user_agent: Option<String>,
}

impl ClientInfo {
    /// Origin as a string; "unknown" when no address could be determined.
    ///
    /// Used as the rate-limit key, so it must never be empty.
    pub fn origin(&self) -> String {
        self.ip
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }

    /// IP as a string for storage.
    pub fn ip_string(&self) -> Option<String> {
        self.ip.map(|ip| ip.to_string())
    }
}

/// Extract client info from request headers and the connection address.
pub fn extract_client_info(headers: &HeaderMap, direct_ip: Option<IpAddr>) -> ClientInfo {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    ClientInfo {
        ip: extract_client_ip(headers, direct_ip),
        user_agent,
    }
}

/// Extract the client IP, preferring X-Forwarded-For (first hop) behind a
/// reverse proxy.
pub fn extract_client_ip(headers: &HeaderMap, direct_ip: Option<IpAddr>) -> Option<IpAddr> {
    if let Some(xff) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first_ip) = xff.split(',').next() {
            if let Ok(ip) = first_ip.trim().parse::<IpAddr>() {
                return Some(ip);
            }
        }
    }
    direct_ip
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_extract_client_info() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            HeaderValue::from_static("Mozilla/5.0 Test Browser"),
        );

        let info = extract_client_info(&headers, Some("127.0.0.1".parse().unwrap()));
        assert_eq!(info.user_agent.as_deref(), Some("Mozilla/5.0 Test Browser"));
        assert_eq!(info.origin(), "127.0.0.1");
    }

    #[test]
    fn test_xff_takes_precedence() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("192.168.1.1, 10.0.0.1"),
        );

        let ip = extract_client_ip(&headers, Some("127.0.0.1".parse().unwrap()));
        assert_eq!(ip, Some("192.168.1.1".parse().unwrap()));
    }

    #[test]
    fn test_origin_never_empty() {
        let info = ClientInfo::default();
        assert_eq!(info.origin(), "unknown");
    }
}
