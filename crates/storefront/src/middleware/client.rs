//! Client network details behind Cloudflare and Fly.io.

use std::convert::Infallible;
use std::net::IpAddr;

use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, header, request::Parts};

use crate::models::LoginContext;

/// Longest user agent kept on the user row.
const MAX_DEVICE_LENGTH: usize = 255;

/// Real client IP from proxy headers.
///
/// Checks Cloudflare's `CF-Connecting-IP` first, then the first hop of
/// `X-Forwarded-For`, then `X-Real-IP`, then Fly.io's `Fly-Client-IP`.
#[must_use]
pub fn client_ip(headers: &HeaderMap) -> Option<IpAddr> {
    let header_str = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

    header_str("cf-connecting-ip")
        .and_then(|s| s.trim().parse().ok())
        .or_else(|| {
            header_str("x-forwarded-for")
                .and_then(|s| s.split(',').next())
                .and_then(|s| s.trim().parse().ok())
        })
        .or_else(|| header_str("x-real-ip").and_then(|s| s.trim().parse().ok()))
        .or_else(|| header_str("fly-client-ip").and_then(|s| s.trim().parse().ok()))
}

/// Login tracking details pulled from request headers.
#[derive(Debug, Clone, Default)]
pub struct ClientInfo(pub LoginContext);

impl ClientInfo {
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let device = headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(|ua| ua.chars().take(MAX_DEVICE_LENGTH).collect());
        // Cloudflare sends XX for unknown and T1 for Tor.
        let country = headers
            .get("cf-ipcountry")
            .and_then(|v| v.to_str().ok())
            .filter(|c| c.len() == 2 && *c != "XX")
            .map(str::to_owned);

        Self(LoginContext {
            ip: client_ip(headers).map(|ip| ip.to_string()),
            device,
            country,
        })
    }
}

impl<S> FromRequestParts<S> for ClientInfo
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn test_cloudflare_header_wins() {
        let h = headers(&[
            ("cf-connecting-ip", "203.0.113.7"),
            ("x-forwarded-for", "198.51.100.1"),
        ]);
        assert_eq!(client_ip(&h), Some("203.0.113.7".parse().unwrap()));
    }

    #[test]
    fn test_forwarded_for_first_hop() {
        let h = headers(&[("x-forwarded-for", "198.51.100.1, 10.0.0.1")]);
        assert_eq!(client_ip(&h), Some("198.51.100.1".parse().unwrap()));
    }

    #[test]
    fn test_no_ip_headers() {
        assert_eq!(client_ip(&HeaderMap::new()), None);
    }

    #[test]
    fn test_client_info() {
        let h = headers(&[
            ("fly-client-ip", "2001:db8::1"),
            ("user-agent", "ModvaultLauncher/2.1"),
            ("cf-ipcountry", "NZ"),
        ]);
        let ClientInfo(ctx) = ClientInfo::from_headers(&h);
        assert_eq!(ctx.ip.as_deref(), Some("2001:db8::1"));
        assert_eq!(ctx.device.as_deref(), Some("ModvaultLauncher/2.1"));
        assert_eq!(ctx.country.as_deref(), Some("NZ"));
    }

    #[test]
    fn test_unknown_country_dropped() {
        let ClientInfo(ctx) = ClientInfo::from_headers(&headers(&[("cf-ipcountry", "XX")]));
        assert_eq!(ctx.country, None);
    }
}
