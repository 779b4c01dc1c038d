use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use std::convert::Infallible;

use crate::state::AppState;

/// Scheme and authority the client used to reach us, for absolute file URLs.
///
/// Honours `X-Forwarded-Proto`/`X-Forwarded-Host` from a proxy, then `Host`,
/// then `PUBLIC_BASE_URL`. `None` when none of them is usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseUrl(pub Option<String>);

impl BaseUrl {
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        // Proxies may append: take the first hop.
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn is_valid_host(host: &str) -> bool {
    host.chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | ':' | '[' | ']'))
}

pub fn base_url_from_headers(headers: &HeaderMap, fallback: Option<&str>) -> Option<String> {
    let host = header(headers, "x-forwarded-host")
        .or_else(|| header(headers, "host"))
        .filter(|host| is_valid_host(host));

    match host {
        Some(host) => {
            let scheme = match header(headers, "x-forwarded-proto") {
                Some("https") => "https",
                _ => "http",
            };
            Some(format!("{scheme}://{host}"))
        }
        None => fallback.map(String::from),
    }
}

#[async_trait]
impl FromRequestParts<AppState> for BaseUrl {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(BaseUrl(base_url_from_headers(
            &parts.headers,
            state.config.public_base_url.as_deref(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn test_host_header() {
        assert_eq!(
            base_url_from_headers(&headers(&[("host", "hr.example.com:8080")]), None).as_deref(),
            Some("http://hr.example.com:8080")
        );
    }

    #[test]
    fn test_forwarded_headers_win() {
        let map = headers(&[
            ("host", "10.0.0.5:8080"),
            ("x-forwarded-host", "hr.example.com, proxy.internal"),
            ("x-forwarded-proto", "https"),
        ]);
        assert_eq!(
            base_url_from_headers(&map, None).as_deref(),
            Some("https://hr.example.com")
        );
    }

    #[test]
    fn test_fallback_when_host_missing_or_invalid() {
        assert_eq!(
            base_url_from_headers(&HeaderMap::new(), Some("https://cv.example.org")).as_deref(),
            Some("https://cv.example.org")
        );
        assert_eq!(
            base_url_from_headers(&headers(&[("host", "evil.com/<script>")]), None),
            None
        );
    }
}
