// ABOUTME: CORS middleware configuration for the proxied API and static front end
// ABOUTME: Provides Cross-Origin Resource Sharing setup for browser clients on other origins
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use crate::config::HttpConfig;
use http::{header::HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Configure CORS from `CORS_ALLOWED_ORIGINS`
///
/// `*` or an empty value allows any origin; otherwise the value is a
/// comma-separated origin list.
///
/// ```bash
/// export CORS_ALLOWED_ORIGINS="https://nutriscore.example.com"
/// ```
pub fn setup_cors(config: &HttpConfig) -> CorsLayer {
    let allow_origin = parse_origins(&config.cors_allowed_origins)
        .map_or_else(AllowOrigin::any, AllowOrigin::list);

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_headers([
            HeaderName::from_static("content-type"),
            HeaderName::from_static("accept"),
            HeaderName::from_static("origin"),
            HeaderName::from_static("x-requested-with"),
            HeaderName::from_static("x-request-id"),
        ])
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
}

/// Explicit origins, or `None` for "any"
fn parse_origins(raw: &str) -> Option<Vec<HeaderValue>> {
    if raw.trim().is_empty() || raw.trim() == "*" {
        return None;
    }
    let origins: Vec<HeaderValue> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| HeaderValue::from_str(s).ok())
        .collect();
    if origins.is_empty() {
        None
    } else {
        Some(origins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_origins() {
        assert!(parse_origins("*").is_none());
        assert!(parse_origins("  ").is_none());
        let origins = parse_origins("https://a.example, https://b.example,").unwrap();
        assert_eq!(origins.len(), 2);
        assert_eq!(origins[1], "https://b.example");
    }
}
