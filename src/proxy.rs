// ABOUTME: Pass-through reverse proxy relaying API traffic to the local analysis process
// ABOUTME: Streams bodies in both directions and turns forwarding failures into 502 responses
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Reverse proxy
//!
//! Requests under the API prefix are replayed against the backend with the
//! same method, path (prefix included), query, headers, and body. Bodies are
//! streamed, never buffered, so multipart uploads arrive byte for byte.

use crate::config::{BackendConfig, ProxyConfig};
use crate::logging::AppLogger;
use axum::body::Body;
use axum::extract::{Request, State};
use axum::response::{IntoResponse, Response};
use futures_util::TryStreamExt;
use http::header::{self, HeaderMap, HeaderName};
use http::Uri;
use http_body_util::LengthLimitError;
use nutriscore_core::{AppError, AppResult};
use std::error::Error as StdError;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Whether a header describes a single connection and must not cross the proxy
#[must_use]
pub fn is_hop_by_hop(name: &HeaderName) -> bool {
    matches!(
        name.as_str(),
        "connection"
            | "keep-alive"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "te"
            | "trailer"
            | "transfer-encoding"
            | "upgrade"
    )
}

/// Copy forwardable headers, optionally dropping `Host`
fn filter_headers(source: &HeaderMap, drop_host: bool) -> HeaderMap {
    let mut filtered = HeaderMap::with_capacity(source.len());
    for (name, value) in source {
        if is_hop_by_hop(name) || (drop_host && name == header::HOST) {
            continue;
        }
        filtered.append(name.clone(), value.clone());
    }
    filtered
}

/// Why the inbound body stopped before the backend had it all
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyFailure {
    TooLarge,
    Unreadable,
}

/// Whether `error` or any of its sources is a body length limit violation
fn exceeds_body_limit(error: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(error);
    while let Some(e) = current {
        if e.is::<LengthLimitError>() {
            return true;
        }
        current = e.source();
    }
    false
}

/// Forwards requests to the analysis backend
#[derive(Debug, Clone)]
pub struct ReverseProxy {
    client: reqwest::Client,
    backend_base: String,
    api_prefix: String,
    max_body_bytes: usize,
}

impl ReverseProxy {
    /// Create a proxy for the configured backend
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built
    pub fn new(backend: &BackendConfig, proxy: &ProxyConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(proxy.timeout_secs))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build proxy client: {e}")))?;
        Ok(Self {
            client,
            backend_base: backend.base_url(),
            api_prefix: proxy.api_prefix.clone(),
            max_body_bytes: proxy.max_body_bytes,
        })
    }

    /// Path prefix this proxy answers for
    #[must_use]
    pub fn api_prefix(&self) -> &str {
        &self.api_prefix
    }

    /// Backend URL for an inbound URI; the prefix stays in the path
    #[must_use]
    pub fn target_url(&self, uri: &Uri) -> String {
        let path_and_query = uri.path_and_query().map_or("/", |pq| pq.as_str());
        format!("{}{path_and_query}", self.backend_base)
    }

    /// Replay `request` against the backend and relay its response
    ///
    /// # Errors
    ///
    /// Returns `PayloadTooLarge` when the inbound body outgrows the limit
    /// while streaming, `InvalidInput` when it cannot be read, and
    /// `ProxyUnavailable` when the backend cannot be reached or the exchange
    /// fails before response headers arrive
    pub async fn forward(&self, request: Request) -> AppResult<Response> {
        let started = Instant::now();
        let (parts, body) = request.into_parts();
        let target = self.target_url(&parts.uri);
        let method = parts.method.clone();
        debug!(method = %method, upstream = %target, "Forwarding request");

        let body_failure = Arc::new(OnceLock::new());
        let inbound = {
            let body_failure = Arc::clone(&body_failure);
            body.into_data_stream().inspect_err(move |e| {
                let failure = if exceeds_body_limit(e) {
                    BodyFailure::TooLarge
                } else {
                    BodyFailure::Unreadable
                };
                let _ = body_failure.set(failure);
            })
        };

        let upstream = self
            .client
            .request(parts.method, &target)
            .headers(filter_headers(&parts.headers, true))
            .body(reqwest::Body::wrap_stream(inbound))
            .send()
            .await
            .map_err(|e| match body_failure.get() {
                Some(BodyFailure::TooLarge) => {
                    warn!(
                        upstream = %target,
                        limit = self.max_body_bytes,
                        "Request body over limit"
                    );
                    AppError::payload_too_large(self.max_body_bytes)
                }
                Some(BodyFailure::Unreadable) => {
                    warn!(upstream = %target, error = %e, "Request body could not be read");
                    AppError::invalid_input("Request body could not be read").with_source(e)
                }
                None => {
                    warn!(upstream = %target, error = %e, "Backend request failed");
                    AppError::proxy_unavailable(format!("Analysis backend unreachable: {e}"))
                        .with_source(e)
                }
            })?;

        let status = upstream.status();
        let headers = filter_headers(upstream.headers(), false);

        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        AppLogger::log_proxy_request(method.as_str(), parts.uri.path(), status.as_u16(), elapsed_ms);

        let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        Ok(response)
    }
}

/// Axum handler for every request under the API prefix
pub async fn forward(State(proxy): State<Arc<ReverseProxy>>, request: Request) -> Response {
    match proxy.forward(request).await {
        Ok(response) => response,
        Err(e) => e.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    fn proxy() -> ReverseProxy {
        let config = crate::config::ServerConfig::default();
        ReverseProxy::new(&config.backend, &config.proxy).unwrap()
    }

    #[test]
    fn test_target_keeps_prefix_and_query() {
        let uri: Uri = "/api/analyze?lang=en".parse().unwrap();
        assert_eq!(proxy().target_url(&uri), "http://127.0.0.1:8000/api/analyze?lang=en");
    }

    #[test]
    fn test_filter_drops_host_and_hop_by_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("example.com"));
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert("keep-alive", HeaderValue::from_static("timeout=5"));
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("multipart/form-data"));
        headers.insert("x-request-id", HeaderValue::from_static("abc"));

        let filtered = filter_headers(&headers, true);
        assert!(filtered.get(header::HOST).is_none());
        assert!(filtered.get(header::CONNECTION).is_none());
        assert!(filtered.get("keep-alive").is_none());
        assert_eq!(filtered.get("x-request-id").unwrap(), "abc");
        assert!(filtered.get(header::CONTENT_TYPE).is_some());

        assert!(filter_headers(&headers, false).get(header::HOST).is_some());
    }

    #[tokio::test]
    async fn test_limit_error_found_through_wrappers() {
        use http_body_util::{BodyExt, Full, Limited};

        let limited = Limited::new(Full::new(bytes::Bytes::from(vec![0_u8; 32])), 16);
        let Err(limit_error) = limited.collect().await else {
            panic!("body over the limit was collected");
        };
        let wrapped = axum::Error::new(limit_error);
        assert!(exceeds_body_limit(&wrapped));

        let other = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "client went away");
        assert!(!exceeds_body_limit(&other));
    }
}
