// ABOUTME: API route table sending everything under the API prefix through the reverse proxy
// ABOUTME: Applies the request body limit before bodies are streamed to the backend
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::proxy::{forward, ReverseProxy};
use axum::{routing::any, Router};
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;

/// Proxied API routes
pub struct ApiRoutes;

impl ApiRoutes {
    /// Route the prefix, the prefix with a trailing slash, and every path below it to the backend
    pub fn routes(proxy: Arc<ReverseProxy>, max_body_bytes: usize) -> Router {
        let prefix = proxy.api_prefix().to_owned();
        Router::new()
            .route(&prefix, any(forward))
            .route(&format!("{prefix}/"), any(forward))
            .route(&format!("{prefix}/*path"), any(forward))
            .layer(RequestBodyLimitLayer::new(max_body_bytes))
            .with_state(proxy)
    }
}
