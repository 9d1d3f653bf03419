// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides quiet logging, ephemeral-port servers, and analysis fixtures
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::unwrap_used,
    clippy::expect_used
)]
//! Shared test utilities for `nutriscore`

use axum::Router;
use nutriscore::config::{ClientConfig, ServerConfig};
use nutriscore::upload::ImageUpload;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Once;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        // Another test binary thread may have installed one already
        let _ = tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .try_init();
    });
}

/// Serve `router` on an ephemeral local port
pub async fn spawn_router(router: Router) -> (SocketAddr, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (addr, handle)
}

/// A local port with nothing listening on it
pub async fn unused_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

/// Client configuration for an API rooted at `api_base`
pub fn client_config(api_base: &str) -> ClientConfig {
    ClientConfig {
        api_base: api_base.to_owned(),
        timeout_secs: 1,
        connect_timeout_secs: 1,
        ..ClientConfig::default()
    }
}

/// Server configuration forwarding to a backend on `backend_port`
pub fn server_config(backend_port: u16, static_dir: &std::path::Path) -> ServerConfig {
    let mut config = ServerConfig::default();
    config.http.host = "127.0.0.1".into();
    config.http.port = 0;
    config.http.static_dir = static_dir.to_path_buf();
    config.backend.host = "127.0.0.1".into();
    config.backend.port = backend_port;
    config.proxy.timeout_secs = 5;
    config
}

/// JPEG upload whose bytes are plain ASCII so request bodies can be matched as text
pub fn jpeg_upload() -> ImageUpload {
    ImageUpload::new("lunch.jpg", "image/jpeg", b"fake-jpeg-payload".to_vec())
}

/// Analysis response for good 80, bad 20, net +15, rated Good
pub fn good_result_json() -> Value {
    json!({
        "goodScore": 80,
        "badScore": 20,
        "netScore": 15,
        "healthRating": "Good",
        "summary": {
            "overview": "Based on our analysis, your food has a good health rating.",
            "positiveElements": ["Contains fiber", "Good source of protein"],
            "areasForImprovement": ["Watch portion sizes"],
            "recommendation": "Keep it up."
        },
        "additivesPercentage": "2.1",
        "sodiumPercentage": "4.0",
        "extracted_text": "INGREDIENTS: OATS, HONEY"
    })
}
