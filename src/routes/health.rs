// ABOUTME: Health check route handlers for service monitoring and status endpoints
// ABOUTME: Provides liveness and readiness endpoints, readiness checks the analysis backend
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Health check routes for service monitoring
//!
//! `/health` answers as long as the listener runs. `/ready` also requires the
//! analysis backend to accept connections, since every analysis goes there.
//! When the server supervises the backend process, every required managed
//! service must report healthy as well.

use crate::backend;
use crate::lifecycle::SharedServiceManager;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use nutriscore_core::constants::service_names;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const READY_CHECK_TIMEOUT: Duration = Duration::from_secs(2);

struct HealthState {
    backend_addr: String,
    services: Option<SharedServiceManager>,
}

/// Health routes implementation
pub struct HealthRoutes;

impl HealthRoutes {
    /// Create all health check routes
    ///
    /// `services` is the supervisor of spawned processes, if any.
    pub fn routes(backend_addr: String, services: Option<SharedServiceManager>) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .route("/ready", get(ready_handler))
            .with_state(Arc::new(HealthState {
                backend_addr,
                services,
            }))
    }
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": service_names::NUTRISCORE_SERVER,
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn ready_handler(
    State(state): State<Arc<HealthState>>,
) -> (StatusCode, Json<serde_json::Value>) {
    let reachable = backend::accepts_connections(&state.backend_addr, READY_CHECK_TIMEOUT).await;
    let (services_healthy, services) = match &state.services {
        Some(manager) => manager.read().await.health_report().await,
        None => (true, Vec::new()),
    };
    let ready = reachable && services_healthy;
    if !ready {
        debug!(reachable, services_healthy, "Readiness check failed");
    }

    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status,
        Json(serde_json::json!({
            "status": if ready { "ready" } else { "not_ready" },
            "backend": {
                "address": state.backend_addr,
                "reachable": reachable
            },
            "services": services,
            "timestamp": chrono::Utc::now().to_rfc3339()
        })),
    )
}
