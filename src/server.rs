// ABOUTME: HTTP server assembly hosting the front end and proxying the analysis API
// ABOUTME: Builds the router and middleware stack, supervises the backend, and shuts down gracefully
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Server assembly
//!
//! One listener serves three things: `/health` and `/ready`, everything under
//! the API prefix through the reverse proxy, and the single-page app for every
//! other path.

use crate::backend::BackendProcess;
use crate::config::ServerConfig;
use crate::lifecycle::{ServiceManager, SharedServiceManager};
use crate::middleware::{create_request_span, setup_cors, MakeRequestUuid};
use crate::proxy::ReverseProxy;
use crate::routes::{spa_service, ApiRoutes, HealthRoutes};
use anyhow::{Context, Result};
use axum::Router;
use nutriscore_core::AppResult;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Extra time the service manager allows beyond the backend's own startup timeout
const START_GRACE: Duration = Duration::from_secs(5);

/// Build the complete router for `config` against an externally managed backend
///
/// # Errors
///
/// Returns an error if the proxy client cannot be created
pub fn build_router(config: &ServerConfig) -> AppResult<Router> {
    build_supervised_router(config, None)
}

/// Build the complete router, with readiness also gated on `services`
///
/// # Errors
///
/// Returns an error if the proxy client cannot be created
pub fn build_supervised_router(
    config: &ServerConfig,
    services: Option<SharedServiceManager>,
) -> AppResult<Router> {
    let proxy = Arc::new(ReverseProxy::new(&config.backend, &config.proxy)?);

    let router = Router::new()
        .merge(HealthRoutes::routes(config.backend.socket_addr(), services))
        .merge(ApiRoutes::routes(proxy, config.proxy.max_body_bytes))
        .fallback_service(spa_service(&config.http.static_dir))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http().make_span_with(create_request_span))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(setup_cors(&config.http)),
        );

    Ok(router)
}

/// Serve `router` on `listener` until `shutdown` resolves
///
/// # Errors
///
/// Returns an error if the accept loop fails
pub async fn serve<F>(listener: TcpListener, router: Router, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
}

/// Run the server until Ctrl+C or SIGTERM
///
/// Starts the supervised backend first when `BACKEND_SPAWN` is set and stops
/// it after the listener has drained.
///
/// # Errors
///
/// Returns an error if the backend fails to start, the listener cannot bind,
/// or the server loop fails
pub async fn run(config: ServerConfig) -> Result<()> {
    info!("{}", config.summary());

    let mut services = ServiceManager::new(config.backend.startup_timeout() + START_GRACE);
    if config.backend.spawn {
        services.register(Box::new(BackendProcess::new(config.backend.clone())));
    } else {
        info!(
            backend = %config.backend.base_url(),
            "Using externally managed analysis backend"
        );
    }
    services
        .start_all()
        .await
        .context("Failed to start analysis backend")?;

    let services: SharedServiceManager = Arc::new(RwLock::new(services));
    let supervised = config.backend.spawn.then(|| Arc::clone(&services));
    let served = bind_and_serve(&config, supervised).await;

    if let Err(e) = services.write().await.shutdown_all().await {
        warn!("Service shutdown incomplete: {e}");
    }
    served
}

async fn bind_and_serve(
    config: &ServerConfig,
    services: Option<SharedServiceManager>,
) -> Result<()> {
    let router = build_supervised_router(config, services)?;
    let addr = format!("{}:{}", config.http.host, config.http.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("NutriScore server listening on http://{addr}");

    serve(listener, router, shutdown_signal())
        .await
        .context("HTTP server failed")?;
    info!("Server shut down");
    Ok(())
}

/// Resolves on Ctrl+C or, on Unix, SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
