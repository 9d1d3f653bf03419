// ABOUTME: Integration tests for the supervised analysis backend process
// ABOUTME: Covers spawn failures, early exit, port conflicts, startup timeout, shutdown, and readiness
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

#![cfg(unix)]
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use common::{init_test_logging, spawn_router, unused_port};
use nutriscore::backend::BackendProcess;
use nutriscore::config::{BackendConfig, ServerConfig};
use nutriscore::lifecycle::{ManagedService, ServiceManager, ServiceState};
use nutriscore::server::build_supervised_router;
use nutriscore::ErrorCode;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::RwLock;

fn backend(port: u16, command: &str, args: &[&str]) -> BackendConfig {
    let mut config = ServerConfig::default().backend;
    config.host = "127.0.0.1".into();
    config.port = port;
    config.spawn = true;
    config.command = command.to_owned();
    config.args = args.iter().map(|a| (*a).to_owned()).collect();
    config.startup_timeout_secs = 1;
    config.shutdown_timeout_secs = 2;
    config.health_poll_interval_ms = 50;
    config
}

#[tokio::test]
async fn test_missing_command_fails_to_start() {
    init_test_logging();
    let port = unused_port().await;
    let mut process = BackendProcess::new(backend(port, "/nonexistent/analysis-backend", &[]));

    let err = process.start().await.unwrap_err();
    assert_eq!(err.code, ErrorCode::BackendProcess);
    assert_eq!(process.state(), ServiceState::Failed);
    assert!(process.pid().is_none());
}

#[tokio::test]
async fn test_early_exit_is_reported() {
    init_test_logging();
    let port = unused_port().await;
    let mut process = BackendProcess::new(backend(port, "sh", &["-c", "exit 3"]));

    let err = process.start().await.unwrap_err();
    assert_eq!(err.code, ErrorCode::BackendProcess);
    assert!(err.message.contains("exited during startup"), "{}", err.message);
    assert_eq!(process.state(), ServiceState::Failed);
}

#[tokio::test]
async fn test_occupied_port_is_refused() {
    init_test_logging();
    let squatter = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = squatter.local_addr().unwrap().port();
    let mut process = BackendProcess::new(backend(port, "sleep", &["30"]));

    let err = process.start().await.unwrap_err();
    assert!(err.message.contains("already in use"), "{}", err.message);
    assert!(process.pid().is_none());
}

#[tokio::test]
async fn test_startup_timeout_kills_child() {
    init_test_logging();
    let port = unused_port().await;
    let mut process = BackendProcess::new(backend(port, "sleep", &["30"]));

    let err = process.start().await.unwrap_err();
    assert!(err.message.contains("did not accept connections"), "{}", err.message);
    assert_eq!(process.state(), ServiceState::Failed);
    assert!(process.pid().is_none());
}

#[tokio::test]
async fn test_start_health_and_shutdown() {
    init_test_logging();
    let port = unused_port().await;
    let mut config = backend(port, "sleep", &["30"]);
    config.startup_timeout_secs = 5;
    let mut process = BackendProcess::new(config);

    // Stand in for the backend opening its port a little after launch
    let listener = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        let listener = TcpListener::bind(("127.0.0.1", port)).await.unwrap();
        tokio::time::sleep(Duration::from_secs(10)).await;
        drop(listener);
    });

    process.start().await.unwrap();
    assert_eq!(process.state(), ServiceState::Running);
    assert!(process.pid().is_some());

    let health = process.health_check().await.unwrap();
    assert!(health.healthy);
    assert_eq!(health.name, "analysis-backend");

    process.shutdown().await.unwrap();
    assert_eq!(process.state(), ServiceState::Shutdown);
    assert!(process.pid().is_none());
    listener.abort();
}

#[tokio::test]
async fn test_manager_surfaces_backend_start_failure() {
    init_test_logging();
    let port = unused_port().await;
    let mut manager = ServiceManager::new(Duration::from_secs(5));
    manager.register(Box::new(BackendProcess::new(backend(
        port,
        "sh",
        &["-c", "exit 1"],
    ))));

    assert!(manager.start_all().await.is_err());
    assert!(!manager.is_healthy().await);
    manager.shutdown_all().await.unwrap();
}

#[tokio::test]
async fn test_readiness_follows_supervised_backend() {
    init_test_logging();
    let port = unused_port().await;
    let mut config = backend(port, "sleep", &["30"]);
    config.startup_timeout_secs = 5;

    // Something answers on the backend port, but no supervised process runs yet
    let stand_in = TcpListener::bind(("127.0.0.1", port)).await.unwrap();
    let mut manager = ServiceManager::new(Duration::from_secs(5));
    manager.register(Box::new(BackendProcess::new(config.clone())));
    let services = Arc::new(RwLock::new(manager));

    let site = tempfile::tempdir().unwrap();
    let mut server = ServerConfig::default();
    server.backend = config;
    server.http.static_dir = site.path().to_path_buf();
    let router = build_supervised_router(&server, Some(Arc::clone(&services))).unwrap();
    let (addr, _handle) = spawn_router(router).await;

    let response = reqwest::get(format!("http://{addr}/ready")).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["backend"]["reachable"], true);
    assert_eq!(body["services"][0]["name"], "analysis-backend");
    assert_eq!(body["services"][0]["healthy"], false);

    // Free the port so the supervised process can claim it
    drop(stand_in);
    let reopened = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        let listener = TcpListener::bind(("127.0.0.1", port)).await.unwrap();
        tokio::time::sleep(Duration::from_secs(10)).await;
        drop(listener);
    });
    services.write().await.start_all().await.unwrap();

    let response = reqwest::get(format!("http://{addr}/ready")).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["services"][0]["healthy"], true);

    services.write().await.shutdown_all().await.unwrap();
    reopened.abort();
}
