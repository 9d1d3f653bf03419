// ABOUTME: Unit tests for environment-driven server configuration
// ABOUTME: Validates defaults, overrides, parsing failures, and cross-field validation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use nutriscore::config::environment::{defaults, Environment, LogLevel, ServerConfig};
use serial_test::serial;
use std::env;

const MANAGED_VARS: &[&str] = &[
    "ENVIRONMENT",
    "HOST",
    "PORT",
    "STATIC_DIR",
    "API_PREFIX",
    "BACKEND_HOST",
    "BACKEND_PORT",
    "BACKEND_SPAWN",
    "BACKEND_COMMAND",
    "BACKEND_ARGS",
    "BACKEND_WORKING_DIR",
    "PROXY_TIMEOUT_SECS",
    "PROXY_MAX_BODY_BYTES",
    "ANALYSIS_API_BASE",
    "ANALYSIS_TIMEOUT_SECS",
    "MAX_UPLOAD_BYTES",
];

fn clear_env() {
    for key in MANAGED_VARS {
        env::remove_var(key);
    }
}

#[test]
fn test_log_level_parsing() {
    assert_eq!(LogLevel::from_str_or_default("WARN"), LogLevel::Warn);
    assert_eq!(LogLevel::from_str_or_default("Debug"), LogLevel::Debug);
    assert_eq!(LogLevel::from_str_or_default("invalid"), LogLevel::Info);
}

#[test]
fn test_environment_parsing() {
    assert_eq!(Environment::from_str_or_default("PROD"), Environment::Production);
    assert_eq!(Environment::from_str_or_default("test"), Environment::Testing);
    assert_eq!(Environment::from_str_or_default("other"), Environment::Development);
    assert!(Environment::Production.is_production());
}

#[test]
#[serial]
fn test_defaults_when_unset() {
    clear_env();
    let config = ServerConfig::from_env().unwrap();

    assert_eq!(config.http.port, defaults::PORT);
    assert_eq!(config.proxy.api_prefix, "/api");
    assert_eq!(config.backend.base_url(), "http://127.0.0.1:8000");
    assert!(!config.backend.spawn);
    assert_eq!(config.backend.args, vec!["server/app.py"]);
    assert_eq!(config.client.analyze_url(), "http://127.0.0.1:5000/api/analyze");
}

#[test]
#[serial]
fn test_overrides_are_applied() {
    clear_env();
    env::set_var("PORT", "8080");
    env::set_var("API_PREFIX", "v1/");
    env::set_var("BACKEND_PORT", "9001");
    env::set_var("BACKEND_SPAWN", "true");
    env::set_var("BACKEND_ARGS", "-m uvicorn app:app");
    env::set_var("ANALYSIS_API_BASE", "http://analysis.local/api/");

    let config = ServerConfig::from_env().unwrap();
    clear_env();

    assert_eq!(config.http.port, 8080);
    assert_eq!(config.proxy.api_prefix, "/v1");
    assert_eq!(config.backend.port, 9001);
    assert!(config.backend.spawn);
    assert_eq!(config.backend.args, vec!["-m", "uvicorn", "app:app"]);
    assert_eq!(config.client.analyze_url(), "http://analysis.local/api/analyze");
}

#[test]
#[serial]
fn test_invalid_port_is_an_error() {
    clear_env();
    env::set_var("PORT", "not-a-port");
    let err = ServerConfig::from_env().unwrap_err();
    clear_env();
    assert!(err.to_string().contains("PORT"), "{err}");
}

#[test]
#[serial]
fn test_proxy_to_itself_is_rejected() {
    clear_env();
    env::set_var("PORT", "8000");
    env::set_var("BACKEND_PORT", "8000");
    let err = ServerConfig::from_env().unwrap_err();
    clear_env();
    assert!(err.to_string().contains("cannot be the same"), "{err}");
}

#[test]
fn test_upload_limit_must_fit_proxy_limit() {
    let mut config = ServerConfig::default();
    config.client.max_upload_bytes = config.proxy.max_body_bytes + 1;
    assert!(config.validate().is_err());
}

#[test]
fn test_invalid_api_base_is_rejected() {
    let mut config = ServerConfig::default();
    config.client.api_base = "not a url".into();
    assert!(config.validate().is_err());
}
