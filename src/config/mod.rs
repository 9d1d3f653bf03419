// ABOUTME: Configuration management module for centralized server settings
// ABOUTME: Re-exports the environment-driven server, proxy, backend, and client configuration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Configuration module
//!
//! - **Environment**: Server configuration from environment variables

/// Environment and server configuration
pub mod environment;

pub use environment::{
    BackendConfig, ClientConfig, Environment, HttpConfig, LogLevel, ProxyConfig, ServerConfig,
};
