// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Handles environment variables, proxy/backend/client settings, and validation
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Environment-based configuration management
//!
//! Configuration is read from environment variables only. Each concern gets
//! its own section struct so components can be handed exactly the settings
//! they use.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;
use url::Url;

/// Default values for every environment variable
pub mod defaults {
    /// Listener host
    pub const HOST: &str = "0.0.0.0";
    /// Listener port
    pub const PORT: u16 = 5000;
    /// Directory holding the built single-page app
    pub const STATIC_DIR: &str = "dist/public";
    /// Path prefix forwarded to the analysis backend
    pub const API_PREFIX: &str = "/api";
    /// Analysis backend host
    pub const BACKEND_HOST: &str = "127.0.0.1";
    /// Analysis backend port
    pub const BACKEND_PORT: u16 = 8000;
    /// Command used to start the analysis backend
    pub const BACKEND_COMMAND: &str = "python3";
    /// Arguments passed to the backend command
    pub const BACKEND_ARGS: &str = "server/app.py";
    /// Seconds to wait for the backend to accept connections
    pub const BACKEND_STARTUP_TIMEOUT_SECS: u64 = 30;
    /// Seconds to wait for the backend to exit after a kill
    pub const BACKEND_SHUTDOWN_TIMEOUT_SECS: u64 = 5;
    /// Milliseconds between backend readiness checks
    pub const BACKEND_HEALTH_POLL_MS: u64 = 250;
    /// Seconds before a proxied request is abandoned
    pub const PROXY_TIMEOUT_SECS: u64 = 120;
    /// Largest request body the proxy accepts
    pub const PROXY_MAX_BODY_BYTES: usize = 16 * 1024 * 1024;
    /// Origins allowed by CORS, `*` for any
    pub const CORS_ALLOWED_ORIGINS: &str = "*";
    /// Base URL of the analysis API as seen by clients
    pub const ANALYSIS_API_BASE: &str = "http://127.0.0.1:5000/api";
    /// Seconds before an analysis request fails
    pub const ANALYSIS_TIMEOUT_SECS: u64 = 45;
    /// Seconds allowed for connecting to the analysis API
    pub const ANALYSIS_CONNECT_TIMEOUT_SECS: u64 = 10;
}

/// Strongly typed log level configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Errors only
    Error,
    /// Warnings and errors
    Warn,
    /// Informational messages
    #[default]
    Info,
    /// Debug output
    Debug,
    /// Everything
    Trace,
}

impl LogLevel {
    /// Convert to `tracing::Level`
    #[must_use]
    pub const fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Error => tracing::Level::ERROR,
            Self::Warn => tracing::Level::WARN,
            Self::Info => tracing::Level::INFO,
            Self::Debug => tracing::Level::DEBUG,
            Self::Trace => tracing::Level::TRACE,
        }
    }

    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "error" => Self::Error,
            "warn" => Self::Warn,
            "debug" => Self::Debug,
            "trace" => Self::Trace,
            _ => Self::Info,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        };
        f.write_str(name)
    }
}

/// Deployment environment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development
    #[default]
    Development,
    /// Production deployment
    Production,
    /// Automated tests
    Testing,
}

impl Environment {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }

    /// Check if this is a production environment
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => f.write_str("development"),
            Self::Production => f.write_str("production"),
            Self::Testing => f.write_str("testing"),
        }
    }
}

/// HTTP listener and static hosting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Interface to bind
    pub host: String,
    /// Port to bind
    pub port: u16,
    /// Directory with the built single-page app
    pub static_dir: PathBuf,
    /// Comma-separated CORS origins, `*` for any
    pub cors_allowed_origins: String,
}

/// Reverse proxy settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Path prefix routed to the backend; kept in the forwarded path
    pub api_prefix: String,
    /// Seconds before a proxied request is abandoned
    pub timeout_secs: u64,
    /// Largest request body forwarded to the backend
    pub max_body_bytes: usize,
}

/// Analysis backend process
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Host the backend listens on
    pub host: String,
    /// Port the backend listens on
    pub port: u16,
    /// Whether this server starts and owns the backend process
    pub spawn: bool,
    /// Executable to start
    pub command: String,
    /// Arguments for the executable
    pub args: Vec<String>,
    /// Working directory for the process, defaults to the current one
    pub working_dir: Option<PathBuf>,
    /// Seconds to wait for the backend port to accept connections
    pub startup_timeout_secs: u64,
    /// Seconds to wait for the process to exit after a kill
    pub shutdown_timeout_secs: u64,
    /// Milliseconds between readiness checks
    pub health_poll_interval_ms: u64,
}

impl BackendConfig {
    /// Base URL of the backend, without trailing slash
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// `host:port` pair for TCP connection checks
    #[must_use]
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Startup timeout as a duration
    #[must_use]
    pub const fn startup_timeout(&self) -> Duration {
        Duration::from_secs(self.startup_timeout_secs)
    }

    /// Shutdown timeout as a duration
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    /// Readiness check interval as a duration
    #[must_use]
    pub const fn health_poll_interval(&self) -> Duration {
        Duration::from_millis(self.health_poll_interval_ms)
    }
}

/// Upload client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the analysis API, `/analyze` is appended
    pub api_base: String,
    /// Seconds before an analysis request fails
    pub timeout_secs: u64,
    /// Seconds allowed for connecting
    pub connect_timeout_secs: u64,
    /// Largest accepted upload in bytes
    pub max_upload_bytes: usize,
}

impl ClientConfig {
    /// Full URL of the analysis endpoint
    #[must_use]
    pub fn analyze_url(&self) -> String {
        format!("{}/analyze", self.api_base.trim_end_matches('/'))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: defaults::ANALYSIS_API_BASE.to_owned(),
            timeout_secs: defaults::ANALYSIS_TIMEOUT_SECS,
            connect_timeout_secs: defaults::ANALYSIS_CONNECT_TIMEOUT_SECS,
            max_upload_bytes: nutriscore_core::constants::upload::DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// Complete server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Deployment environment
    pub environment: Environment,
    /// Log level
    pub log_level: LogLevel,
    /// Listener and static hosting
    pub http: HttpConfig,
    /// Reverse proxy
    pub proxy: ProxyConfig,
    /// Analysis backend
    pub backend: BackendConfig,
    /// Upload client
    pub client: ClientConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            log_level: LogLevel::default(),
            http: HttpConfig {
                host: defaults::HOST.to_owned(),
                port: defaults::PORT,
                static_dir: PathBuf::from(defaults::STATIC_DIR),
                cors_allowed_origins: defaults::CORS_ALLOWED_ORIGINS.to_owned(),
            },
            proxy: ProxyConfig {
                api_prefix: defaults::API_PREFIX.to_owned(),
                timeout_secs: defaults::PROXY_TIMEOUT_SECS,
                max_body_bytes: defaults::PROXY_MAX_BODY_BYTES,
            },
            backend: BackendConfig {
                host: defaults::BACKEND_HOST.to_owned(),
                port: defaults::BACKEND_PORT,
                spawn: false,
                command: defaults::BACKEND_COMMAND.to_owned(),
                args: parse_args(defaults::BACKEND_ARGS),
                working_dir: None,
                startup_timeout_secs: defaults::BACKEND_STARTUP_TIMEOUT_SECS,
                shutdown_timeout_secs: defaults::BACKEND_SHUTDOWN_TIMEOUT_SECS,
                health_poll_interval_ms: defaults::BACKEND_HEALTH_POLL_MS,
            },
            client: ClientConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a variable holds an unparsable value or the
    /// resulting configuration fails validation
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");

        let config = Self {
            environment: Environment::from_str_or_default(&env_var_or(
                "ENVIRONMENT",
                "development",
            )),
            log_level: LogLevel::from_str_or_default(&env_var_or("RUST_LOG", "info")),
            http: HttpConfig {
                host: env_var_or("HOST", defaults::HOST),
                port: parse_env("PORT", defaults::PORT)?,
                static_dir: PathBuf::from(env_var_or("STATIC_DIR", defaults::STATIC_DIR)),
                cors_allowed_origins: env_var_or(
                    "CORS_ALLOWED_ORIGINS",
                    defaults::CORS_ALLOWED_ORIGINS,
                ),
            },
            proxy: ProxyConfig {
                api_prefix: normalize_prefix(&env_var_or("API_PREFIX", defaults::API_PREFIX)),
                timeout_secs: parse_env("PROXY_TIMEOUT_SECS", defaults::PROXY_TIMEOUT_SECS)?,
                max_body_bytes: parse_env(
                    "PROXY_MAX_BODY_BYTES",
                    defaults::PROXY_MAX_BODY_BYTES,
                )?,
            },
            backend: BackendConfig {
                host: env_var_or("BACKEND_HOST", defaults::BACKEND_HOST),
                port: parse_env("BACKEND_PORT", defaults::BACKEND_PORT)?,
                spawn: parse_env("BACKEND_SPAWN", false)?,
                command: env_var_or("BACKEND_COMMAND", defaults::BACKEND_COMMAND),
                args: parse_args(&env_var_or("BACKEND_ARGS", defaults::BACKEND_ARGS)),
                working_dir: env::var("BACKEND_WORKING_DIR").ok().map(PathBuf::from),
                startup_timeout_secs: parse_env(
                    "BACKEND_STARTUP_TIMEOUT_SECS",
                    defaults::BACKEND_STARTUP_TIMEOUT_SECS,
                )?,
                shutdown_timeout_secs: parse_env(
                    "BACKEND_SHUTDOWN_TIMEOUT_SECS",
                    defaults::BACKEND_SHUTDOWN_TIMEOUT_SECS,
                )?,
                health_poll_interval_ms: parse_env(
                    "BACKEND_HEALTH_POLL_MS",
                    defaults::BACKEND_HEALTH_POLL_MS,
                )?,
            },
            client: ClientConfig {
                api_base: env_var_or("ANALYSIS_API_BASE", defaults::ANALYSIS_API_BASE),
                timeout_secs: parse_env("ANALYSIS_TIMEOUT_SECS", defaults::ANALYSIS_TIMEOUT_SECS)?,
                connect_timeout_secs: parse_env(
                    "ANALYSIS_CONNECT_TIMEOUT_SECS",
                    defaults::ANALYSIS_CONNECT_TIMEOUT_SECS,
                )?,
                max_upload_bytes: parse_env(
                    "MAX_UPLOAD_BYTES",
                    nutriscore_core::constants::upload::DEFAULT_MAX_UPLOAD_BYTES,
                )?,
            },
        };

        config.validate()?;
        info!("Configuration loaded successfully");
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid setting
    pub fn validate(&self) -> Result<()> {
        if !self.proxy.api_prefix.starts_with('/') || self.proxy.api_prefix.len() < 2 {
            return Err(anyhow!(
                "API_PREFIX must be a non-root path starting with '/', got '{}'",
                self.proxy.api_prefix
            ));
        }

        if self.http.port == self.backend.port && is_loopback_pair(&self.http.host, &self.backend.host)
        {
            return Err(anyhow!(
                "PORT and BACKEND_PORT cannot be the same ({}); the proxy would forward to itself",
                self.http.port
            ));
        }

        if self.backend.spawn && self.backend.command.trim().is_empty() {
            return Err(anyhow!("BACKEND_SPAWN is set but BACKEND_COMMAND is empty"));
        }

        if self.client.timeout_secs == 0 || self.proxy.timeout_secs == 0 {
            return Err(anyhow!("Timeouts must be at least one second"));
        }

        if self.client.max_upload_bytes > self.proxy.max_body_bytes {
            return Err(anyhow!(
                "MAX_UPLOAD_BYTES ({}) exceeds PROXY_MAX_BODY_BYTES ({})",
                self.client.max_upload_bytes,
                self.proxy.max_body_bytes
            ));
        }

        if self.backend.health_poll_interval_ms == 0 {
            return Err(anyhow!("BACKEND_HEALTH_POLL_MS must be positive"));
        }

        Url::parse(&self.client.api_base)
            .with_context(|| format!("Invalid ANALYSIS_API_BASE '{}'", self.client.api_base))?;

        Ok(())
    }

    /// Get a summary of the configuration for logging
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "NutriScore Server Configuration:\n\
             - Environment: {}\n\
             - Listener: {}:{}\n\
             - Static Dir: {}\n\
             - API Prefix: {}\n\
             - Backend: {} ({})\n\
             - Analysis API: {} (timeout {}s)\n\
             - Log Level: {}",
            self.environment,
            self.http.host,
            self.http.port,
            self.http.static_dir.display(),
            self.proxy.api_prefix,
            self.backend.base_url(),
            if self.backend.spawn {
                "supervised"
            } else {
                "external"
            },
            self.client.api_base,
            self.client.timeout_secs,
            self.log_level,
        )
    }
}

/// Get environment variable or default value
fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Parse an environment variable, falling back to `default` when unset
fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {key} value '{raw}'")),
        Err(_) => Ok(default),
    }
}

/// Split whitespace-separated process arguments
fn parse_args(args: &str) -> Vec<String> {
    args.split_whitespace().map(str::to_owned).collect()
}

/// Ensure a leading slash and no trailing slash
fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_end_matches('/');
    if trimmed.starts_with('/') {
        trimmed.to_owned()
    } else {
        format!("/{trimmed}")
    }
}

fn is_loopback_pair(listen_host: &str, backend_host: &str) -> bool {
    let local = |h: &str| matches!(h, "0.0.0.0" | "127.0.0.1" | "localhost" | "::" | "::1");
    listen_host == backend_host || (local(listen_host) && local(backend_host))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_args() {
        assert_eq!(parse_args("server/app.py --port 8000"), vec!["server/app.py", "--port", "8000"]);
        assert!(parse_args("   ").is_empty());
    }

    #[test]
    fn test_normalize_prefix() {
        assert_eq!(normalize_prefix("/api"), "/api");
        assert_eq!(normalize_prefix("api/"), "/api");
        assert_eq!(normalize_prefix(" /v1/api/ "), "/v1/api");
    }

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(LogLevel::from_str_or_default("WARN"), LogLevel::Warn);
        assert_eq!(LogLevel::from_str_or_default("Debug"), LogLevel::Debug);
        assert_eq!(LogLevel::from_str_or_default("invalid"), LogLevel::Info);
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.client.analyze_url(), "http://127.0.0.1:5000/api/analyze");
        assert_eq!(config.backend.base_url(), "http://127.0.0.1:8000");
    }

    #[test]
    fn test_validate_rejects_self_forwarding() {
        let mut config = ServerConfig::default();
        config.backend.port = config.http.port;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_root_prefix() {
        let mut config = ServerConfig::default();
        config.proxy.api_prefix = "/".into();
        assert!(config.validate().is_err());
    }
}
