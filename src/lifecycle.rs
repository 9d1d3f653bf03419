// ABOUTME: Service lifecycle management for deterministic startup, health checks, and shutdown
// ABOUTME: Provides the ManagedService trait and a manager that starts and stops services in order
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright (c) 2025 Async-IO.org

//! Service Lifecycle Management
//!
//! Long-lived resources the server owns (the analysis backend process) implement
//! [`ManagedService`] so they have one explicit start / health-check / shutdown
//! contract:
//! - Services start in registration order, each bounded by a timeout
//! - Optional services may fail without aborting startup
//! - Shutdown runs in reverse order and continues past individual failures

use async_trait::async_trait;
use nutriscore_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

/// Manager shared between the server loop and the readiness route
pub type SharedServiceManager = Arc<RwLock<ServiceManager>>;

/// Service lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceState {
    /// Not started yet
    Stopped,
    /// Start in progress
    Starting,
    /// Started and accepting work
    Running,
    /// Start failed or the service died
    Failed,
    /// Shutdown in progress
    ShuttingDown,
    /// Shut down
    Shutdown,
}

/// Service health status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceHealth {
    /// Service name
    pub name: String,
    /// Current state
    pub state: ServiceState,
    /// Health check status
    pub healthy: bool,
    /// Optional status message
    pub message: Option<String>,
    /// Last health check timestamp
    pub last_check: chrono::DateTime<chrono::Utc>,
}

/// Lifecycle contract for owned resources
#[async_trait]
pub trait ManagedService: Send + Sync {
    /// Service name
    fn name(&self) -> &str;

    /// Start the service and wait until it is usable
    ///
    /// # Errors
    /// Returns an error if the service cannot be started
    async fn start(&mut self) -> AppResult<()>;

    /// Perform health check
    ///
    /// # Errors
    /// Returns an error if the health check itself cannot run
    async fn health_check(&self) -> AppResult<ServiceHealth>;

    /// Stop the service and release its resources
    ///
    /// # Errors
    /// Returns an error if shutdown does not complete cleanly
    async fn shutdown(&mut self) -> AppResult<()>;

    /// Get current state
    fn state(&self) -> ServiceState;

    /// Whether startup fails when this service fails
    fn is_required(&self) -> bool {
        true
    }
}

/// Starts, checks, and stops registered services
pub struct ServiceManager {
    services: Vec<Box<dyn ManagedService>>,
    start_timeout: Duration,
}

impl ServiceManager {
    /// Create a manager that bounds each start by `start_timeout`
    #[must_use]
    pub fn new(start_timeout: Duration) -> Self {
        Self {
            services: Vec::new(),
            start_timeout,
        }
    }

    /// Register a service
    pub fn register(&mut self, service: Box<dyn ManagedService>) {
        info!("Registering service: {}", service.name());
        self.services.push(service);
    }

    /// Number of registered services
    #[must_use]
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Whether no service is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Start all services in registration order
    ///
    /// # Errors
    /// Returns an error if any required service fails or times out
    pub async fn start_all(&mut self) -> AppResult<()> {
        info!("Starting {} services", self.services.len());

        for service in &mut self.services {
            let name = service.name().to_owned();
            let required = service.is_required();

            match tokio::time::timeout(self.start_timeout, service.start()).await {
                Ok(Ok(())) => info!("Service '{}' started", name),
                Ok(Err(e)) if required => {
                    error!("Required service '{}' failed to start: {}", name, e);
                    return Err(e);
                }
                Ok(Err(e)) => warn!("Optional service '{}' failed to start: {}", name, e),
                Err(_) if required => {
                    error!(
                        "Required service '{}' start timed out after {:?}",
                        name, self.start_timeout
                    );
                    return Err(AppError::backend_process(format!(
                        "Service start timeout: {name}"
                    )));
                }
                Err(_) => warn!("Optional service '{}' start timed out", name),
            }
        }

        Ok(())
    }

    /// Perform health checks on all services
    pub async fn health_check_all(&self) -> Vec<ServiceHealth> {
        let mut results = Vec::with_capacity(self.services.len());

        for service in &self.services {
            match service.health_check().await {
                Ok(health) => results.push(health),
                Err(e) => {
                    error!("Health check failed for service '{}': {}", service.name(), e);
                    results.push(ServiceHealth {
                        name: service.name().to_owned(),
                        state: service.state(),
                        healthy: false,
                        message: Some(format!("Health check error: {e}")),
                        last_check: chrono::Utc::now(),
                    });
                }
            }
        }

        results
    }

    /// Check every service and tell whether all required ones are healthy
    pub async fn health_report(&self) -> (bool, Vec<ServiceHealth>) {
        let checks = self.health_check_all().await;
        let healthy = self
            .services
            .iter()
            .zip(checks.iter())
            .all(|(service, health)| !service.is_required() || health.healthy);
        (healthy, checks)
    }

    /// Whether every required service reports healthy
    pub async fn is_healthy(&self) -> bool {
        self.health_report().await.0
    }

    /// Shut down all services in reverse order
    ///
    /// Every service is asked to stop even if an earlier one fails; the first
    /// failure is returned.
    ///
    /// # Errors
    /// Returns the first shutdown error
    pub async fn shutdown_all(&mut self) -> AppResult<()> {
        info!("Shutting down {} services", self.services.len());
        let mut first_error = None;

        for service in self.services.iter_mut().rev() {
            let name = service.name().to_owned();
            if let Err(e) = service.shutdown().await {
                error!("Service '{}' shutdown error: {}", name, e);
                first_error.get_or_insert(e);
            }
        }

        first_error.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct Recorder {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
        fail_start: bool,
        required: bool,
        state: ServiceState,
    }

    impl Recorder {
        fn boxed(
            name: &'static str,
            log: &Arc<Mutex<Vec<String>>>,
            fail_start: bool,
            required: bool,
        ) -> Box<dyn ManagedService> {
            Box::new(Self {
                name,
                log: Arc::clone(log),
                fail_start,
                required,
                state: ServiceState::Stopped,
            })
        }
    }

    #[async_trait]
    impl ManagedService for Recorder {
        fn name(&self) -> &str {
            self.name
        }

        async fn start(&mut self) -> AppResult<()> {
            self.log.lock().unwrap().push(format!("start {}", self.name));
            if self.fail_start {
                self.state = ServiceState::Failed;
                return Err(AppError::backend_process("refused"));
            }
            self.state = ServiceState::Running;
            Ok(())
        }

        async fn health_check(&self) -> AppResult<ServiceHealth> {
            Ok(ServiceHealth {
                name: self.name.to_owned(),
                state: self.state,
                healthy: self.state == ServiceState::Running,
                message: None,
                last_check: chrono::Utc::now(),
            })
        }

        async fn shutdown(&mut self) -> AppResult<()> {
            self.log.lock().unwrap().push(format!("stop {}", self.name));
            self.state = ServiceState::Shutdown;
            Ok(())
        }

        fn state(&self) -> ServiceState {
            self.state
        }

        fn is_required(&self) -> bool {
            self.required
        }
    }

    #[tokio::test]
    async fn test_start_in_order_and_stop_in_reverse() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut manager = ServiceManager::new(Duration::from_secs(1));
        manager.register(Recorder::boxed("a", &log, false, true));
        manager.register(Recorder::boxed("b", &log, false, true));

        manager.start_all().await.unwrap();
        assert!(manager.is_healthy().await);
        manager.shutdown_all().await.unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["start a", "start b", "stop b", "stop a"]);
    }

    #[tokio::test]
    async fn test_optional_failure_does_not_abort_startup() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut manager = ServiceManager::new(Duration::from_secs(1));
        manager.register(Recorder::boxed("optional", &log, true, false));
        manager.register(Recorder::boxed("required", &log, false, true));

        manager.start_all().await.unwrap();
        assert!(manager.is_healthy().await);

        let (healthy, checks) = manager.health_report().await;
        assert!(healthy);
        assert_eq!(checks.len(), 2);
        assert!(!checks[0].healthy);
        assert_eq!(checks[0].state, ServiceState::Failed);
    }

    #[tokio::test]
    async fn test_required_failure_aborts_startup() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut manager = ServiceManager::new(Duration::from_secs(1));
        manager.register(Recorder::boxed("required", &log, true, true));
        manager.register(Recorder::boxed("never", &log, false, true));

        assert!(manager.start_all().await.is_err());
        assert_eq!(*log.lock().unwrap(), vec!["start required"]);
    }
}
