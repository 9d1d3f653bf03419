// ABOUTME: Supervised analysis backend child process with explicit start and shutdown
// ABOUTME: Spawns the process, relays its output to tracing, and waits for its port to accept connections
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Analysis backend supervisor
//!
//! [`BackendProcess`] owns the child process. It is started and stopped through
//! [`ManagedService`]; dropping it without a shutdown still kills the child.

use crate::config::BackendConfig;
use crate::lifecycle::{ManagedService, ServiceHealth, ServiceState};
use crate::logging::AppLogger;
use async_trait::async_trait;
use nutriscore_core::{AppError, AppResult};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::net::TcpStream;
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{info, warn};

const CONNECT_CHECK_TIMEOUT: Duration = Duration::from_secs(1);

/// Whether something accepts TCP connections on `addr`
pub async fn accepts_connections(addr: &str, timeout: Duration) -> bool {
    matches!(
        tokio::time::timeout(timeout, TcpStream::connect(addr)).await,
        Ok(Ok(_))
    )
}

fn relay_output<R>(stream: &'static str, reader: R) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            AppLogger::log_backend_output(stream, &line);
        }
    })
}

/// Owned handle to the analysis backend process
pub struct BackendProcess {
    config: BackendConfig,
    child: Option<Child>,
    output: Vec<JoinHandle<()>>,
    state: ServiceState,
}

impl BackendProcess {
    /// Create a supervisor; nothing is spawned until [`ManagedService::start`]
    #[must_use]
    pub const fn new(config: BackendConfig) -> Self {
        Self {
            config,
            child: None,
            output: Vec::new(),
            state: ServiceState::Stopped,
        }
    }

    /// OS process id while running
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().and_then(Child::id)
    }

    fn spawn(&mut self) -> AppResult<()> {
        let mut command = Command::new(&self.config.command);
        command
            .args(&self.config.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.config.working_dir {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(|e| {
            AppError::backend_process(format!(
                "Failed to spawn '{}': {e}",
                self.config.command
            ))
            .with_source(e)
        })?;

        if let Some(stdout) = child.stdout.take() {
            self.output.push(relay_output("stdout", stdout));
        }
        if let Some(stderr) = child.stderr.take() {
            self.output.push(relay_output("stderr", stderr));
        }

        info!(
            pid = child.id().unwrap_or_default(),
            command = %self.config.command,
            args = ?self.config.args,
            "Analysis backend spawned"
        );
        self.child = Some(child);
        Ok(())
    }

    async fn wait_until_ready(&mut self) -> AppResult<()> {
        let addr = self.config.socket_addr();
        let deadline = Instant::now() + self.config.startup_timeout();

        loop {
            if accepts_connections(&addr, CONNECT_CHECK_TIMEOUT).await {
                return Ok(());
            }
            if let Some(child) = self.child.as_mut() {
                if let Some(status) = child.try_wait()? {
                    return Err(AppError::backend_process(format!(
                        "Analysis backend exited during startup with {status}"
                    )));
                }
            }
            if Instant::now() >= deadline {
                return Err(AppError::backend_process(format!(
                    "Analysis backend did not accept connections on {addr} within {}s",
                    self.config.startup_timeout_secs
                )));
            }
            tokio::time::sleep(self.config.health_poll_interval()).await;
        }
    }

    async fn stop_child(&mut self) -> AppResult<()> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };

        if child.try_wait()?.is_none() {
            if let Err(e) = child.start_kill() {
                warn!("Failed to signal analysis backend: {e}");
            }
            match tokio::time::timeout(self.config.shutdown_timeout(), child.wait()).await {
                Ok(Ok(status)) => info!(%status, "Analysis backend exited"),
                Ok(Err(e)) => return Err(AppError::from(e)),
                Err(_) => {
                    return Err(AppError::backend_process(format!(
                        "Analysis backend did not exit within {}s",
                        self.config.shutdown_timeout_secs
                    )));
                }
            }
        }

        for task in self.output.drain(..) {
            task.abort();
        }
        Ok(())
    }
}

#[async_trait]
impl ManagedService for BackendProcess {
    fn name(&self) -> &str {
        "analysis-backend"
    }

    async fn start(&mut self) -> AppResult<()> {
        if self.state == ServiceState::Running {
            return Ok(());
        }

        let addr = self.config.socket_addr();
        if accepts_connections(&addr, CONNECT_CHECK_TIMEOUT).await {
            self.state = ServiceState::Failed;
            return Err(AppError::backend_process(format!(
                "Port {addr} is already in use; refusing to supervise a process we did not start"
            )));
        }

        self.state = ServiceState::Starting;
        if let Err(e) = self.spawn() {
            self.state = ServiceState::Failed;
            return Err(e);
        }

        match self.wait_until_ready().await {
            Ok(()) => {
                info!(addr = %addr, "Analysis backend ready");
                self.state = ServiceState::Running;
                Ok(())
            }
            Err(e) => {
                self.state = ServiceState::Failed;
                if let Err(stop_error) = self.stop_child().await {
                    warn!("Cleanup after failed start: {stop_error}");
                }
                Err(e)
            }
        }
    }

    async fn health_check(&self) -> AppResult<ServiceHealth> {
        let addr = self.config.socket_addr();
        let healthy = self.state == ServiceState::Running && accepts_connections(&addr, CONNECT_CHECK_TIMEOUT).await;
        Ok(ServiceHealth {
            name: self.name().to_owned(),
            state: self.state,
            healthy,
            message: Some(if healthy {
                format!("Accepting connections on {addr}")
            } else {
                format!("Not reachable on {addr}")
            }),
            last_check: chrono::Utc::now(),
        })
    }

    async fn shutdown(&mut self) -> AppResult<()> {
        if self.child.is_none() {
            self.state = ServiceState::Shutdown;
            return Ok(());
        }
        self.state = ServiceState::ShuttingDown;
        let result = self.stop_child().await;
        self.state = if result.is_ok() {
            ServiceState::Shutdown
        } else {
            ServiceState::Failed
        };
        result
    }

    fn state(&self) -> ServiceState {
        self.state
    }
}
