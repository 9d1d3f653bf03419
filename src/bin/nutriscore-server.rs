// ABOUTME: Server binary hosting the NutriScore front end and proxying the analysis API
// ABOUTME: Loads environment configuration, applies command-line overrides, and runs until signalled
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! # NutriScore Server Binary
//!
//! Serves the built single-page app, forwards `/api` to the analysis backend,
//! and optionally starts and supervises that backend.

use anyhow::Result;
use clap::Parser;
use nutriscore::{config::ServerConfig, logging, server};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "nutriscore-server")]
#[command(about = "NutriScore - food photo analysis front end and API proxy")]
pub struct Args {
    /// Override listen host
    #[arg(long)]
    host: Option<String>,

    /// Override listen port
    #[arg(long)]
    port: Option<u16>,

    /// Override the static front-end directory
    #[arg(long)]
    static_dir: Option<PathBuf>,

    /// Override the analysis backend port
    #[arg(long)]
    backend_port: Option<u16>,

    /// Start and supervise the analysis backend process
    #[arg(long)]
    spawn_backend: bool,
}

impl Args {
    fn apply(self, config: &mut ServerConfig) {
        if let Some(host) = self.host {
            config.http.host = host;
        }
        if let Some(port) = self.port {
            config.http.port = port;
        }
        if let Some(static_dir) = self.static_dir {
            config.http.static_dir = static_dir;
        }
        if let Some(backend_port) = self.backend_port {
            config.backend.port = backend_port;
        }
        if self.spawn_backend {
            config.backend.spawn = true;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init_from_env()?;

    let mut config = ServerConfig::from_env()?;
    args.apply(&mut config);
    config.validate()?;

    info!("Starting NutriScore server");
    if let Err(e) = server::run(config).await {
        error!("Server failed: {e:#}");
        return Err(e);
    }
    Ok(())
}
