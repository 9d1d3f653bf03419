// ABOUTME: NutriScore CLI - analyze food photos from the terminal
// ABOUTME: Uploads an image through the analysis API, prints the scored result, and exports reports
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
//!
//! Usage:
//! ```bash
//! # Analyze a photo through a running nutriscore-server
//! nutriscore-cli analyze lunch.jpg
//!
//! # Print the raw result as JSON
//! nutriscore-cli analyze lunch.jpg --json
//!
//! # Save the PDF report into a directory (named NutriScore_Report_<date>.pdf)
//! nutriscore-cli analyze lunch.jpg --report ./reports
//!
//! # Save the printable HTML variant instead
//! nutriscore-cli analyze lunch.jpg --report ./reports --html
//!
//! # Talk to another deployment
//! nutriscore-cli --api-base https://nutriscore.example.com/api analyze lunch.jpg
//! ```

mod commands;
mod helpers;

use clap::{Parser, Subcommand};
use nutriscore::config::ClientConfig;
use nutriscore::logging::{LogFormat, LoggingConfig};
use nutriscore::report::ReportFormat;
use nutriscore::AppResult;
use std::path::PathBuf;
use tracing::debug;

#[derive(Parser)]
#[command(
    name = "nutriscore-cli",
    about = "NutriScore command-line client",
    long_about = "Analyze food photographs with the NutriScore analysis API and export reports."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Analysis API base URL (defaults to ANALYSIS_API_BASE or the local server)
    #[arg(long, global = true)]
    api_base: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[non_exhaustive]
#[derive(Subcommand)]
enum Command {
    /// Analyze one JPEG or PNG image
    Analyze {
        /// Image file
        file: PathBuf,

        /// Write the PDF report to this file or directory
        #[arg(long)]
        report: Option<PathBuf>,

        /// Write the report as HTML instead of PDF
        #[arg(long, requires = "report")]
        html: bool,

        /// Print the result as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::default();
        if let Ok(api_base) = std::env::var("ANALYSIS_API_BASE") {
            config.api_base = api_base;
        }
        if let Some(api_base) = &self.api_base {
            config.api_base.clone_from(api_base);
        }
        if let Some(timeout) = self.timeout {
            config.timeout_secs = timeout;
        }
        config
    }
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();

    let logging = LoggingConfig {
        level: if cli.verbose { "debug" } else { "warn" }.to_owned(),
        format: LogFormat::Compact,
        ..LoggingConfig::default()
    };
    if let Err(e) = logging.init() {
        eprintln!("Logging disabled: {e}");
    }

    let config = cli.client_config();
    debug!(api_base = %config.api_base, "Using analysis API");

    match cli.command {
        Command::Analyze {
            file,
            report,
            html,
            json,
        } => {
            let format = if html {
                ReportFormat::Html
            } else {
                ReportFormat::Pdf
            };
            let report = report.as_deref().map(|path| (path, format));
            commands::analyze::run(config, &file, report, json).await
        }
    }
}
