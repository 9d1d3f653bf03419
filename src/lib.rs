// ABOUTME: Main library entry point for the NutriScore food analysis service
// ABOUTME: Provides the upload client, view lifecycle, reverse proxy, backend supervisor, and reports
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # NutriScore
//!
//! Upload a food photograph, have it analyzed by the analysis backend, and
//! present a scored nutrition report.
//!
//! ## Architecture
//!
//! - **Upload client** (`client`): one multipart request per image, with
//!   timeout, cancellation, and response validation
//! - **View** (`view`): the Idle / Pending / Complete state machine driving a
//!   single analysis at a time
//! - **Reverse proxy** (`proxy`, `routes`, `server`): hosts the front end and
//!   forwards `/api` traffic to the analysis process
//! - **Backend supervisor** (`backend`, `lifecycle`): owned child process with
//!   explicit start, health check, and shutdown
//! - **Reports** (`report`): PDF export of a result, with an HTML variant
//!
//! Pure types (errors, models, score formatting) live in `nutriscore-core` and
//! are re-exported here.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use nutriscore::config::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::from_env()?;
//!     nutriscore::server::run(config).await
//! }
//! ```

/// Backend child process supervision
pub mod backend;

/// Analysis API client
pub mod client;

/// Environment-driven configuration
pub mod config;

/// Service lifecycle management
pub mod lifecycle;

/// Logging setup and structured log helpers
pub mod logging;

/// HTTP middleware
pub mod middleware;

/// Reverse proxy
pub mod proxy;

/// PDF and HTML report export
pub mod report;

/// HTTP routes
pub mod routes;

/// Server assembly
pub mod server;

/// Image uploads and previews
pub mod upload;

/// Analysis view state machine
pub mod view;

pub use nutriscore_core::{
    constants, errors, formatting, models, summary, AnalysisResult, AppError, AppResult,
    ErrorCode, HealthRating, NutritionSummary, ScoreDisplay,
};
