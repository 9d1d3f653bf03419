// ABOUTME: Core types and pure display logic for the NutriScore food analysis service
// ABOUTME: Foundation crate with error handling, analysis models, score formatting, and constants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # NutriScore Core
//!
//! Foundation crate providing the shared types of the NutriScore service.
//! Nothing in here performs I/O, so the server, the CLI and the tests can all
//! depend on it without pulling in the HTTP stack.
//!
//! ## Modules
//!
//! - **errors**: Unified error handling with `AppError` and `ErrorCode`
//! - **models**: `AnalysisResult` as sent by the analysis backend, plus validation
//! - **formatting**: Deterministic score-to-visual mapping used by every renderer
//! - **summary**: Rating-specific fallback narrative for incomplete summaries
//! - **constants**: Accepted upload types, scale bounds, and color values

/// Unified error handling system with standard error codes and HTTP responses
pub mod errors;

/// Application constants organized by domain
pub mod constants;

/// Analysis result data model and validation
pub mod models;

/// Score formatter mapping analysis results to display primitives
pub mod formatting;

/// Fallback summary generation for incomplete backend summaries
pub mod summary;

pub use errors::{AppError, AppResult, ErrorCode};
pub use formatting::{ColorToken, RatingBand, ScoreDisplay};
pub use models::{AnalysisResult, HealthRating, NutritionSummary};
