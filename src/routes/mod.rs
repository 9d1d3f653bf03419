// ABOUTME: Route module organization for the NutriScore HTTP listener
// ABOUTME: Groups health, proxied API, and static front-end routes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Route module for the NutriScore server
//!
//! Each module only defines routes and thin handlers; forwarding lives in
//! [`crate::proxy`] and process probing in [`crate::backend`].

/// Proxied analysis API routes
pub mod api;
/// Health check and readiness routes
pub mod health;
/// Single-page app hosting
pub mod spa;

pub use api::ApiRoutes;
pub use health::HealthRoutes;
pub use spa::spa_service;
