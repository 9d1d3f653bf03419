// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
// ABOUTME: Command implementations for nutriscore-cli
// ABOUTME: Each subcommand lives in its own module

pub mod analyze;
