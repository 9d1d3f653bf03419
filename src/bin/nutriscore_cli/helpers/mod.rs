// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
// ABOUTME: Helper modules for nutriscore-cli
// ABOUTME: Terminal output formatting

pub mod display;
