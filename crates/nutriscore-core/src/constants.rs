// ABOUTME: Constants for upload validation, score display scales, and report styling
// ABOUTME: Pure data constants organized by domain for the NutriScore service
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Constants module
//!
//! Grouped by the concern that reads them, so formatter, client and report
//! code agree on a single set of numbers.

/// Upload validation
pub mod upload {
    /// MIME types accepted for analysis
    pub const ALLOWED_MIME_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/jpg"];
    /// Multipart form field carrying the image
    pub const IMAGE_FIELD: &str = "image";
    /// Default upper bound on upload size (10 MiB)
    pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
}

/// Health rating scale drawn under the score cards
pub mod scale {
    /// Lowest net score on the visible track
    pub const NET_SCORE_MIN: f64 = -30.0;
    /// Highest net score on the visible track
    pub const NET_SCORE_MAX: f64 = 30.0;
    /// Net scores strictly below this are in the Poor band
    pub const POOR_UPPER_BOUND: f64 = -10.0;
    /// Net scores strictly above this are in the Good band
    pub const GOOD_LOWER_BOUND: f64 = 10.0;
    /// Upper bound of good/bad percentages
    pub const PERCENT_MAX: f64 = 100.0;
    /// Circumference units of a score ring
    pub const RING_CIRCUMFERENCE: f64 = 100.0;
}

/// Ring and badge colors
pub mod colors {
    /// Good score ring
    pub const GOOD_RING: &str = "#10b981";
    /// Bad score ring
    pub const BAD_RING: &str = "#ef4444";
    /// Net score ring
    pub const NET_RING: &str = "#f59e0b";
    /// Empty ring track
    pub const RING_TRACK: &str = "#e5e7eb";
    /// Danger token (Poor rating)
    pub const DANGER: &str = "#ef4444";
    /// Warning token (Medium rating)
    pub const WARNING: &str = "#f59e0b";
    /// Primary token (Good rating)
    pub const PRIMARY: &str = "#10b981";
}

/// Service identity
pub mod service_names {
    /// Name used in logs and health responses
    pub const NUTRISCORE_SERVER: &str = "nutriscore-server";
    /// Product name shown in reports
    pub const PRODUCT_NAME: &str = "NutriScore";
}
