// ABOUTME: Deterministic mapping from analysis scores to display primitives
// ABOUTME: Percentage strings, ring fill fractions, scale marker position, and rating colors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Score Formatter
//!
//! Pure functions shared by every renderer (HTML report, CLI output).
//!
//! - Score rings take the raw percentage as the filled share of a ring whose
//!   circumference is 100 units. The net ring uses the magnitude of the net score.
//! - The rating scale maps net scores linearly from [-30, 30] onto [0%, 100%].
//!   Values beyond ±30 land outside the track; [`scale_position`] does not
//!   clamp, [`ScaleMarker::on_track`] reports it.
//! - Net scores render as sign + magnitude + `%`, where the sign is `+` for
//!   positive, `-` for negative and empty for zero.

use crate::constants::{colors, scale};
use crate::models::{AnalysisResult, HealthRating};
use serde::Serialize;

/// Color token applied to rating badges and the scale marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorToken {
    /// Poor rating
    Danger,
    /// Medium rating, also used for unrecognized ratings
    Warning,
    /// Good rating
    Primary,
}

impl ColorToken {
    /// Text color class
    #[must_use]
    pub const fn text_class(self) -> &'static str {
        match self {
            Self::Danger => "text-danger-500",
            Self::Warning => "text-warning-500",
            Self::Primary => "text-primary-500",
        }
    }

    /// Background color class
    #[must_use]
    pub const fn bg_class(self) -> &'static str {
        match self {
            Self::Danger => "bg-danger-500",
            Self::Warning => "bg-warning-500",
            Self::Primary => "bg-primary-500",
        }
    }

    /// Hex color value
    #[must_use]
    pub const fn hex(self) -> &'static str {
        match self {
            Self::Danger => colors::DANGER,
            Self::Warning => colors::WARNING,
            Self::Primary => colors::PRIMARY,
        }
    }
}

/// Band of the rating scale a net score falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RatingBand {
    /// Below -10
    Poor,
    /// -10 to +10 inclusive
    Medium,
    /// Above +10
    Good,
}

impl RatingBand {
    /// Legend text shown under the scale
    #[must_use]
    pub const fn legend(self) -> &'static str {
        match self {
            Self::Poor => "Poor (Below -10%)",
            Self::Medium => "Medium (-10% to +10%)",
            Self::Good => "Good (Above +10%)",
        }
    }

    /// All bands in scale order
    #[must_use]
    pub const fn all() -> [Self; 3] {
        [Self::Poor, Self::Medium, Self::Good]
    }
}

/// One score ring
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Gauge {
    /// Filled share of the ring, in circumference units out of 100
    pub fraction: f64,
    /// SVG `stroke-dasharray` value
    pub dash_array: String,
    /// Stroke color
    pub color: &'static str,
    /// Text shown inside the ring
    pub label: String,
}

/// Marker on the rating scale
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScaleMarker {
    /// Left offset in percent of the track width, unclamped
    pub position: f64,
    /// Whether the marker lies within the visible track
    pub on_track: bool,
    /// Band of the net score
    pub band: RatingBand,
}

/// Every display primitive derived from one analysis result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreDisplay {
    /// Good score ring
    pub good_ring: Gauge,
    /// Bad score ring
    pub bad_ring: Gauge,
    /// Net score ring, filled by the magnitude of the net score
    pub net_ring: Gauge,
    /// Signed net score badge, e.g. `+15%`
    pub net_badge: String,
    /// Rating label
    pub rating_label: String,
    /// Rating color
    pub rating_color: ColorToken,
    /// Scale marker
    pub marker: ScaleMarker,
}

impl ScoreDisplay {
    /// Format an analysis result
    #[must_use]
    pub fn from_result(result: &AnalysisResult) -> Self {
        Self::from_scores(
            result.good_score,
            result.bad_score,
            result.net_score,
            &result.health_rating,
        )
    }

    /// Format raw scores
    #[must_use]
    pub fn from_scores(good: f64, bad: f64, net: f64, rating: &HealthRating) -> Self {
        let position = scale_position(net);
        Self {
            good_ring: gauge(good, colors::GOOD_RING, format_percent(good)),
            bad_ring: gauge(bad, colors::BAD_RING, format_percent(bad)),
            net_ring: gauge(net.abs(), colors::NET_RING, format_net_score(net)),
            net_badge: format_net_score(net),
            rating_label: rating.label().to_owned(),
            rating_color: color_token(rating),
            marker: ScaleMarker {
                position,
                on_track: (0.0..=100.0).contains(&position),
                band: band_for(net),
            },
        }
    }
}

fn gauge(score: f64, color: &'static str, label: String) -> Gauge {
    Gauge {
        fraction: gauge_fraction(score),
        dash_array: dash_array(score),
        color,
        label,
    }
}

/// Sign prefix of a net score
#[must_use]
pub fn sign(net_score: f64) -> &'static str {
    if net_score > 0.0 {
        "+"
    } else if net_score < 0.0 {
        "-"
    } else {
        ""
    }
}

/// Render a percentage without a trailing `.0`
#[must_use]
pub fn format_percent(value: f64) -> String {
    format!("{value}%")
}

/// Render a net score as sign, magnitude and `%`
#[must_use]
pub fn format_net_score(net_score: f64) -> String {
    format!("{}{}", sign(net_score), format_percent(net_score.abs()))
}

/// Ring fill for a percentage score
///
/// The percentage is the arc length directly, since the ring circumference is 100.
#[must_use]
pub const fn gauge_fraction(score: f64) -> f64 {
    score
}

/// SVG dash array filling `score` units of the ring
#[must_use]
pub fn dash_array(score: f64) -> String {
    format!("{}, {}", gauge_fraction(score), scale::RING_CIRCUMFERENCE)
}

/// Position of the scale marker in percent of the track width
#[must_use]
pub fn scale_position(net_score: f64) -> f64 {
    let span = scale::NET_SCORE_MAX - scale::NET_SCORE_MIN;
    ((net_score - scale::NET_SCORE_MIN) / span) * 100.0
}

/// Scale position limited to the visible track
#[must_use]
pub fn scale_position_clamped(net_score: f64) -> f64 {
    scale_position(net_score).clamp(0.0, 100.0)
}

/// Color token for a rating, Medium styling for anything unrecognized
#[must_use]
pub const fn color_token(rating: &HealthRating) -> ColorToken {
    match rating {
        HealthRating::Poor => ColorToken::Danger,
        HealthRating::Good => ColorToken::Primary,
        HealthRating::Medium | HealthRating::Unrecognized(_) => ColorToken::Warning,
    }
}

/// Band a net score falls into
#[must_use]
pub fn band_for(net_score: f64) -> RatingBand {
    if net_score < scale::POOR_UPPER_BOUND {
        RatingBand::Poor
    } else if net_score > scale::GOOD_LOWER_BOUND {
        RatingBand::Good
    } else {
        RatingBand::Medium
    }
}
