// ABOUTME: Nutrition analysis result model exchanged with the analysis backend
// ABOUTME: AnalysisResult, HealthRating, and NutritionSummary with explicit payload validation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Analysis result model
//!
//! The analysis backend is the only place where untrusted data enters the
//! service, so payloads are never trusted structurally: [`AnalysisResult::from_json_slice`]
//! deserializes and then validates ranges before anything renders them.

use crate::constants::scale;
use crate::errors::{AppError, AppResult};
use crate::summary;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Three-band health judgment supplied by the backend
///
/// The client never derives the rating from the net score. Labels outside the
/// three known bands are kept verbatim so they can be shown, and render with
/// the Medium styling.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum HealthRating {
    /// Net score below -10
    Poor,
    /// Net score between -10 and +10
    Medium,
    /// Net score above +10
    Good,
    /// Any other label the backend sent
    Unrecognized(String),
}

impl HealthRating {
    /// Label as displayed next to the net score
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Poor => "Poor",
            Self::Medium => "Medium",
            Self::Good => "Good",
            Self::Unrecognized(label) => label,
        }
    }

    /// Whether this is one of the three documented bands
    #[must_use]
    pub const fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }
}

impl From<String> for HealthRating {
    fn from(label: String) -> Self {
        match label.as_str() {
            "Poor" => Self::Poor,
            "Medium" => Self::Medium,
            "Good" => Self::Good,
            _ => Self::Unrecognized(label),
        }
    }
}

impl From<&str> for HealthRating {
    fn from(label: &str) -> Self {
        Self::from(label.to_owned())
    }
}

impl From<HealthRating> for String {
    fn from(rating: HealthRating) -> Self {
        match rating {
            HealthRating::Unrecognized(label) => label,
            known => known.label().to_owned(),
        }
    }
}

impl fmt::Display for HealthRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Narrative part of an analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionSummary {
    /// One-sentence explanation of the overall nutritional quality
    pub overview: String,
    /// Positive nutritional aspects
    pub positive_elements: Vec<String>,
    /// Aspects that could be improved
    pub areas_for_improvement: Vec<String>,
    /// One-sentence recommendation
    pub recommendation: String,
}

impl NutritionSummary {
    /// True when any part of the narrative is missing
    #[must_use]
    pub fn is_incomplete(&self) -> bool {
        self.overview.trim().is_empty()
            || self.recommendation.trim().is_empty()
            || self.positive_elements.is_empty()
            || self.areas_for_improvement.is_empty()
    }
}

/// Scored nutrition report for one uploaded image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Positive nutritional attributes, percentage 0-100
    pub good_score: f64,
    /// Negative nutritional attributes, percentage 0-100
    pub bad_score: f64,
    /// Signed combination of good and bad, nominally within [-30, 30]
    pub net_score: f64,
    /// Backend-computed rating band
    pub health_rating: HealthRating,
    /// Narrative summary
    pub summary: NutritionSummary,
    /// Share of additives estimated from the ingredient list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additives_percentage: Option<String>,
    /// Sodium percentage of daily value read from the label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sodium_percentage: Option<String>,
    /// Raw label text recognized by the backend
    #[serde(
        default,
        rename = "extracted_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub extracted_text: Option<String>,
}

impl AnalysisResult {
    /// Deserialize and validate a backend response body
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if the body is not JSON of the expected shape or
    /// any score is outside its documented range
    pub fn from_json_slice(body: &[u8]) -> AppResult<Self> {
        let parsed: Self = serde_json::from_slice(body)?;
        parsed.validate()
    }

    /// Check ranges and complete the summary when the backend left parts of it empty
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if a score is not finite or a percentage is outside [0, 100]
    pub fn validate(mut self) -> AppResult<Self> {
        check_percentage("goodScore", self.good_score)?;
        check_percentage("badScore", self.bad_score)?;
        if !self.net_score.is_finite() {
            return Err(AppError::parse("netScore must be a finite number"));
        }

        if self.summary.is_incomplete() {
            tracing::debug!(
                rating = %self.health_rating,
                "Backend summary incomplete, using default narrative"
            );
            self.summary = summary::complete(self.summary, self.net_score, &self.health_rating);
        }

        Ok(self)
    }
}

fn check_percentage(field: &str, value: f64) -> AppResult<()> {
    if !value.is_finite() || !(0.0..=scale::PERCENT_MAX).contains(&value) {
        return Err(AppError::parse(format!(
            "{field} must be between 0 and 100, got {value}"
        ))
        .with_details(serde_json::json!({ "field": field })));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;
    use serde_json::json;

    fn sample() -> serde_json::Value {
        json!({
            "goodScore": 80,
            "badScore": 20,
            "netScore": 15,
            "healthRating": "Good",
            "additivesPercentage": "5",
            "sodiumPercentage": "12",
            "summary": {
                "overview": "A nutritious meal.",
                "positiveElements": ["High protein"],
                "areasForImprovement": ["Some sodium"],
                "recommendation": "Enjoy regularly."
            }
        })
    }

    #[test]
    fn test_parses_backend_payload() {
        let body = serde_json::to_vec(&sample()).unwrap();
        let result = AnalysisResult::from_json_slice(&body).unwrap();
        assert!((result.good_score - 80.0).abs() < f64::EPSILON);
        assert_eq!(result.health_rating, HealthRating::Good);
        assert_eq!(result.sodium_percentage.as_deref(), Some("12"));
        assert_eq!(result.summary.positive_elements, vec!["High protein"]);
    }

    #[test]
    fn test_unknown_rating_is_kept() {
        let mut payload = sample();
        payload["healthRating"] = json!("Excellent");
        let body = serde_json::to_vec(&payload).unwrap();
        let result = AnalysisResult::from_json_slice(&body).unwrap();
        assert_eq!(
            result.health_rating,
            HealthRating::Unrecognized("Excellent".into())
        );
        assert_eq!(result.health_rating.label(), "Excellent");
    }

    #[test]
    fn test_rejects_out_of_range_scores() {
        let mut payload = sample();
        payload["badScore"] = json!(140);
        let body = serde_json::to_vec(&payload).unwrap();
        let err = AnalysisResult::from_json_slice(&body).unwrap_err();
        assert_eq!(err.code, ErrorCode::ParseError);
        assert!(err.message.contains("badScore"));
    }

    #[test]
    fn test_rejects_missing_fields() {
        let mut payload = sample();
        payload.as_object_mut().unwrap().remove("summary");
        let body = serde_json::to_vec(&payload).unwrap();
        let err = AnalysisResult::from_json_slice(&body).unwrap_err();
        assert_eq!(err.code, ErrorCode::ParseError);
    }

    #[test]
    fn test_rejects_non_json_body() {
        let err = AnalysisResult::from_json_slice(b"<html>oops</html>").unwrap_err();
        assert_eq!(err.code, ErrorCode::ParseError);
    }

    #[test]
    fn test_incomplete_summary_is_completed() {
        let mut payload = sample();
        payload["summary"]["overview"] = json!("");
        let body = serde_json::to_vec(&payload).unwrap();
        let result = AnalysisResult::from_json_slice(&body).unwrap();
        assert!(result.summary.overview.contains("good health rating"));
        assert!(!result.summary.is_incomplete());
    }

    #[test]
    fn test_rating_round_trips_as_plain_string() {
        let value = serde_json::to_value(HealthRating::Poor).unwrap();
        assert_eq!(value, json!("Poor"));
        let value = serde_json::to_value(HealthRating::Unrecognized("Fair".into())).unwrap();
        assert_eq!(value, json!("Fair"));
    }
}
