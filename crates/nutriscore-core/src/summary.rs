// ABOUTME: Default nutrition narrative used when the backend summary is incomplete
// ABOUTME: Builds a rating-specific overview, element lists, and recommendation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Fallback summary
//!
//! The analysis backend asks a language model for the narrative and falls back
//! to fixed wording when the model output misses a line. Older backends skip
//! that step, so the same wording is applied here when a payload arrives with
//! empty summary parts. An incomplete summary is replaced as a whole.

use crate::formatting::format_net_score;
use crate::models::{HealthRating, NutritionSummary};

/// Return `summary` unchanged when complete, otherwise the default narrative
#[must_use]
pub fn complete(
    summary: NutritionSummary,
    net_score: f64,
    rating: &HealthRating,
) -> NutritionSummary {
    if summary.is_incomplete() {
        default_summary(net_score, rating)
    } else {
        summary
    }
}

/// Default narrative for a rating and net score
#[must_use]
pub fn default_summary(net_score: f64, rating: &HealthRating) -> NutritionSummary {
    let mut overview = format!(
        "Based on our analysis, your food has a {} health rating with a net score of {}. ",
        rating.label().to_lowercase(),
        format_net_score(net_score)
    );

    let (closing, positives, improvements, recommendation): (&str, &[&str], &[&str], &str) =
        match rating {
            HealthRating::Good => (
                "It is nutritionally beneficial with many positive elements.",
                &[
                    "High in essential nutrients",
                    "Good source of protein",
                    "Rich in dietary fiber",
                    "Contains healthy fats",
                ],
                &["Some sodium", "Moderate sugar", "Minor processing"],
                "Regular consumption is recommended as part of a balanced diet.",
            ),
            HealthRating::Poor => (
                "It has more negative than positive nutritional aspects.",
                &["Provides some energy", "Contains minimal nutrients"],
                &[
                    "High in unhealthy fats",
                    "Excessive sodium",
                    "Added sugars",
                    "Highly processed",
                ],
                "Consider alternatives with better nutritional profiles.",
            ),
            HealthRating::Medium | HealthRating::Unrecognized(_) => (
                "It has a balanced nutritional profile with room for improvement.",
                &[
                    "Moderate protein",
                    "Contains fiber",
                    "Some vitamins and minerals",
                ],
                &[
                    "Relatively high sodium",
                    "Some processed ingredients",
                    "Moderate sugar",
                ],
                "Consume in moderation and pair with fresh foods.",
            ),
        };
    overview.push_str(closing);

    NutritionSummary {
        overview,
        positive_elements: positives.iter().map(|s| (*s).to_owned()).collect(),
        areas_for_improvement: improvements.iter().map(|s| (*s).to_owned()).collect(),
        recommendation: recommendation.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_overview_uses_signed_net_score() {
        let summary = default_summary(-12.0, &HealthRating::Poor);
        assert_eq!(
            summary.overview,
            "Based on our analysis, your food has a poor health rating with a net score of -12%. \
             It has more negative than positive nutritional aspects."
        );
        assert_eq!(summary.areas_for_improvement.len(), 4);
    }

    #[test]
    fn test_unrecognized_rating_uses_medium_wording() {
        let summary = default_summary(0.0, &HealthRating::Unrecognized("Fair".into()));
        assert!(summary.overview.contains("fair health rating with a net score of 0%"));
        assert_eq!(
            summary.recommendation,
            "Consume in moderation and pair with fresh foods."
        );
    }

    #[test]
    fn test_complete_summary_is_untouched() {
        let original = NutritionSummary {
            overview: "Fine.".into(),
            positive_elements: vec!["Fiber".into()],
            areas_for_improvement: vec!["Salt".into()],
            recommendation: "Eat it.".into(),
        };
        let kept = complete(original.clone(), 5.0, &HealthRating::Medium);
        assert_eq!(kept, original);
    }
}
