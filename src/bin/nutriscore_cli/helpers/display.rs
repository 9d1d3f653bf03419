// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
// ABOUTME: Output formatting helpers for nutriscore-cli
// ABOUTME: Renders notifications, score summaries, and the rating scale as plain text

use nutriscore::formatting::{scale_position_clamped, RatingBand};
use nutriscore::view::{Notification, NotificationLevel};
use nutriscore::{AnalysisResult, ScoreDisplay};

const SCALE_WIDTH: usize = 40;

/// Print notifications to stderr
pub fn notifications(items: &[Notification]) {
    for item in items {
        let tag = match item.level {
            NotificationLevel::Info => "info",
            NotificationLevel::Success => "done",
            NotificationLevel::Error => "error",
        };
        eprintln!("[{tag}] {}: {}", item.title, item.description);
    }
}

/// Print a formatted analysis result
pub fn result(result: &AnalysisResult) {
    let display = ScoreDisplay::from_result(result);

    println!("\nYour Nutrition Analysis");
    println!("{}", "=".repeat(60));
    println!("   Good Score: {:>6}   Positive nutritional elements", display.good_ring.label);
    println!("   Bad Score:  {:>6}   Negative nutritional elements", display.bad_ring.label);
    println!(
        "   Net Score:  {:>6}   {} Health Rating",
        display.net_badge, display.rating_label
    );

    println!("\nHealth Rating Scale");
    println!("   {}", scale_bar(result.net_score));
    let legend: Vec<&str> = RatingBand::all().iter().map(|b| b.legend()).collect();
    println!("   {}", legend.join("  |  "));
    println!(
        "   Your score: {} ({} Health Rating)",
        display.net_badge, display.rating_label
    );

    let summary = &result.summary;
    println!("\nNutrition Summary");
    println!("{}", "=".repeat(60));
    println!("{}", summary.overview);
    println!("\nPositive Elements");
    for item in &summary.positive_elements {
        println!("   • {item}");
    }
    println!("\nAreas for Improvement");
    for item in &summary.areas_for_improvement {
        println!("   • {item}");
    }
    println!("\nRecommendation");
    println!("{}", summary.recommendation);

    if let Some(additives) = &result.additives_percentage {
        println!("\nAdditives: {additives}");
    }
    if let Some(sodium) = &result.sodium_percentage {
        println!("Sodium: {sodium}");
    }
    if let Some(text) = label_text(result) {
        println!("\nLabel Text");
        println!("{}", "=".repeat(60));
        println!("{text}");
    }
}

/// Text read off the label, when the backend returned any
fn label_text(result: &AnalysisResult) -> Option<&str> {
    result
        .extracted_text
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
}

/// Text rendering of the scale with the marker placed on it
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn scale_bar(net_score: f64) -> String {
    let fraction = scale_position_clamped(net_score) / 100.0;
    let marker = ((fraction * (SCALE_WIDTH - 1) as f64).round() as usize).min(SCALE_WIDTH - 1);
    (0..SCALE_WIDTH)
        .map(|i| if i == marker { '●' } else { '─' })
        .collect()
}
