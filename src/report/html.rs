// ABOUTME: Printable HTML rendering of the analysis report, kept as an alternative to the PDF
// ABOUTME: Draws SVG score rings, the rating scale, the nutrition summary, and the analyzed image
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Every backend-supplied string is HTML-escaped.

use super::Report;
use html_escape::{encode_double_quoted_attribute, encode_text};
use nutriscore_core::constants::{colors, service_names};
use nutriscore_core::formatting::{Gauge, RatingBand};
use nutriscore_core::ScoreDisplay;

/// Ring radius giving a circumference of 100 in a 36x36 view box
const RING_RADIUS: &str = "15.91549430918954";

pub(super) fn render(report: &Report<'_>) -> String {
    let display = ScoreDisplay::from_result(report.result);
    let date = report.generated_on.format("%Y-%m-%d").to_string();
    let product = service_names::PRODUCT_NAME;

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{product} Report - {date}</title>
<style>{STYLE}</style>
</head>
<body>
<main>
<h1>Your Nutrition Analysis</h1>
{image}
<section class="cards">
{good}
{bad}
{net}
</section>
{scale}
{summary}
{extras}
</main>
<footer>{product} Report - Generated on {date}</footer>
</body>
</html>
"#,
        image = render_image(report),
        good = render_card("Good Score", &display.good_ring, "Positive nutritional elements"),
        bad = render_card("Bad Score", &display.bad_ring, "Negative nutritional elements"),
        net = render_card(
            "Net Score",
            &display.net_ring,
            &format!("{} Health Rating", display.rating_label),
        ),
        scale = render_scale(&display),
        summary = render_summary(report),
        extras = render_extras(report),
    )
}

fn render_image(report: &Report<'_>) -> String {
    report.preview.map_or_else(String::new, |preview| {
        format!(
            r#"<figure><img src="{}" alt="Analyzed food"></figure>"#,
            encode_double_quoted_attribute(&preview.data_url)
        )
    })
}

fn render_summary(report: &Report<'_>) -> String {
    let summary = &report.result.summary;
    format!(
        r"<section class='summary'>
<h2>Nutrition Summary</h2>
<p>{overview}</p>
<h3>Positive Elements</h3>
{positives}
<h3>Areas for Improvement</h3>
{improvements}
<h3>Recommendation</h3>
<p>{recommendation}</p>
</section>",
        overview = encode_text(&summary.overview),
        positives = render_list(&summary.positive_elements),
        improvements = render_list(&summary.areas_for_improvement),
        recommendation = encode_text(&summary.recommendation),
    )
}

fn render_extras(report: &Report<'_>) -> String {
    let mut rows = Vec::new();
    if let Some(additives) = &report.result.additives_percentage {
        rows.push(format!("<li>Additives: {}</li>", encode_text(additives)));
    }
    if let Some(sodium) = &report.result.sodium_percentage {
        rows.push(format!("<li>Sodium: {}</li>", encode_text(sodium)));
    }
    let text = report
        .label_text()
        .map(|t| format!("<h3>Label Text</h3><pre>{}</pre>", encode_text(t)));

    if rows.is_empty() && text.is_none() {
        return String::new();
    }
    format!(
        "<section class='extras'><h2>Details</h2><ul>{}</ul>{}</section>",
        rows.concat(),
        text.unwrap_or_default()
    )
}

fn render_card(title: &str, gauge: &Gauge, caption: &str) -> String {
    format!(
        r##"<div class="card">
<h2>{title}</h2>
<svg viewBox="0 0 36 36" width="120" height="120">
<circle cx="18" cy="18" r="{RING_RADIUS}" fill="transparent" stroke="{track}" stroke-width="2"></circle>
<circle cx="18" cy="18" r="{RING_RADIUS}" fill="transparent" stroke="{color}" stroke-width="2.5" stroke-dasharray="{dash}" stroke-dashoffset="0" transform="rotate(-90 18 18)"></circle>
<text x="18" y="20" text-anchor="middle" font-size="7" fill="#1f2937">{label}</text>
</svg>
<p>{caption}</p>
</div>"##,
        track = colors::RING_TRACK,
        color = gauge.color,
        dash = gauge.dash_array,
        label = encode_text(&gauge.label),
        caption = encode_text(caption),
    )
}

fn render_scale(display: &ScoreDisplay) -> String {
    let legend: String = RatingBand::all()
        .iter()
        .map(|band| format!("<span>{}</span>", band.legend()))
        .collect();
    let left = display.marker.position.clamp(0.0, 100.0);
    format!(
        r#"<section class="scale">
<h2>Health Rating Scale</h2>
<div class="track"><div style="background:{poor};width:33%"></div><div style="background:{medium};width:34%"></div><div style="background:{good};width:33%"></div></div>
<div class="legend">{legend}</div>
<div class="marker-line"><div class="marker" style="left:{left}%;background:{marker}"></div></div>
<p>Your score: <strong>{badge}</strong> ({rating} Health Rating)</p>
</section>"#,
        poor = colors::DANGER,
        medium = colors::WARNING,
        good = colors::PRIMARY,
        marker = display.rating_color.hex(),
        badge = encode_text(&display.net_badge),
        rating = encode_text(&display.rating_label),
    )
}

fn render_list(items: &[String]) -> String {
    let entries: String = items
        .iter()
        .map(|item| format!("<li>{}</li>", encode_text(item)))
        .collect();
    format!("<ul>{entries}</ul>")
}

const STYLE: &str = "body{font-family:system-ui,sans-serif;color:#1f2937;margin:0;background:#f9fafb}\
main{max-width:900px;margin:0 auto;padding:24px}\
figure{text-align:center;margin:0 0 24px}figure img{max-height:320px;border-radius:8px}\
.cards{display:flex;gap:24px;justify-content:space-between}\
.card{flex:1;background:#fff;border-radius:12px;padding:20px;text-align:center;box-shadow:0 1px 3px rgba(0,0,0,.1)}\
.scale,.summary,.extras{background:#fff;border-radius:8px;padding:20px;margin-top:24px;box-shadow:0 1px 3px rgba(0,0,0,.1)}\
.track{display:flex;height:16px;border-radius:8px;overflow:hidden}\
.legend{display:flex;justify-content:space-between;font-size:14px;color:#4b5563;margin-top:8px}\
.marker-line{position:relative;height:2px;background:#e5e7eb;margin:24px 0 16px}\
.marker{position:absolute;top:-7px;width:16px;height:16px;border-radius:50%;transform:translateX(-50%)}\
pre{white-space:pre-wrap}\
footer{text-align:center;color:#6b7280;font-size:12px;padding:16px}\
@media print{body{background:#fff}.card,.scale,.summary,.extras{box-shadow:none}}";
