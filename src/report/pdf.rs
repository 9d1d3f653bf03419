// ABOUTME: PDF rendering of the analysis report on A4 portrait pages with built-in Helvetica
// ABOUTME: Draws score bars, the rating scale with its marker, the summary, and a dated footer
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Layout runs top to bottom with a cursor in millimetres. A new page is
//! started whenever the next block would cross into the footer area, and every
//! page carries the footer.

use super::Report;
use nutriscore_core::constants::{colors, service_names};
use nutriscore_core::formatting::{Gauge, RatingBand};
use nutriscore_core::{AppError, AppResult, ScoreDisplay};
use printpdf::{
    path::{PaintMode, WindingOrder},
    BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Point, Polygon, Rgb,
};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 20.0;
const CONTENT_WIDTH: f32 = PAGE_WIDTH - MARGIN - MARGIN;
const FOOTER_Y: f32 = 10.0;
/// Lowest baseline body text may use
const BODY_FLOOR: f32 = 22.0;
const LINE_HEIGHT: f32 = 6.0;
/// Characters per 11pt line across the content width
const WRAP_CHARS: usize = 85;
/// Average Helvetica glyph width as a share of the font size
const GLYPH_WIDTH: f32 = 0.5;
const PT_TO_MM: f32 = 0.3528;

const TEXT_COLOR: &str = "#1f2937";
const FOOTER_COLOR: &str = "#646464";
const CAPTION_COLOR: &str = "#6b7280";

pub(super) fn render(report: &Report<'_>) -> AppResult<Vec<u8>> {
    layout(report)?.finish()
}

fn layout(report: &Report<'_>) -> AppResult<PdfWriter> {
    let display = ScoreDisplay::from_result(report.result);
    let date = report.generated_on.format("%Y-%m-%d");
    let product = service_names::PRODUCT_NAME;

    let mut pdf = PdfWriter::new(
        &format!("{product} Report - {date}"),
        format!("{product} Report - Generated on {date}"),
    )?;

    pdf.cursor -= 4.0;
    pdf.text_centered("Your Nutrition Analysis", 20.0, TEXT_COLOR);
    pdf.cursor -= 6.0;

    pdf.gauge("Good Score", &display.good_ring, "Positive nutritional elements");
    pdf.gauge("Bad Score", &display.bad_ring, "Negative nutritional elements");
    pdf.gauge(
        "Net Score",
        &display.net_ring,
        &format!("{} Health Rating", display.rating_label),
    );
    pdf.scale(&display);

    let summary = &report.result.summary;
    pdf.heading("Nutrition Summary");
    pdf.paragraph(&summary.overview);
    pdf.subheading("Positive Elements");
    pdf.bullets(&summary.positive_elements);
    pdf.subheading("Areas for Improvement");
    pdf.bullets(&summary.areas_for_improvement);
    pdf.subheading("Recommendation");
    pdf.paragraph(&summary.recommendation);

    let mut details = Vec::new();
    if let Some(additives) = &report.result.additives_percentage {
        details.push(format!("Additives: {additives}"));
    }
    if let Some(sodium) = &report.result.sodium_percentage {
        details.push(format!("Sodium: {sodium}"));
    }
    let label_text = report.label_text();
    if !details.is_empty() || label_text.is_some() {
        pdf.heading("Details");
        pdf.bullets(&details);
        if let Some(text) = label_text {
            pdf.subheading("Label Text");
            pdf.paragraph(text);
        }
    }

    Ok(pdf)
}

struct PdfWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    footer: String,
    /// Baseline of the last line drawn, from the bottom edge
    cursor: f32,
    pages: usize,
}

impl PdfWriter {
    fn new(title: &str, footer: String) -> AppResult<Self> {
        let (doc, page, layer) =
            PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(pdf_error)?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(pdf_error)?;
        let layer = doc.get_page(page).get_layer(layer);
        let writer = Self {
            doc,
            layer,
            regular,
            bold,
            footer,
            cursor: PAGE_HEIGHT - MARGIN,
            pages: 1,
        };
        writer.draw_footer();
        Ok(writer)
    }

    fn finish(self) -> AppResult<Vec<u8>> {
        self.doc.save_to_bytes().map_err(pdf_error)
    }

    fn ensure_space(&mut self, height: f32) {
        if self.cursor - height >= BODY_FLOOR {
            return;
        }
        let (page, layer) = self
            .doc
            .add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.cursor = PAGE_HEIGHT - MARGIN;
        self.pages += 1;
        self.draw_footer();
    }

    fn draw_footer(&self) {
        let x = centered_x(&self.footer, 10.0);
        self.text(&self.footer, 10.0, x, FOOTER_Y, Weight::Regular, FOOTER_COLOR);
    }

    fn text(&self, text: &str, size: f32, x: f32, y: f32, weight: Weight, color: &str) {
        self.layer.set_fill_color(rgb(color));
        let font = match weight {
            Weight::Regular => &self.regular,
            Weight::Bold => &self.bold,
        };
        self.layer.use_text(text, size, Mm(x), Mm(y), font);
    }

    fn text_centered(&mut self, text: &str, size: f32, color: &str) {
        self.ensure_space(size * PT_TO_MM);
        self.cursor -= size * PT_TO_MM;
        self.text(text, size, centered_x(text, size), self.cursor, Weight::Bold, color);
    }

    fn rect(&self, x: f32, y: f32, width: f32, height: f32, color: &str) {
        let corners = [(x, y), (x + width, y), (x + width, y + height), (x, y + height)];
        self.layer.set_fill_color(rgb(color));
        self.layer.add_polygon(Polygon {
            rings: vec![corners
                .iter()
                .map(|&(px, py)| (Point::new(Mm(px), Mm(py)), false))
                .collect()],
            mode: PaintMode::Fill,
            winding_order: WindingOrder::NonZero,
        });
    }

    fn heading(&mut self, text: &str) {
        self.ensure_space(14.0 + LINE_HEIGHT);
        self.cursor -= 12.0;
        self.text(text, 14.0, MARGIN, self.cursor, Weight::Bold, TEXT_COLOR);
        self.cursor -= 2.0;
    }

    fn subheading(&mut self, text: &str) {
        self.ensure_space(8.0 + LINE_HEIGHT);
        self.cursor -= 8.0;
        self.text(text, 12.0, MARGIN, self.cursor, Weight::Bold, TEXT_COLOR);
    }

    fn paragraph(&mut self, text: &str) {
        for line in wrap(text, WRAP_CHARS) {
            self.ensure_space(LINE_HEIGHT);
            self.cursor -= LINE_HEIGHT;
            self.text(&line, 11.0, MARGIN, self.cursor, Weight::Regular, TEXT_COLOR);
        }
    }

    fn bullets(&mut self, items: &[String]) {
        for item in items {
            for (index, line) in wrap(item, WRAP_CHARS - 4).iter().enumerate() {
                self.ensure_space(LINE_HEIGHT);
                self.cursor -= LINE_HEIGHT;
                if index == 0 {
                    self.text("-", 11.0, MARGIN + 2.0, self.cursor, Weight::Regular, TEXT_COLOR);
                }
                self.text(line, 11.0, MARGIN + 7.0, self.cursor, Weight::Regular, TEXT_COLOR);
            }
        }
    }

    fn gauge(&mut self, title: &str, gauge: &Gauge, caption: &str) {
        self.ensure_space(24.0);
        self.cursor -= 7.0;
        self.text(title, 12.0, MARGIN, self.cursor, Weight::Bold, TEXT_COLOR);
        let label_x = PAGE_WIDTH - MARGIN - text_width(&gauge.label, 12.0);
        self.text(&gauge.label, 12.0, label_x, self.cursor, Weight::Bold, gauge.color);

        self.cursor -= 7.0;
        self.rect(MARGIN, self.cursor, CONTENT_WIDTH, 4.0, colors::RING_TRACK);
        let filled = CONTENT_WIDTH * share(gauge.fraction / 100.0);
        if filled > 0.0 {
            self.rect(MARGIN, self.cursor, filled, 4.0, gauge.color);
        }

        self.cursor -= 5.0;
        self.text(caption, 9.0, MARGIN, self.cursor, Weight::Regular, CAPTION_COLOR);
        self.cursor -= 3.0;
    }

    fn scale(&mut self, display: &ScoreDisplay) {
        self.heading("Health Rating Scale");
        self.ensure_space(34.0);

        let third = CONTENT_WIDTH / 3.0;
        let bands = [colors::DANGER, colors::WARNING, colors::PRIMARY];
        self.cursor -= 12.0;
        for (offset, color) in [0.0_f32, 1.0, 2.0].into_iter().zip(bands) {
            self.rect(offset.mul_add(third, MARGIN), self.cursor, third, 5.0, color);
        }

        let marker_x = CONTENT_WIDTH.mul_add(share(display.marker.position / 100.0), MARGIN);
        self.rect(marker_x - 1.5, self.cursor - 2.0, 3.0, 9.0, display.rating_color.hex());

        self.cursor -= 7.0;
        for (offset, band) in [0.0_f32, 1.0, 2.0].into_iter().zip(RatingBand::all()) {
            let center = offset.mul_add(third, MARGIN + third / 2.0);
            let x = center - text_width(band.legend(), 9.0) / 2.0;
            self.text(band.legend(), 9.0, x, self.cursor, Weight::Regular, CAPTION_COLOR);
        }

        self.cursor -= 9.0;
        let line = format!(
            "Your score: {} ({} Health Rating)",
            display.net_badge, display.rating_label
        );
        self.text(&line, 12.0, MARGIN, self.cursor, Weight::Bold, display.rating_color.hex());
    }
}

#[derive(Clone, Copy)]
enum Weight {
    Regular,
    Bold,
}

fn pdf_error(e: printpdf::Error) -> AppError {
    AppError::internal(format!("PDF rendering failed: {e}"))
}

/// Clamp a ratio to `0..=1` for drawing
#[allow(clippy::cast_possible_truncation)]
fn share(ratio: f64) -> f32 {
    ratio.clamp(0.0, 1.0) as f32
}

fn text_width(text: &str, size: f32) -> f32 {
    let glyphs = u16::try_from(text.chars().count()).unwrap_or(u16::MAX);
    f32::from(glyphs) * size * GLYPH_WIDTH * PT_TO_MM
}

fn centered_x(text: &str, size: f32) -> f32 {
    ((PAGE_WIDTH - text_width(text, size)) / 2.0).max(MARGIN)
}

/// `#rrggbb` to a PDF fill color, black when malformed
fn rgb(hex: &str) -> Color {
    let digits = hex.trim_start_matches('#');
    let channel = |at: usize| {
        digits
            .get(at..at + 2)
            .and_then(|pair| u8::from_str_radix(pair, 16).ok())
            .map_or(0.0, |value| f32::from(value) / 255.0)
    };
    Color::Rgb(Rgb::new(channel(0), channel(2), channel(4), None))
}

/// Greedy word wrap that keeps the source line breaks
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for source in text.lines() {
        let mut line = String::new();
        for word in source.split_whitespace() {
            if !line.is_empty() && line.chars().count() + 1 + word.chars().count() > width {
                lines.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(word);
        }
        lines.push(line);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use nutriscore_core::AnalysisResult;

    fn result(overview: &str) -> AnalysisResult {
        let payload = serde_json::json!({
            "goodScore": 80,
            "badScore": 20,
            "netScore": 15,
            "healthRating": "Good",
            "summary": {
                "overview": overview,
                "positiveElements": ["Contains fiber"],
                "areasForImprovement": ["Watch portion sizes"],
                "recommendation": "Enjoy in moderation."
            }
        });
        AnalysisResult::from_json_slice(payload.to_string().as_bytes()).unwrap()
    }

    #[test]
    fn test_wrap_respects_width_and_line_breaks() {
        let lines = wrap("one two three four\nfive", 9);
        assert_eq!(lines, vec!["one two", "three", "four", "five"]);
        assert!(wrap("", 10).is_empty());
    }

    #[test]
    fn test_rgb_parses_hex_and_falls_back_to_black() {
        let Color::Rgb(green) = rgb(colors::PRIMARY) else {
            panic!("expected an RGB color");
        };
        assert!((green.g - 185.0 / 255.0).abs() < f32::EPSILON);
        let Color::Rgb(black) = rgb("#zz") else {
            panic!("expected an RGB color");
        };
        assert!(black.r.abs() < f32::EPSILON);
    }

    #[test]
    fn test_short_report_fits_one_page() {
        let result = result("Balanced meal.");
        let date = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        let writer = layout(&Report::new(&result, None).dated(date)).unwrap();
        assert_eq!(writer.pages, 1);
    }

    #[test]
    fn test_long_summary_continues_on_new_pages() {
        let overview = "A long observation about this meal. ".repeat(400);
        let result = result(&overview);
        let date = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        let writer = layout(&Report::new(&result, None).dated(date)).unwrap();
        assert!(writer.pages > 1, "{} pages", writer.pages);
        assert!(writer.cursor >= BODY_FLOOR);
    }
}
