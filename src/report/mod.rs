// ABOUTME: Downloadable analysis report, rendered as an A4 PDF by default or as printable HTML
// ABOUTME: Names reports by generation date and writes them to a file or into a directory
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Report export
//!
//! The report mirrors the results view: the three scores, the health rating
//! scale with its marker, the nutrition summary and a dated footer. The HTML
//! rendering also embeds the analyzed image.

mod html;
mod pdf;

use crate::upload::ImagePreview;
use chrono::{Local, NaiveDate};
use nutriscore_core::constants::service_names;
use nutriscore_core::{AnalysisResult, AppResult};
use std::path::{Path, PathBuf};
use tracing::info;

/// Output document type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    /// A4 portrait PDF
    #[default]
    Pdf,
    /// Self-contained printable HTML page
    Html,
}

impl ReportFormat {
    /// File extension without the dot
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Html => "html",
        }
    }
}

/// File name of a report generated on `date`
#[must_use]
pub fn report_file_name(date: NaiveDate, format: ReportFormat) -> String {
    format!(
        "{}_Report_{}.{}",
        service_names::PRODUCT_NAME,
        date.format("%Y-%m-%d"),
        format.extension()
    )
}

/// Report for one analysis result
#[derive(Debug, Clone)]
pub struct Report<'a> {
    result: &'a AnalysisResult,
    preview: Option<&'a ImagePreview>,
    generated_on: NaiveDate,
    format: ReportFormat,
}

impl<'a> Report<'a> {
    /// PDF report dated today
    #[must_use]
    pub fn new(result: &'a AnalysisResult, preview: Option<&'a ImagePreview>) -> Self {
        Self {
            result,
            preview,
            generated_on: Local::now().date_naive(),
            format: ReportFormat::default(),
        }
    }

    /// Override the generation date
    #[must_use]
    pub const fn dated(mut self, date: NaiveDate) -> Self {
        self.generated_on = date;
        self
    }

    /// Choose the output document type
    #[must_use]
    pub const fn with_format(mut self, format: ReportFormat) -> Self {
        self.format = format;
        self
    }

    /// Default file name for this report
    #[must_use]
    pub fn file_name(&self) -> String {
        report_file_name(self.generated_on, self.format)
    }

    /// Render the HTML document
    #[must_use]
    pub fn render_html(&self) -> String {
        html::render(self)
    }

    /// Render the PDF document
    ///
    /// # Errors
    ///
    /// Returns an error if the PDF cannot be assembled
    pub fn render_pdf(&self) -> AppResult<Vec<u8>> {
        pdf::render(self)
    }

    /// Render in the chosen format
    ///
    /// # Errors
    ///
    /// Returns an error if the PDF cannot be assembled
    pub fn render(&self) -> AppResult<Vec<u8>> {
        match self.format {
            ReportFormat::Pdf => self.render_pdf(),
            ReportFormat::Html => Ok(self.render_html().into_bytes()),
        }
    }

    /// Write the report to `path`, or into `path` when it is a directory
    ///
    /// # Errors
    ///
    /// Returns an error if the report cannot be rendered or the file cannot be written
    pub async fn write_to(&self, path: &Path) -> AppResult<PathBuf> {
        let target = if tokio::fs::metadata(path)
            .await
            .is_ok_and(|meta| meta.is_dir())
        {
            path.join(self.file_name())
        } else {
            path.to_path_buf()
        };
        let document = self.render()?;
        tokio::fs::write(&target, document).await?;
        info!(path = %target.display(), format = self.format.extension(), "Report written");
        Ok(target)
    }

    /// Label text worth printing
    fn label_text(&self) -> Option<&'a str> {
        self.result
            .extracted_text
            .as_deref()
            .filter(|t| !t.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_uses_iso_date() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        assert_eq!(
            report_file_name(date, ReportFormat::Pdf),
            "NutriScore_Report_2025-03-07.pdf"
        );
        assert_eq!(
            report_file_name(date, ReportFormat::Html),
            "NutriScore_Report_2025-03-07.html"
        );
    }
}
