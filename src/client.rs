// ABOUTME: Upload client issuing one multipart analysis request per image
// ABOUTME: Validates uploads locally, enforces timeouts and cancellation, and validates responses
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Analysis API client
//!
//! One call, one request: [`AnalysisClient::analyze`] validates the upload,
//! sends a single multipart `POST <api-base>/analyze` with the image in the
//! `image` field, and turns the response into a validated
//! [`AnalysisResult`]. There is no retry, chunking, or resume.
//!
//! # Example
//! ```rust,no_run
//! use nutriscore::client::{AnalysisClient, NutritionAnalyzer};
//! use nutriscore::config::ClientConfig;
//! use nutriscore::upload::ImageUpload;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = AnalysisClient::new(ClientConfig::default())?;
//! let upload = ImageUpload::from_path("lunch.jpg".as_ref()).await?;
//! let result = client.analyze(&upload, &CancellationToken::new()).await?;
//! println!("net score {}", result.net_score);
//! # Ok(())
//! # }
//! ```

use crate::config::ClientConfig;
use crate::logging::AppLogger;
use crate::upload::ImageUpload;
use async_trait::async_trait;
use nutriscore_core::constants::upload::{DEFAULT_MAX_UPLOAD_BYTES, IMAGE_FIELD};
use nutriscore_core::{AnalysisResult, AppError, AppResult};
use reqwest::multipart::{Form, Part};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Anything that can turn an image into an analysis result
#[async_trait]
pub trait NutritionAnalyzer: Send + Sync {
    /// Analyze one image
    ///
    /// # Errors
    ///
    /// `InvalidFileType`/`InvalidInput` before any request, `AnalysisFailed`
    /// for transport failures and non-success responses, `ParseError` for
    /// malformed results, and `Cancelled` when `cancel` fires first
    async fn analyze(
        &self,
        upload: &ImageUpload,
        cancel: &CancellationToken,
    ) -> AppResult<AnalysisResult>;

    /// Largest image this analyzer accepts
    fn max_upload_bytes(&self) -> usize {
        DEFAULT_MAX_UPLOAD_BYTES
    }
}

/// HTTP client for the analysis endpoint
#[derive(Debug, Clone)]
pub struct AnalysisClient {
    config: ClientConfig,
    http_client: reqwest::Client,
}

impl AnalysisClient {
    /// Create a client with the configured timeouts
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built
    pub fn new(config: ClientConfig) -> AppResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            config,
            http_client,
        })
    }

    /// Client configuration
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    async fn send(&self, upload: &ImageUpload) -> AppResult<AnalysisResult> {
        let part = Part::stream_with_length(upload.bytes.clone(), upload.bytes.len() as u64)
            .file_name(upload.file_name.clone())
            .mime_str(&upload.essence())
            .map_err(|e| AppError::invalid_file_type(&upload.mime_type).with_source(e))?;
        let form = Form::new().part(IMAGE_FIELD, part);

        let url = self.config.analyze_url();
        debug!(url = %url, bytes = upload.bytes.len(), "Sending analysis request");

        let response = self
            .http_client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::analysis_failed(status.as_u16(), body));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(&e))?;
        AnalysisResult::from_json_slice(&body)
    }

    fn transport_error(&self, error: &reqwest::Error) -> AppError {
        if error.is_timeout() {
            AppError::analysis_transport(format!(
                "Analysis request timed out after {}s",
                self.config.timeout_secs
            ))
        } else if error.is_connect() {
            AppError::analysis_transport(format!("Cannot reach analysis service: {error}"))
        } else {
            AppError::analysis_transport(format!("Analysis request failed: {error}"))
        }
    }
}

#[async_trait]
impl NutritionAnalyzer for AnalysisClient {
    async fn analyze(
        &self,
        upload: &ImageUpload,
        cancel: &CancellationToken,
    ) -> AppResult<AnalysisResult> {
        upload.validate(self.config.max_upload_bytes)?;

        let started = Instant::now();
        let outcome = tokio::select! {
            () = cancel.cancelled() => Err(AppError::cancelled()),
            result = self.send(upload) => result,
        };

        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        match &outcome {
            Ok(_) => AppLogger::log_analysis(&upload.file_name, true, elapsed_ms, None),
            Err(e) => {
                AppLogger::log_analysis(&upload.file_name, false, elapsed_ms, Some(&e.message));
            }
        }
        outcome
    }

    fn max_upload_bytes(&self) -> usize {
        self.config.max_upload_bytes
    }
}
