// ABOUTME: Unified error type with standard error codes for the NutriScore service
// ABOUTME: Maps upload, analysis, parsing, and proxy failures to HTTP status codes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Unified Error Handling System
//!
//! Every failure in the workspace is an [`AppError`] tagged with an
//! [`ErrorCode`]. The code decides the HTTP status and the wire name; the
//! message and the JSON details carry the specifics (for an analysis failure,
//! the backend status code and response body).

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Standard error codes used throughout the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Client-side validation (no request sent)
    /// Upload is not a JPEG or PNG image
    InvalidFileType,
    /// Input rejected before any processing
    InvalidInput,
    /// Request body exceeds the configured limit
    PayloadTooLarge,

    // Analysis round trip
    /// Backend answered with a non-success status, or the transport failed
    AnalysisFailed,
    /// Backend answered 2xx with a body that is not a valid analysis result
    ParseError,
    /// The in-flight analysis was abandoned by the caller
    Cancelled,

    // Proxy and backend process
    /// The proxied analysis process could not be reached
    ProxyUnavailable,
    /// The supervised backend process failed to start or stop
    BackendProcess,

    // Configuration and internals
    /// Configuration value is missing or invalid
    ConfigInvalid,
    /// Requested resource does not exist
    ResourceNotFound,
    /// Anything else
    InternalError,
}

impl ErrorCode {
    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::InvalidInput | Self::Cancelled => 400,
            Self::ResourceNotFound => 404,
            Self::PayloadTooLarge => 413,
            Self::InvalidFileType => 415,
            Self::AnalysisFailed | Self::ParseError | Self::ProxyUnavailable => 502,
            Self::BackendProcess | Self::ConfigInvalid | Self::InternalError => 500,
        }
    }

    /// Get a user-friendly description of this error
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::InvalidFileType => "Please upload a JPG, PNG, or JPEG image",
            Self::InvalidInput => "The provided input is invalid",
            Self::PayloadTooLarge => "The request body is too large",
            Self::AnalysisFailed => "The food image could not be analyzed",
            Self::ParseError => "The analysis service returned an unreadable result",
            Self::Cancelled => "The analysis was cancelled",
            Self::ProxyUnavailable => "The analysis service is currently unavailable",
            Self::BackendProcess => "The analysis process could not be managed",
            Self::ConfigInvalid => "Configuration is invalid",
            Self::ResourceNotFound => "The requested resource was not found",
            Self::InternalError => "An internal server error occurred",
        }
    }

    /// Wire name of the code, as serialized in error responses
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidFileType => "INVALID_FILE_TYPE",
            Self::InvalidInput => "INVALID_INPUT",
            Self::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            Self::AnalysisFailed => "ANALYSIS_FAILED",
            Self::ParseError => "PARSE_ERROR",
            Self::Cancelled => "CANCELLED",
            Self::ProxyUnavailable => "PROXY_UNAVAILABLE",
            Self::BackendProcess => "BACKEND_PROCESS",
            Self::ConfigInvalid => "CONFIG_INVALID",
            Self::ResourceNotFound => "RESOURCE_NOT_FOUND",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unified error type for the application
#[derive(Debug, Error)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Structured details (status codes, offending values)
    pub details: serde_json::Value,
    /// Source error for error chaining
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new `AppError` with the given code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: serde_json::Value::Null,
            source: None,
        }
    }

    /// Attach structured details
    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }

    /// Add a source error for error chaining
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        self.code.http_status()
    }

    /// Backend status code carried by an `AnalysisFailed` error, if any
    #[must_use]
    pub fn upstream_status(&self) -> Option<u16> {
        self.details
            .get("status")
            .and_then(serde_json::Value::as_u64)
            .and_then(|s| u16::try_from(s).ok())
    }

    /// Backend response body carried by an `AnalysisFailed` error, if any
    #[must_use]
    pub fn upstream_body(&self) -> Option<&str> {
        self.details.get("body").and_then(serde_json::Value::as_str)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// Convenience constructors for the error taxonomy
impl AppError {
    /// Upload rejected because of its MIME type
    pub fn invalid_file_type(mime_type: impl Into<String>) -> Self {
        let mime_type = mime_type.into();
        Self::new(
            ErrorCode::InvalidFileType,
            format!("Unsupported file type '{mime_type}'"),
        )
        .with_details(serde_json::json!({ "mime_type": mime_type }))
    }

    /// Invalid input
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Request body over `limit` bytes
    pub fn payload_too_large(limit: usize) -> Self {
        Self::new(
            ErrorCode::PayloadTooLarge,
            format!("Request body exceeds {limit} bytes"),
        )
        .with_details(serde_json::json!({ "limit": limit }))
    }

    /// Backend answered with a non-success status
    pub fn analysis_failed(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        Self::new(
            ErrorCode::AnalysisFailed,
            format!("Analysis failed: {status} {body}"),
        )
        .with_details(serde_json::json!({ "status": status, "body": body }))
    }

    /// Analysis request never produced a response (connect error, timeout)
    pub fn analysis_transport(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::AnalysisFailed, message)
    }

    /// Success response that does not hold a valid analysis result
    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ParseError, message)
    }

    /// Caller abandoned the analysis
    pub fn cancelled() -> Self {
        Self::new(ErrorCode::Cancelled, "Analysis request cancelled")
    }

    /// Proxy could not reach the analysis process
    pub fn proxy_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ProxyUnavailable, message)
    }

    /// Backend child process management failure
    pub fn backend_process(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BackendProcess, message)
    }

    /// Configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigInvalid, message)
    }

    /// Resource not found
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ResourceNotFound,
            format!("{} not found", resource.into()),
        )
    }

    /// Internal server error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::parse(format!("Invalid analysis payload: {error}")).with_source(error)
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::internal(error.to_string()).with_source(error)
    }
}

/// HTTP error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error payload
    pub error: ErrorResponseDetails,
}

/// Body of an [`ErrorResponse`]
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponseDetails {
    /// Machine-readable code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Structured details, omitted when empty
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub details: serde_json::Value,
}

impl From<&AppError> for ErrorResponse {
    fn from(error: &AppError) -> Self {
        Self {
            error: ErrorResponseDetails {
                code: error.code,
                message: error.message.clone(),
                details: error.details.clone(),
            },
        }
    }
}

#[cfg(feature = "http-response")]
impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = http::StatusCode::from_u16(self.http_status())
            .unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::warn!(error.code = %self.code, error.message = %self.message, "Request failed");
        }
        (status, axum::Json(ErrorResponse::from(&self))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_http_status() {
        assert_eq!(ErrorCode::InvalidFileType.http_status(), 415);
        assert_eq!(ErrorCode::PayloadTooLarge.http_status(), 413);
        assert_eq!(ErrorCode::AnalysisFailed.http_status(), 502);
        assert_eq!(ErrorCode::ProxyUnavailable.http_status(), 502);
        assert_eq!(ErrorCode::InternalError.http_status(), 500);
    }

    #[test]
    fn test_analysis_failed_carries_status_and_body() {
        let error = AppError::analysis_failed(500, "Something went wrong");
        assert_eq!(error.code, ErrorCode::AnalysisFailed);
        assert_eq!(error.upstream_status(), Some(500));
        assert_eq!(error.upstream_body(), Some("Something went wrong"));
        assert_eq!(error.message, "Analysis failed: 500 Something went wrong");
    }

    #[test]
    fn test_error_response_serialization() {
        let error = AppError::proxy_unavailable("connection refused");
        let json = serde_json::to_value(ErrorResponse::from(&error)).unwrap();
        assert_eq!(json["error"]["code"], "PROXY_UNAVAILABLE");
        assert_eq!(json["error"]["message"], "connection refused");
        assert!(json["error"].get("details").is_none());
    }

    #[test]
    fn test_wire_names_match_serde() {
        for code in [
            ErrorCode::InvalidFileType,
            ErrorCode::ParseError,
            ErrorCode::Cancelled,
            ErrorCode::BackendProcess,
        ] {
            let serialized = serde_json::to_value(code).unwrap();
            assert_eq!(serialized, code.as_str());
        }
    }
}
