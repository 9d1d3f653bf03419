// ABOUTME: Image upload payloads, client-side file type validation, and local previews
// ABOUTME: Builds data-URL previews that exist independently of the analysis request
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Image uploads
//!
//! An [`ImageUpload`] is what the user picked. It is validated against the
//! accepted image types before anything touches the network, and an
//! [`ImagePreview`] is derived from its bytes immediately so the preview can be
//! shown while the analysis is still running.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use nutriscore_core::constants::upload::ALLOWED_MIME_TYPES;
use nutriscore_core::{AppError, AppResult};
use std::path::Path;

/// An image selected for analysis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    /// Original file name, sent in the multipart part
    pub file_name: String,
    /// Declared MIME type
    pub mime_type: String,
    /// Raw file contents
    pub bytes: Bytes,
}

impl ImageUpload {
    /// Create an upload from in-memory contents
    pub fn new(
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Read an image file, inferring its MIME type from the extension
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read
    pub async fn from_path(path: &Path) -> AppResult<Self> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            AppError::invalid_input(format!("Cannot read {}: {e}", path.display()))
        })?;
        let mime_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_owned();
        let file_name = path
            .file_name()
            .map_or_else(|| "upload".to_owned(), |n| n.to_string_lossy().into_owned());
        Ok(Self::new(file_name, mime_type, bytes))
    }

    /// MIME type without parameters, lowercased
    #[must_use]
    pub fn essence(&self) -> String {
        self.mime_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_lowercase()
    }

    /// Whether the declared type is one of the accepted image types
    #[must_use]
    pub fn has_allowed_type(&self) -> bool {
        is_allowed_mime_type(&self.mime_type)
    }

    /// Check type and size before any network call
    ///
    /// # Errors
    ///
    /// Returns `InvalidFileType` for unaccepted types and `InvalidInput` for
    /// empty or oversized payloads
    pub fn validate(&self, max_bytes: usize) -> AppResult<()> {
        if !self.has_allowed_type() {
            return Err(AppError::invalid_file_type(&self.mime_type));
        }
        if self.bytes.is_empty() {
            return Err(AppError::invalid_input("No image selected for uploading"));
        }
        if self.bytes.len() > max_bytes {
            return Err(AppError::invalid_input(format!(
                "Image is {} bytes, the limit is {max_bytes}",
                self.bytes.len()
            ))
            .with_details(serde_json::json!({
                "size": self.bytes.len(),
                "limit": max_bytes
            })));
        }
        Ok(())
    }
}

/// Whether a MIME type is accepted for analysis
#[must_use]
pub fn is_allowed_mime_type(mime_type: &str) -> bool {
    let essence = mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase();
    ALLOWED_MIME_TYPES.contains(&essence.as_str())
}

/// Locally rendered preview of an upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePreview {
    /// MIME type of the previewed image
    pub mime_type: String,
    /// `data:` URL embedding the image
    pub data_url: String,
}

impl ImagePreview {
    /// Build a preview from an upload
    #[must_use]
    pub fn from_upload(upload: &ImageUpload) -> Self {
        let mime_type = upload.essence();
        let data_url = format!("data:{mime_type};base64,{}", STANDARD.encode(&upload.bytes));
        Self {
            mime_type,
            data_url,
        }
    }
}
