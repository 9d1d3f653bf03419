// ABOUTME: Analysis view state machine coordinating the idle, pending, and complete phases
// ABOUTME: Owns preview, result, cancellation, and user notifications for one view instance
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Analysis view
//!
//! [`AnalysisView`] is the synchronous state machine:
//!
//! ```text
//! Idle --submit--> Pending --success--> Complete --analyze another--> Idle
//!                     |
//!                     +--failure / cancel--> Idle
//! ```
//!
//! [`AnalysisSession`] drives it against a [`NutritionAnalyzer`] on the tokio
//! runtime and publishes phase changes on a watch channel.

use crate::client::NutritionAnalyzer;
use crate::upload::{ImagePreview, ImageUpload};
use nutriscore_core::constants::upload::DEFAULT_MAX_UPLOAD_BYTES;
use nutriscore_core::{AnalysisResult, AppError, AppResult, ErrorCode, ScoreDisplay};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Shown for every failed analysis; the cause goes to the log
const FAILURE_DESCRIPTION: &str = "There was an error analyzing your image. Please try again.";

/// Phase of the view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewPhase {
    /// Waiting for an image
    Idle,
    /// One analysis in flight
    Pending,
    /// Showing a result
    Complete,
}

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    /// Progress information
    Info,
    /// Finished successfully
    Success,
    /// Something went wrong
    Error,
}

/// Transient message for the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    /// Severity
    pub level: NotificationLevel,
    /// Short headline
    pub title: String,
    /// Longer explanation
    pub description: String,
}

impl Notification {
    fn new(level: NotificationLevel, title: &str, description: impl Into<String>) -> Self {
        Self {
            level,
            title: title.to_owned(),
            description: description.into(),
        }
    }
}

/// What happened to a submission
#[derive(Debug)]
pub enum SubmitOutcome {
    /// Analysis started under this generation
    Started {
        /// Generation number of the new analysis
        generation: u64,
        /// Token that aborts the request
        cancel: CancellationToken,
    },
    /// An analysis is already in flight, submission ignored
    Busy,
    /// Upload refused before any request
    Rejected(AppError),
}

/// Synchronous view state
#[derive(Debug)]
pub struct AnalysisView {
    phase: ViewPhase,
    preview: Option<ImagePreview>,
    result: Option<AnalysisResult>,
    generation: u64,
    cancel: Option<CancellationToken>,
    notifications: VecDeque<Notification>,
    failure: Option<AppError>,
    max_upload_bytes: usize,
}

impl Default for AnalysisView {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisView {
    /// Fresh view in the `Idle` phase accepting uploads up to the default size
    #[must_use]
    pub const fn new() -> Self {
        Self::with_upload_limit(DEFAULT_MAX_UPLOAD_BYTES)
    }

    /// Fresh view refusing uploads larger than `max_upload_bytes`
    #[must_use]
    pub const fn with_upload_limit(max_upload_bytes: usize) -> Self {
        Self {
            phase: ViewPhase::Idle,
            preview: None,
            result: None,
            generation: 0,
            cancel: None,
            notifications: VecDeque::new(),
            failure: None,
            max_upload_bytes,
        }
    }

    /// Current phase
    #[must_use]
    pub const fn phase(&self) -> ViewPhase {
        self.phase
    }

    /// Preview of the image being analyzed or shown
    #[must_use]
    pub const fn preview(&self) -> Option<&ImagePreview> {
        self.preview.as_ref()
    }

    /// Result while `Complete`
    #[must_use]
    pub const fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    /// Generation of the latest submission
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Display primitives for the current result
    #[must_use]
    pub fn score_display(&self) -> Option<ScoreDisplay> {
        self.result.as_ref().map(ScoreDisplay::from_result)
    }

    /// Take all pending notifications, oldest first
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        self.notifications.drain(..).collect()
    }

    /// Take the error behind the latest failed analysis
    pub const fn take_failure(&mut self) -> Option<AppError> {
        self.failure.take()
    }

    /// Accept an image and move to `Pending`
    ///
    /// Ignored while `Pending`. Uploads with an unaccepted type, no bytes, or
    /// more than the upload limit are rejected without leaving the current
    /// phase. From `Complete` the previous result is discarded first.
    pub fn submit(&mut self, upload: &ImageUpload) -> SubmitOutcome {
        if self.phase == ViewPhase::Pending {
            debug!(generation = self.generation, "Submission ignored, analysis in flight");
            return SubmitOutcome::Busy;
        }

        if let Err(e) = upload.validate(self.max_upload_bytes) {
            debug!(file = %upload.file_name, code = %e.code, "Upload rejected: {}", e.message);
            let notification = if e.code == ErrorCode::InvalidFileType {
                Notification::new(
                    NotificationLevel::Error,
                    "Invalid file type",
                    format!("{}.", ErrorCode::InvalidFileType.description()),
                )
            } else {
                Notification::new(
                    NotificationLevel::Error,
                    "Invalid image",
                    format!("{}.", e.message),
                )
            };
            self.notifications.push_back(notification);
            return SubmitOutcome::Rejected(e);
        }

        if self.phase == ViewPhase::Complete {
            self.analyze_another();
        }

        let cancel = CancellationToken::new();
        self.generation += 1;
        self.result = None;
        self.preview = Some(ImagePreview::from_upload(upload));
        self.cancel = Some(cancel.clone());
        self.failure = None;
        self.phase = ViewPhase::Pending;
        self.notifications.push_back(Notification::new(
            NotificationLevel::Info,
            "Analyzing Image",
            "Your food image is being processed...",
        ));

        SubmitOutcome::Started {
            generation: self.generation,
            cancel,
        }
    }

    /// Apply the outcome of the analysis started under `generation`
    ///
    /// Returns `false` when the outcome is stale and was discarded.
    pub fn complete(&mut self, generation: u64, outcome: AppResult<AnalysisResult>) -> bool {
        if generation != self.generation || self.phase != ViewPhase::Pending {
            debug!(generation, current = self.generation, "Discarding stale analysis outcome");
            return false;
        }
        self.cancel = None;

        match outcome {
            Ok(result) => {
                self.result = Some(result);
                self.phase = ViewPhase::Complete;
                self.notifications.push_back(Notification::new(
                    NotificationLevel::Success,
                    "Analysis Complete",
                    "Your food image has been successfully analyzed.",
                ));
            }
            Err(e) => {
                self.preview = None;
                self.phase = ViewPhase::Idle;
                if e.code != ErrorCode::Cancelled {
                    warn!(generation, code = %e.code, "Analysis failed: {}", e.message);
                    self.notifications.push_back(Notification::new(
                        NotificationLevel::Error,
                        "Analysis Failed",
                        FAILURE_DESCRIPTION,
                    ));
                    self.failure = Some(e);
                }
            }
        }
        true
    }

    /// Leave `Complete`, discarding result and preview
    pub fn analyze_another(&mut self) -> bool {
        if self.phase != ViewPhase::Complete {
            return false;
        }
        self.result = None;
        self.preview = None;
        self.phase = ViewPhase::Idle;
        true
    }

    /// Abort the in-flight analysis
    pub fn cancel(&mut self) -> bool {
        if self.phase != ViewPhase::Pending {
            return false;
        }
        if let Some(token) = self.cancel.take() {
            token.cancel();
        }
        self.preview = None;
        self.phase = ViewPhase::Idle;
        true
    }
}

/// Point-in-time copy of the view
#[derive(Debug, Clone)]
pub struct ViewSnapshot {
    /// Phase
    pub phase: ViewPhase,
    /// Preview, if any
    pub preview: Option<ImagePreview>,
    /// Result, if any
    pub result: Option<AnalysisResult>,
    /// Latest generation
    pub generation: u64,
}

/// Runs an [`AnalysisView`] against an analyzer
pub struct AnalysisSession {
    analyzer: Arc<dyn NutritionAnalyzer>,
    view: Arc<Mutex<AnalysisView>>,
    phase_tx: watch::Sender<ViewPhase>,
}

impl AnalysisSession {
    /// Create a session in the `Idle` phase, using the analyzer's upload limit
    #[must_use]
    pub fn new(analyzer: Arc<dyn NutritionAnalyzer>) -> Self {
        let (phase_tx, _) = watch::channel(ViewPhase::Idle);
        let view = AnalysisView::with_upload_limit(analyzer.max_upload_bytes());
        Self {
            analyzer,
            view: Arc::new(Mutex::new(view)),
            phase_tx,
        }
    }

    /// Receive every phase change
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ViewPhase> {
        self.phase_tx.subscribe()
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, AnalysisView>> {
        self.view
            .lock()
            .map_err(|e| AppError::internal(format!("Lock poisoned: {e}")))
    }

    /// Submit an image and start the analysis in the background
    ///
    /// # Errors
    ///
    /// Returns an error if the view lock is poisoned
    pub fn submit(&self, upload: ImageUpload) -> AppResult<SubmitOutcome> {
        let outcome = {
            let mut view = self.lock()?;
            let outcome = view.submit(&upload);
            self.phase_tx.send_replace(view.phase());
            outcome
        };

        if let SubmitOutcome::Started { generation, cancel } = &outcome {
            info!(generation, file = %upload.file_name, "Analysis started");
            let analyzer = Arc::clone(&self.analyzer);
            let view = Arc::clone(&self.view);
            let phase_tx = self.phase_tx.clone();
            let generation = *generation;
            let cancel = cancel.clone();

            tokio::spawn(async move {
                let outcome = analyzer.analyze(&upload, &cancel).await;
                match view.lock() {
                    Ok(mut view) => {
                        if view.complete(generation, outcome) {
                            phase_tx.send_replace(view.phase());
                        }
                    }
                    Err(e) => error!("Lock poisoned while completing analysis: {e}"),
                }
            });
        }

        Ok(outcome)
    }

    /// Abort the in-flight analysis
    ///
    /// # Errors
    ///
    /// Returns an error if the view lock is poisoned
    pub fn cancel(&self) -> AppResult<bool> {
        let mut view = self.lock()?;
        let cancelled = view.cancel();
        if cancelled {
            info!(generation = view.generation(), "Analysis cancelled");
            self.phase_tx.send_replace(view.phase());
        }
        Ok(cancelled)
    }

    /// Return from `Complete` to `Idle`
    ///
    /// # Errors
    ///
    /// Returns an error if the view lock is poisoned
    pub fn analyze_another(&self) -> AppResult<bool> {
        let mut view = self.lock()?;
        let reset = view.analyze_another();
        if reset {
            self.phase_tx.send_replace(view.phase());
        }
        Ok(reset)
    }

    /// Wait until no analysis is in flight and return the settled phase
    ///
    /// # Errors
    ///
    /// Returns an error if the phase channel closed
    pub async fn settled(&self) -> AppResult<ViewPhase> {
        let mut rx = self.subscribe();
        let phase = rx
            .wait_for(|phase| *phase != ViewPhase::Pending)
            .await
            .map_err(|e| AppError::internal(format!("Phase channel closed: {e}")))?;
        Ok(*phase)
    }

    /// Copy of the current view state
    ///
    /// # Errors
    ///
    /// Returns an error if the view lock is poisoned
    pub fn snapshot(&self) -> AppResult<ViewSnapshot> {
        let view = self.lock()?;
        Ok(ViewSnapshot {
            phase: view.phase(),
            preview: view.preview().cloned(),
            result: view.result().cloned(),
            generation: view.generation(),
        })
    }

    /// Take all pending notifications
    ///
    /// # Errors
    ///
    /// Returns an error if the view lock is poisoned
    pub fn drain_notifications(&self) -> AppResult<Vec<Notification>> {
        Ok(self.lock()?.drain_notifications())
    }

    /// Take the error behind the latest failed analysis
    ///
    /// # Errors
    ///
    /// Returns an error if the view lock is poisoned
    pub fn take_failure(&self) -> AppResult<Option<AppError>> {
        Ok(self.lock()?.take_failure())
    }
}

impl Drop for AnalysisSession {
    fn drop(&mut self) {
        if let Ok(mut view) = self.view.lock() {
            view.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nutriscore_core::{HealthRating, NutritionSummary};

    fn jpeg() -> ImageUpload {
        ImageUpload::new("meal.jpg", "image/jpeg", vec![0xFF, 0xD8, 0xFF])
    }

    fn result() -> AnalysisResult {
        AnalysisResult {
            good_score: 80.0,
            bad_score: 20.0,
            net_score: 15.0,
            health_rating: HealthRating::Good,
            summary: NutritionSummary {
                overview: "Solid".into(),
                positive_elements: vec!["Fiber".into()],
                areas_for_improvement: vec![],
                recommendation: "Keep going".into(),
            },
            additives_percentage: None,
            sodium_percentage: None,
            extracted_text: None,
        }
    }

    #[test]
    fn test_happy_path() {
        let mut view = AnalysisView::new();
        let SubmitOutcome::Started { generation, .. } = view.submit(&jpeg()) else {
            panic!("expected start");
        };
        assert_eq!(view.phase(), ViewPhase::Pending);
        assert!(view.preview().is_some());
        assert!(view.complete(generation, Ok(result())));
        assert_eq!(view.phase(), ViewPhase::Complete);
        assert_eq!(view.score_display().unwrap().net_badge, "+15%");

        let titles: Vec<_> = view.drain_notifications().into_iter().map(|n| n.title).collect();
        assert_eq!(titles, vec!["Analyzing Image", "Analysis Complete"]);
    }

    #[test]
    fn test_second_submit_while_pending_is_busy() {
        let mut view = AnalysisView::new();
        assert!(matches!(view.submit(&jpeg()), SubmitOutcome::Started { .. }));
        assert!(matches!(view.submit(&jpeg()), SubmitOutcome::Busy));
        assert_eq!(view.generation(), 1);
    }

    #[test]
    fn test_failure_returns_to_idle_and_clears_preview() {
        let mut view = AnalysisView::new();
        let SubmitOutcome::Started { generation, .. } = view.submit(&jpeg()) else {
            panic!("expected start");
        };
        view.complete(generation, Err(AppError::analysis_failed(500, "boom")));
        assert_eq!(view.phase(), ViewPhase::Idle);
        assert!(view.preview().is_none());
        let last = view.drain_notifications().pop().unwrap();
        assert_eq!(last.level, NotificationLevel::Error);
        assert_eq!(last.title, "Analysis Failed");
        assert_eq!(
            last.description,
            "There was an error analyzing your image. Please try again."
        );
        let failure = view.take_failure().unwrap();
        assert_eq!(failure.upstream_status(), Some(500));
        assert!(view.take_failure().is_none());
    }

    #[test]
    fn test_cancelled_outcome_is_silent() {
        let mut view = AnalysisView::new();
        let SubmitOutcome::Started { generation, .. } = view.submit(&jpeg()) else {
            panic!("expected start");
        };
        view.complete(generation, Err(AppError::cancelled()));
        assert_eq!(view.phase(), ViewPhase::Idle);
        assert_eq!(view.drain_notifications().len(), 1);
        assert!(view.take_failure().is_none());
    }

    #[test]
    fn test_empty_upload_rejected_from_idle() {
        let mut view = AnalysisView::new();
        let empty = ImageUpload::new("meal.jpg", "image/jpeg", Vec::new());
        let SubmitOutcome::Rejected(e) = view.submit(&empty) else {
            panic!("expected rejection");
        };
        assert_eq!(e.code, ErrorCode::InvalidInput);
        assert_eq!(view.phase(), ViewPhase::Idle);
        assert_eq!(view.generation(), 0);
        let notice = view.drain_notifications().pop().unwrap();
        assert_eq!(notice.title, "Invalid image");
    }

    #[test]
    fn test_oversized_upload_rejected_and_keeps_previous_result() {
        let mut view = AnalysisView::with_upload_limit(4);
        let SubmitOutcome::Started { generation, .. } = view.submit(&jpeg()) else {
            panic!("expected start");
        };
        view.complete(generation, Ok(result()));

        let large = ImageUpload::new("meal.jpg", "image/jpeg", vec![0xFF; 5]);
        let SubmitOutcome::Rejected(e) = view.submit(&large) else {
            panic!("expected rejection");
        };
        assert_eq!(e.details["limit"], 4);
        assert_eq!(view.phase(), ViewPhase::Complete);
        assert!(view.result().is_some());
    }

    #[test]
    fn test_stale_completion_discarded_after_cancel() {
        let mut view = AnalysisView::new();
        let SubmitOutcome::Started { generation, cancel } = view.submit(&jpeg()) else {
            panic!("expected start");
        };
        assert!(view.cancel());
        assert!(cancel.is_cancelled());
        assert!(!view.complete(generation, Ok(result())));
        assert_eq!(view.phase(), ViewPhase::Idle);
    }

    #[test]
    fn test_submit_from_complete_discards_previous_result() {
        let mut view = AnalysisView::new();
        let SubmitOutcome::Started { generation, .. } = view.submit(&jpeg()) else {
            panic!("expected start");
        };
        view.complete(generation, Ok(result()));
        assert!(matches!(view.submit(&jpeg()), SubmitOutcome::Started { .. }));
        assert!(view.result().is_none());
        assert_eq!(view.phase(), ViewPhase::Pending);
    }

    #[test]
    fn test_analyze_another_only_from_complete() {
        let mut view = AnalysisView::new();
        assert!(!view.analyze_another());
        let SubmitOutcome::Started { generation, .. } = view.submit(&jpeg()) else {
            panic!("expected start");
        };
        assert!(!view.analyze_another());
        view.complete(generation, Ok(result()));
        assert!(view.analyze_another());
        assert!(view.result().is_none());
        assert!(view.preview().is_none());
    }
}
