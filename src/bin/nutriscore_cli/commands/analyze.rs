// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
// ABOUTME: Analyze command driving one image through the analysis view
// ABOUTME: Prints notifications and results, cancels on Ctrl+C, and writes the optional report

use crate::helpers::display;
use nutriscore::client::AnalysisClient;
use nutriscore::config::ClientConfig;
use nutriscore::report::{Report, ReportFormat};
use nutriscore::upload::ImageUpload;
use nutriscore::view::{AnalysisSession, SubmitOutcome, ViewPhase};
use nutriscore::{AppError, AppResult, ErrorCode};
use std::path::Path;
use std::sync::Arc;

/// Analyze `file` and print or export the result
pub async fn run(
    config: ClientConfig,
    file: &Path,
    report: Option<(&Path, ReportFormat)>,
    json: bool,
) -> AppResult<()> {
    let upload = ImageUpload::from_path(file).await?;
    let session = AnalysisSession::new(Arc::new(AnalysisClient::new(config)?));

    match session.submit(upload)? {
        SubmitOutcome::Started { .. } => {}
        SubmitOutcome::Rejected(e) => {
            display::notifications(&session.drain_notifications()?);
            return Err(e);
        }
        SubmitOutcome::Busy => {
            return Err(AppError::internal("A fresh session cannot be busy"));
        }
    }
    display::notifications(&session.drain_notifications()?);

    let phase = tokio::select! {
        phase = session.settled() => phase?,
        _ = tokio::signal::ctrl_c() => {
            session.cancel()?;
            return Err(AppError::cancelled());
        }
    };

    display::notifications(&session.drain_notifications()?);

    let snapshot = session.snapshot()?;
    let (ViewPhase::Complete, Some(result)) = (phase, snapshot.result) else {
        return Err(session.take_failure()?.unwrap_or_else(|| {
            AppError::new(ErrorCode::AnalysisFailed, "Analysis did not complete")
        }));
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        display::result(&result);
    }

    if let Some((path, format)) = report {
        let written = Report::new(&result, snapshot.preview.as_ref())
            .with_format(format)
            .write_to(path)
            .await?;
        println!("\nReport saved to {}", written.display());
    }
    Ok(())
}
