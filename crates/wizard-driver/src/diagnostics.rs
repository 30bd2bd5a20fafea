//! Failure diagnostics capture
//!
//! On an unrecoverable step failure the capturer gathers a page snapshot, a
//! screenshot, the current URL/title and the full attempt log into one
//! failure record and hands it to the persistence collaborator. Capture is
//! strictly best-effort: its own failures are logged, never escalated, and
//! the original FAILED status stands regardless.

use std::path::PathBuf;
use std::sync::Arc;

use adpilot_core_types::ProfileId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use selector_catalog::Locale;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::context::{SessionContext, StepAttemptRecord};

/// Structured evidence for one failed run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FailureRecord {
    pub profile: ProfileId,
    pub step: String,
    pub locale: Locale,
    pub locales_tried: Vec<Locale>,
    pub reason: String,
    pub url: Option<String>,
    pub title: Option<String>,
    pub attempts: Vec<StepAttemptRecord>,
    pub screenshot_path: Option<PathBuf>,
    pub page_source_path: Option<PathBuf>,
    pub at: DateTime<Utc>,
}

/// Artifact locations reported back by a sink.
#[derive(Clone, Debug, Default)]
pub struct DiagnosticsPaths {
    pub screenshot: Option<PathBuf>,
    pub page_source: Option<PathBuf>,
    pub record: Option<PathBuf>,
}

/// Errors raised by a diagnostics sink. Logged by the capturer, never
/// propagated further.
#[derive(Debug, Error)]
pub enum DiagnosticsError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize failure record: {0}")]
    Serialize(String),
}

/// Append-only persistence collaborator for failure evidence.
#[async_trait]
pub trait DiagnosticsSink: Send + Sync {
    async fn persist(
        &self,
        record: &FailureRecord,
        screenshot: Option<&[u8]>,
        page_source: Option<&str>,
    ) -> Result<DiagnosticsPaths, DiagnosticsError>;
}

/// Sink that drops everything; used when evidence persistence is disabled.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullDiagnosticsSink;

#[async_trait]
impl DiagnosticsSink for NullDiagnosticsSink {
    async fn persist(
        &self,
        _record: &FailureRecord,
        _screenshot: Option<&[u8]>,
        _page_source: Option<&str>,
    ) -> Result<DiagnosticsPaths, DiagnosticsError> {
        Ok(DiagnosticsPaths::default())
    }
}

/// Filesystem sink: `<root>/<profile>/<timestamp>-<step>.{png,html,json}`.
pub struct FsDiagnosticsSink {
    root: PathBuf,
}

impl FsDiagnosticsSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn artifact_stem(&self, record: &FailureRecord) -> PathBuf {
        let dir = self.root.join(&record.profile.0);
        dir.join(format!(
            "{}-{}",
            record.at.format("%Y%m%dT%H%M%S%3f"),
            record.step
        ))
    }
}

#[async_trait]
impl DiagnosticsSink for FsDiagnosticsSink {
    async fn persist(
        &self,
        record: &FailureRecord,
        screenshot: Option<&[u8]>,
        page_source: Option<&str>,
    ) -> Result<DiagnosticsPaths, DiagnosticsError> {
        let stem = self.artifact_stem(record);
        if let Some(parent) = stem.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut paths = DiagnosticsPaths::default();
        if let Some(bytes) = screenshot {
            let path = stem.with_extension("png");
            tokio::fs::write(&path, bytes).await?;
            paths.screenshot = Some(path);
        }
        if let Some(source) = page_source {
            let path = stem.with_extension("html");
            tokio::fs::write(&path, source).await?;
            paths.page_source = Some(path);
        }

        let mut on_disk = record.clone();
        on_disk.screenshot_path = paths.screenshot.clone();
        on_disk.page_source_path = paths.page_source.clone();
        let json = serde_json::to_vec_pretty(&on_disk)
            .map_err(|err| DiagnosticsError::Serialize(err.to_string()))?;
        let record_path = stem.with_extension("json");
        tokio::fs::write(&record_path, json).await?;
        paths.record = Some(record_path);
        Ok(paths)
    }
}

/// Gathers evidence on a FAILED transition and persists it before the
/// session is released.
pub struct DiagnosticsCapturer {
    sink: Arc<dyn DiagnosticsSink>,
}

impl DiagnosticsCapturer {
    pub fn new(sink: Arc<dyn DiagnosticsSink>) -> Self {
        Self { sink }
    }

    /// Build and persist a failure record. Never raises.
    pub async fn capture(&self, ctx: &SessionContext, step: &str, reason: &str) -> FailureRecord {
        let driver = ctx.driver();
        let url = match driver.current_url().await {
            Ok(url) => Some(url),
            Err(err) => {
                warn!("failed to read url for diagnostics: {err}");
                None
            }
        };
        let title = driver.title().await.ok();
        let screenshot = match driver.screenshot().await {
            Ok(bytes) => Some(bytes),
            Err(err) => {
                warn!("failed to capture screenshot: {err}");
                None
            }
        };
        let page_source = match driver.page_source().await {
            Ok(source) => Some(source),
            Err(err) => {
                warn!("failed to capture page source: {err}");
                None
            }
        };

        let mut record = FailureRecord {
            profile: ctx.profile().clone(),
            step: step.to_string(),
            locale: ctx.locale(),
            locales_tried: ctx.locales_tried(),
            reason: reason.to_string(),
            url,
            title,
            attempts: ctx.attempts().to_vec(),
            screenshot_path: None,
            page_source_path: None,
            at: Utc::now(),
        };

        match self
            .sink
            .persist(&record, screenshot.as_deref(), page_source.as_deref())
            .await
        {
            Ok(paths) => {
                record.screenshot_path = paths.screenshot;
                record.page_source_path = paths.page_source;
                info!(profile = %record.profile, step, "failure evidence persisted");
            }
            Err(err) => {
                warn!(profile = %record.profile, step, "diagnostics capture failed: {err}");
            }
        }
        record
    }
}
