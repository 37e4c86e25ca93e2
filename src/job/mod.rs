//! Job state and the single-slot job registry.
//!
//! One batch job runs at a time. A submission while another job is live is
//! rejected rather than queued, so two subprocesses can never interleave
//! their output on the shared event bus.

pub mod runner;

pub use runner::JobRunner;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::resolver::FALLBACK_TITLE;

/// Why a submission was not accepted.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("Playlist URL is required")]
    EmptySource,
    #[error("A download is already in progress")]
    JobInProgress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Resolving,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// State of one playlist-to-audio batch run.
#[derive(Debug, Clone, Serialize)]
pub struct JobState {
    pub id: Uuid,
    pub playlist_url: String,
    pub title: String,
    /// Item count from the metadata probe; `None` in degraded mode.
    pub expected_items: Option<usize>,
    /// Output files the conversion tool reported writing.
    pub converted: u32,
    /// Source URLs of items skipped as unavailable, in skip order. Only
    /// grows while Running; read-only once the job is terminal.
    pub skipped: Vec<String>,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl JobState {
    pub fn new(playlist_url: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            playlist_url: playlist_url.into(),
            title: FALLBACK_TITLE.to_string(),
            expected_items: None,
            converted: 0,
            skipped: Vec::new(),
            status: JobStatus::Pending,
            created_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn complete(&mut self) {
        self.status = JobStatus::Completed;
        self.finished_at = Some(Utc::now());
    }

    pub fn fail(&mut self) {
        self.status = JobStatus::Failed;
        self.finished_at = Some(Utc::now());
    }
}

/// Shared, lock-guarded handle to a job's state.
pub type JobHandle = Arc<RwLock<JobState>>;

/// Single-slot registry of the active job.
///
/// Holds the most recent job; a terminal job stays readable until the next
/// submission replaces it.
#[derive(Default)]
pub struct JobRegistry {
    current: Mutex<Option<JobHandle>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the job slot for a new submission.
    ///
    /// Fails with [`SubmitError::JobInProgress`] while a non-terminal job
    /// holds the slot.
    pub fn try_begin(&self, playlist_url: &str) -> Result<JobHandle, SubmitError> {
        if playlist_url.trim().is_empty() {
            return Err(SubmitError::EmptySource);
        }

        let mut current = self.current.lock();
        if let Some(ref handle) = *current {
            if !handle.read().status.is_terminal() {
                return Err(SubmitError::JobInProgress);
            }
        }

        let handle: JobHandle = Arc::new(RwLock::new(JobState::new(playlist_url)));
        *current = Some(Arc::clone(&handle));
        Ok(handle)
    }

    /// Snapshot of the current (or most recent) job.
    pub fn current(&self) -> Option<JobState> {
        self.current.lock().as_ref().map(|h| h.read().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_source_rejected() {
        let registry = JobRegistry::new();
        assert!(matches!(
            registry.try_begin("   "),
            Err(SubmitError::EmptySource)
        ));
        assert!(registry.current().is_none());
    }

    #[test]
    fn second_submission_rejected_while_live() {
        let registry = JobRegistry::new();
        let handle = registry.try_begin("https://example.com/a").unwrap();
        handle.write().status = JobStatus::Running;

        assert!(matches!(
            registry.try_begin("https://example.com/b"),
            Err(SubmitError::JobInProgress)
        ));
    }

    #[test]
    fn slot_reusable_after_terminal() {
        let registry = JobRegistry::new();
        let handle = registry.try_begin("https://example.com/a").unwrap();
        handle.write().complete();

        let next = registry.try_begin("https://example.com/b").unwrap();
        assert_eq!(next.read().playlist_url, "https://example.com/b");
        assert_eq!(
            registry.current().unwrap().playlist_url,
            "https://example.com/b"
        );
    }

    #[test]
    fn failed_job_frees_the_slot() {
        let registry = JobRegistry::new();
        let handle = registry.try_begin("https://example.com/a").unwrap();
        handle.write().fail();

        assert!(registry.try_begin("https://example.com/b").is_ok());
    }

    #[test]
    fn new_job_has_degraded_defaults() {
        let state = JobState::new("https://example.com/p");
        assert_eq!(state.status, JobStatus::Pending);
        assert_eq!(state.title, FALLBACK_TITLE);
        assert_eq!(state.expected_items, None);
        assert!(state.skipped.is_empty());
    }
}
