//! In-memory job store.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::JobError;
use crate::export::Artifact;

/// Status of a job. Moves only from `Processing` to `Done` or `Error`.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Processing,
    Done,
    Error,
}

impl JobStatus {
    pub fn is_finished(&self) -> bool {
        !matches!(self, JobStatus::Processing)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Processing => write!(f, "processing"),
            JobStatus::Done => write!(f, "done"),
            JobStatus::Error => write!(f, "error"),
        }
    }
}

/// Point-in-time copy of a job, as returned to pollers.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JobSnapshot {
    pub job_id: String,
    pub status: JobStatus,
    pub current: usize,
    pub total: usize,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

/// Partial update published by a worker between images.
#[derive(Debug, Clone, Default)]
pub struct JobUpdate {
    pub current: Option<usize>,
    pub message: Option<String>,
}

impl JobUpdate {
    pub fn progress(current: usize, message: impl Into<String>) -> Self {
        Self {
            current: Some(current),
            message: Some(message.into()),
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self {
            current: None,
            message: Some(message.into()),
        }
    }
}

#[derive(Debug)]
struct JobEntry {
    status: JobStatus,
    current: usize,
    total: usize,
    message: String,
    error: Option<String>,
    artifact: Option<Artifact>,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

impl JobEntry {
    fn snapshot(&self, job_id: &str) -> JobSnapshot {
        JobSnapshot {
            job_id: job_id.to_string(),
            status: self.status,
            current: self.current,
            total: self.total,
            message: self.message.clone(),
            error: self.error.clone(),
            filename: self.artifact.as_ref().map(|a| a.filename.clone()),
            started_at: self.started_at,
            finished_at: self.finished_at,
        }
    }

    fn ensure_processing(&self, job_id: &str) -> Result<(), JobError> {
        if self.status.is_finished() {
            return Err(JobError::AlreadyFinished(job_id.to_string()));
        }
        Ok(())
    }

    fn advance(&mut self, current: usize) {
        // Progress is monotone and bounded by the batch size.
        self.current = self.current.max(current.min(self.total));
    }
}

/// Maps job ids to job state behind a single mutex.
///
/// The lock is only held for map access; callers do OCR and export work
/// outside of it and come back to publish results.
#[derive(Debug, Default)]
pub struct JobStore {
    jobs: Mutex<HashMap<String, JobEntry>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, JobEntry>> {
        match self.jobs.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("Job store lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    /// Registers a new job for `total` images and returns its id.
    pub fn create(&self, total: usize) -> String {
        let job_id = uuid::Uuid::new_v4().to_string();
        let entry = JobEntry {
            status: JobStatus::Processing,
            current: 0,
            total,
            message: "Queued".to_string(),
            error: None,
            artifact: None,
            started_at: Utc::now(),
            finished_at: None,
        };
        self.lock().insert(job_id.clone(), entry);
        log::debug!("Created job {} for {} image(s)", job_id, total);
        job_id
    }

    pub fn update(&self, job_id: &str, update: JobUpdate) -> Result<(), JobError> {
        let mut jobs = self.lock();
        let entry = jobs
            .get_mut(job_id)
            .ok_or_else(|| JobError::NotFound(job_id.to_string()))?;
        entry.ensure_processing(job_id)?;

        if let Some(current) = update.current {
            entry.advance(current);
        }
        if let Some(message) = update.message {
            entry.message = message;
        }
        Ok(())
    }

    pub fn complete(&self, job_id: &str, artifact: Artifact) -> Result<(), JobError> {
        let mut jobs = self.lock();
        let entry = jobs
            .get_mut(job_id)
            .ok_or_else(|| JobError::NotFound(job_id.to_string()))?;
        entry.ensure_processing(job_id)?;

        entry.status = JobStatus::Done;
        entry.current = entry.total;
        entry.message = "Completed".to_string();
        entry.artifact = Some(artifact);
        entry.finished_at = Some(Utc::now());
        Ok(())
    }

    pub fn fail(&self, job_id: &str, error: impl Into<String>) -> Result<(), JobError> {
        let mut jobs = self.lock();
        let entry = jobs
            .get_mut(job_id)
            .ok_or_else(|| JobError::NotFound(job_id.to_string()))?;
        entry.ensure_processing(job_id)?;

        entry.status = JobStatus::Error;
        entry.message = "Failed".to_string();
        entry.error = Some(error.into());
        entry.finished_at = Some(Utc::now());
        Ok(())
    }

    pub fn get(&self, job_id: &str) -> Result<JobSnapshot, JobError> {
        self.lock()
            .get(job_id)
            .map(|entry| entry.snapshot(job_id))
            .ok_or_else(|| JobError::NotFound(job_id.to_string()))
    }

    /// Removes a job regardless of its status. Returns whether it existed.
    pub fn delete(&self, job_id: &str) -> bool {
        self.lock().remove(job_id).is_some()
    }

    /// Hands out the finished spreadsheet and forgets the job.
    ///
    /// Check and removal happen under one lock acquisition, so concurrent
    /// downloads of the same job cannot both succeed.
    pub fn take_artifact(&self, job_id: &str) -> Result<Artifact, JobError> {
        let mut jobs = self.lock();
        let entry = jobs
            .get(job_id)
            .ok_or_else(|| JobError::NotFound(job_id.to_string()))?;

        if entry.status != JobStatus::Done {
            return Err(JobError::NotReady {
                job_id: job_id.to_string(),
                status: entry.status.to_string(),
            });
        }

        jobs.remove(job_id)
            .and_then(|entry| entry.artifact)
            .ok_or_else(|| JobError::NotFound(job_id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
