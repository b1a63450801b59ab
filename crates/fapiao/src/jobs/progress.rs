use std::sync::Arc;

use super::store::{JobStore, JobUpdate};

/// Events emitted by the pipeline while a batch is processed.
/// OCR text is never carried here (can be large).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Work on the current image moved to a new step.
    Phase { message: String },
    /// `current` images of `total` are finished.
    Advanced {
        current: usize,
        total: usize,
        filename: String,
    },
}

pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// No-op reporter for unit tests.
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Publishes pipeline events into the job store so pollers can see them.
pub struct StoreProgress {
    job_id: String,
    store: Arc<JobStore>,
}

impl StoreProgress {
    pub fn new(job_id: impl Into<String>, store: Arc<JobStore>) -> Self {
        Self {
            job_id: job_id.into(),
            store,
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }
}

impl ProgressReporter for StoreProgress {
    fn report(&self, event: ProgressEvent) {
        let update = match event {
            ProgressEvent::Phase { message } => JobUpdate::message(message),
            ProgressEvent::Advanced {
                current,
                total,
                filename,
            } => JobUpdate::progress(
                current,
                format!("Processed {} of {} ({})", current, total, filename),
            ),
        };

        if let Err(e) = self.store.update(&self.job_id, update) {
            log::warn!("Dropping progress for job {}: {}", self.job_id, e);
        }
    }
}
