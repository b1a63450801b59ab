use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::{error, info, warn};

use crate::error::WorkerError;
use crate::jobs::{JobStore, StoreProgress};
use crate::pipeline::{Pipeline, UploadedImage};

/// A batch waiting for a worker. The job is already registered in the store.
#[derive(Debug)]
pub struct BatchJob {
    pub job_id: String,
    pub images: Vec<UploadedImage>,
}

impl BatchJob {
    pub fn new(job_id: impl Into<String>, images: Vec<UploadedImage>) -> Self {
        Self {
            job_id: job_id.into(),
            images,
        }
    }
}

/// Runs one batch to completion and records the outcome in the store.
///
/// A panic inside the pipeline is caught and recorded as the job error,
/// so a job never stays `processing` after its worker is gone.
pub fn execute(pipeline: &Pipeline, store: &Arc<JobStore>, job: BatchJob) {
    let progress = StoreProgress::new(&job.job_id, Arc::clone(store));
    info!(
        "Processing job {} ({} image(s))",
        job.job_id,
        job.images.len()
    );

    let outcome = catch_unwind(AssertUnwindSafe(|| pipeline.run(&job.images, &progress)));

    let recorded = match outcome {
        Ok(Ok(artifact)) => {
            info!("Job {} completed: {}", job.job_id, artifact.filename);
            store.complete(&job.job_id, artifact)
        }
        Ok(Err(e)) => {
            warn!("Job {} failed: {}", job.job_id, e);
            store.fail(&job.job_id, e.to_string())
        }
        Err(payload) => {
            let message = format!("Worker panicked: {}", panic_message(payload.as_ref()));
            error!("Job {}: {}", job.job_id, message);
            store.fail(&job.job_id, message)
        }
    };

    if let Err(e) = recorded {
        warn!("Could not record outcome of job {}: {}", job.job_id, e);
    }
}

/// Starts a dedicated thread for one batch.
pub fn spawn_job(
    pipeline: Arc<Pipeline>,
    store: Arc<JobStore>,
    job: BatchJob,
) -> Result<JoinHandle<()>, WorkerError> {
    let name = format!("fapiao-job-{}", short_id(&job.job_id));
    thread::Builder::new()
        .name(name)
        .spawn(move || execute(&pipeline, &store, job))
        .map_err(|e| WorkerError::SpawnFailed(e.to_string()))
}

fn short_id(job_id: &str) -> &str {
    job_id.get(..8).unwrap_or(job_id)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
