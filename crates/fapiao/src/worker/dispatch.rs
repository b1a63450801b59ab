use std::sync::Arc;

use log::{info, warn};

use crate::config::WorkersConfig;
use crate::error::WorkerError;
use crate::jobs::JobStore;
use crate::pipeline::{Pipeline, UploadedImage};

use super::job::{spawn_job, BatchJob};
use super::pool::WorkerPool;

/// Hands uploaded batches to a background worker.
///
/// Without a pool every batch gets its own thread. With a pool, batches
/// wait in a bounded queue and are rejected once it is full.
pub struct Dispatcher {
    store: Arc<JobStore>,
    pipeline: Arc<Pipeline>,
    pool: Option<WorkerPool>,
}

impl Dispatcher {
    pub fn new(
        store: Arc<JobStore>,
        pipeline: Arc<Pipeline>,
        workers: &WorkersConfig,
    ) -> Result<Self, WorkerError> {
        let pool = if workers.pool_size > 0 {
            Some(WorkerPool::new(
                Arc::clone(&pipeline),
                Arc::clone(&store),
                workers.pool_size,
                workers.queue_capacity,
            )?)
        } else {
            info!("Running one worker thread per job");
            None
        };

        Ok(Self {
            store,
            pipeline,
            pool,
        })
    }

    pub fn store(&self) -> &Arc<JobStore> {
        &self.store
    }

    /// Registers a job for `images` and starts it in the background.
    ///
    /// On failure the job is removed again, so a rejected upload leaves
    /// nothing behind in the store.
    pub fn submit(&self, images: Vec<UploadedImage>) -> Result<String, WorkerError> {
        let job_id = self.store.create(images.len());
        let job = BatchJob::new(&job_id, images);

        let dispatched = match &self.pool {
            Some(pool) => pool.submit(job),
            None => spawn_job(Arc::clone(&self.pipeline), Arc::clone(&self.store), job).map(|_| ()),
        };

        if let Err(e) = dispatched {
            warn!("Rejected job {}: {}", job_id, e);
            self.store.delete(&job_id);
            return Err(e);
        }
        Ok(job_id)
    }

    /// Drains the pool, if any. Thread-per-job workers are detached.
    pub fn shutdown(self) {
        if let Some(pool) = self.pool {
            pool.wait();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::ProcessError;
    use crate::jobs::JobStatus;
    use crate::processor::TextRecognizer;
    use crossbeam_channel::Receiver;
    use image::{DynamicImage, GrayImage, Luma};
    use std::io::Cursor;
    use std::time::{Duration, Instant};

    struct Gated(Receiver<()>);

    impl TextRecognizer for Gated {
        fn recognize(&self, _image: &DynamicImage) -> Result<String, ProcessError> {
            let _ = self.0.recv();
            Ok("合計 5".to_string())
        }
    }

    fn png() -> UploadedImage {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(8, 8, Luma([255])));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        UploadedImage::new("r.png", bytes)
    }

    fn wait_until_finished(store: &JobStore, id: &str) -> JobStatus {
        let deadline = Instant::now() + Duration::from_secs(10);
        loop {
            let status = store.get(id).unwrap().status;
            if status.is_finished() || Instant::now() > deadline {
                return status;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_thread_per_job_returns_before_work_is_done() {
        let (open, gate) = crossbeam_channel::unbounded();
        let store = Arc::new(JobStore::new());
        let pipeline = Arc::new(Pipeline::with_recognizer(&Config::default(), Arc::new(Gated(gate))));
        let dispatcher =
            Dispatcher::new(Arc::clone(&store), pipeline, &WorkersConfig::default()).unwrap();

        let id = dispatcher.submit(vec![png()]).unwrap();
        assert_eq!(store.get(&id).unwrap().status, JobStatus::Processing);
        assert_eq!(store.get(&id).unwrap().total, 1);

        open.send(()).unwrap();
        assert_eq!(wait_until_finished(&store, &id), JobStatus::Done);
        dispatcher.shutdown();
    }

    #[test]
    fn test_rejected_submission_leaves_no_job() {
        let (open, gate) = crossbeam_channel::unbounded();
        let store = Arc::new(JobStore::new());
        let pipeline = Arc::new(Pipeline::with_recognizer(&Config::default(), Arc::new(Gated(gate))));
        let workers = WorkersConfig {
            pool_size: 1,
            queue_capacity: 1,
        };
        let dispatcher = Dispatcher::new(Arc::clone(&store), pipeline, &workers).unwrap();

        let first = dispatcher.submit(vec![png()]).unwrap();
        // Wait for the worker to take the first batch off the queue.
        while dispatcher.pool.as_ref().map(|p| p.queued()).unwrap_or(0) > 0 {
            std::thread::yield_now();
        }
        let second = dispatcher.submit(vec![png()]).unwrap();

        match dispatcher.submit(vec![png()]) {
            Err(WorkerError::QueueFull) => {}
            other => panic!("Expected QueueFull, got {:?}", other),
        }
        assert_eq!(store.len(), 2);

        open.send(()).unwrap();
        open.send(()).unwrap();
        dispatcher.shutdown();

        assert_eq!(store.get(&first).unwrap().status, JobStatus::Done);
        assert_eq!(store.get(&second).unwrap().status, JobStatus::Done);
    }
}
