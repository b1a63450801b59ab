use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use log::{debug, error, info};

use crate::error::WorkerError;
use crate::jobs::JobStore;
use crate::pipeline::Pipeline;

use super::job::{execute, BatchJob};

/// Fixed set of worker threads fed from a bounded queue.
pub struct WorkerPool {
    job_sender: Sender<BatchJob>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Starts `worker_count` threads sharing one queue of `queue_capacity` batches.
    pub fn new(
        pipeline: Arc<Pipeline>,
        store: Arc<JobStore>,
        worker_count: usize,
        queue_capacity: usize,
    ) -> Result<Self, WorkerError> {
        if worker_count == 0 {
            return Err(WorkerError::SpawnFailed(
                "worker_count must be > 0".to_string(),
            ));
        }
        let (job_sender, job_receiver) = bounded::<BatchJob>(queue_capacity);

        let mut workers = Vec::with_capacity(worker_count);
        for worker_id in 0..worker_count {
            let job_rx = job_receiver.clone();
            let worker_pipeline = Arc::clone(&pipeline);
            let worker_store = Arc::clone(&store);

            let handle = thread::Builder::new()
                .name(format!("fapiao-worker-{}", worker_id))
                .spawn(move || run_worker(worker_id, job_rx, worker_pipeline, worker_store))
                .map_err(|e| WorkerError::SpawnFailed(e.to_string()))?;
            workers.push(handle);
        }

        info!(
            "Started {} workers (queue capacity {})",
            worker_count, queue_capacity
        );

        Ok(Self {
            job_sender,
            workers,
        })
    }

    /// Queues a batch without blocking.
    pub fn submit(&self, job: BatchJob) -> Result<(), WorkerError> {
        self.job_sender.try_send(job).map_err(|e| match e {
            TrySendError::Full(_) => WorkerError::QueueFull,
            TrySendError::Disconnected(_) => WorkerError::ChannelClosed,
        })
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    pub fn queued(&self) -> usize {
        self.job_sender.len()
    }

    /// Stops accepting work, lets queued batches finish and joins the workers.
    pub fn wait(self) {
        info!("Shutting down worker pool...");
        drop(self.job_sender);

        for (i, worker) in self.workers.into_iter().enumerate() {
            if let Err(e) = worker.join() {
                error!("Worker {} panicked: {:?}", i, e);
            } else {
                debug!("Worker {} finished", i);
            }
        }

        info!("All workers have stopped");
    }
}

fn run_worker(
    worker_id: usize,
    job_receiver: Receiver<BatchJob>,
    pipeline: Arc<Pipeline>,
    store: Arc<JobStore>,
) {
    debug!("Worker {} started", worker_id);

    // Ends once the sender is dropped and the queue is drained.
    for job in job_receiver.iter() {
        debug!("Worker {} picked up job {}", worker_id, job.job_id);
        execute(&pipeline, &store, job);
    }

    debug!("Worker {} stopped", worker_id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::ProcessError;
    use crate::jobs::JobStatus;
    use crate::pipeline::UploadedImage;
    use crate::processor::TextRecognizer;
    use crossbeam_channel::Receiver as Gate;
    use image::{DynamicImage, GrayImage, Luma};
    use std::io::Cursor;

    struct Echo;

    impl TextRecognizer for Echo {
        fn recognize(&self, _image: &DynamicImage) -> Result<String, ProcessError> {
            Ok("總計 42".to_string())
        }
    }

    /// Blocks every OCR call until the test opens the gate.
    struct Gated(Gate<()>);

    impl TextRecognizer for Gated {
        fn recognize(&self, _image: &DynamicImage) -> Result<String, ProcessError> {
            let _ = self.0.recv();
            Ok(String::new())
        }
    }

    fn png() -> UploadedImage {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(8, 8, Luma([255])));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        UploadedImage::new("r.png", bytes)
    }

    fn pipeline(recognizer: Arc<dyn TextRecognizer>) -> Arc<Pipeline> {
        Arc::new(Pipeline::with_recognizer(&Config::default(), recognizer))
    }

    #[test]
    fn test_worker_pool_rejects_zero_workers() {
        let store = Arc::new(JobStore::new());
        match WorkerPool::new(pipeline(Arc::new(Echo)), store, 0, 4) {
            Err(WorkerError::SpawnFailed(_)) => {}
            _ => panic!("Expected SpawnFailed"),
        }
    }

    #[test]
    fn test_pool_processes_all_jobs() {
        let store = Arc::new(JobStore::new());
        let pool = WorkerPool::new(pipeline(Arc::new(Echo)), Arc::clone(&store), 2, 8).unwrap();
        assert_eq!(pool.worker_count(), 2);

        let ids: Vec<String> = (0..5)
            .map(|_| {
                let id = store.create(1);
                pool.submit(BatchJob::new(&id, vec![png()])).unwrap();
                id
            })
            .collect();

        pool.wait();

        for id in ids {
            assert_eq!(store.get(&id).unwrap().status, JobStatus::Done);
        }
    }

    #[test]
    fn test_full_queue_rejects_submission() {
        let (open, gate) = crossbeam_channel::unbounded::<()>();
        let store = Arc::new(JobStore::new());
        let pool = WorkerPool::new(
            pipeline(Arc::new(Gated(gate))),
            Arc::clone(&store),
            1,
            1,
        )
        .unwrap();

        // First job occupies the worker; wait until it has been picked up.
        let running = store.create(1);
        pool.submit(BatchJob::new(&running, vec![png()])).unwrap();
        while pool.queued() > 0 {
            thread::yield_now();
        }

        let queued = store.create(1);
        pool.submit(BatchJob::new(&queued, vec![png()])).unwrap();

        let rejected = store.create(1);
        match pool.submit(BatchJob::new(&rejected, vec![png()])) {
            Err(WorkerError::QueueFull) => {}
            other => panic!("Expected QueueFull, got {:?}", other),
        }

        open.send(()).unwrap();
        open.send(()).unwrap();
        pool.wait();

        assert_eq!(store.get(&running).unwrap().status, JobStatus::Done);
        assert_eq!(store.get(&queued).unwrap().status, JobStatus::Done);
    }
}
