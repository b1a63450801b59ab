//! Shared application state.

use std::sync::Arc;

use fapiao::jobs::JobStore;
use fapiao::{Config, Dispatcher, Pipeline};
use log::warn;

/// Cloned into every request handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub dispatcher: Arc<Dispatcher>,
}

impl AppState {
    pub fn new(config: Config) -> fapiao::Result<Self> {
        let pipeline = Pipeline::from_config(&config);
        Self::with_pipeline(config, pipeline)
    }

    /// Builds state around a prepared pipeline (tests inject a scripted OCR engine).
    pub fn with_pipeline(config: Config, pipeline: Pipeline) -> fapiao::Result<Self> {
        let store = Arc::new(JobStore::new());
        let dispatcher = Dispatcher::new(store, Arc::new(pipeline), &config.workers)?;

        Ok(Self {
            config: Arc::new(config),
            dispatcher: Arc::new(dispatcher),
        })
    }

    pub fn store(&self) -> &Arc<JobStore> {
        self.dispatcher.store()
    }

    /// Waits for pooled workers once no handler holds the state any more.
    pub fn shutdown(self) {
        match Arc::try_unwrap(self.dispatcher) {
            Ok(dispatcher) => dispatcher.shutdown(),
            Err(_) => warn!("Dispatcher still shared at shutdown; not waiting for workers"),
        }
    }
}
