//! Job bookkeeping shared between request handlers and workers.

pub mod progress;
pub mod store;

pub use progress::{NoopProgress, ProgressEvent, ProgressReporter, StoreProgress};
pub use store::{JobSnapshot, JobStatus, JobStore, JobUpdate};
