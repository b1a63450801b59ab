pub mod dispatch;
pub mod job;
pub mod pool;

pub use dispatch::Dispatcher;
pub use job::{execute, spawn_job, BatchJob};
pub use pool::WorkerPool;
