pub mod config;
pub mod error;
pub mod export;
pub mod extract;
pub mod jobs;
pub mod pipeline;
pub mod processor;
pub mod worker;

pub use config::{load_config, load_config_from_env, Config};
pub use error::{
    ConfigError, ExportError, FapiaoError, JobError, ProcessError, Result, WorkerError,
};
pub use export::{Artifact, WorkbookExporter, XLSX_CONTENT_TYPE};
pub use extract::{parse_invoice, LineItem, ParsedInvoice};
pub use jobs::{JobSnapshot, JobStatus, JobStore};
pub use pipeline::{Pipeline, PipelineError, UploadedImage};
pub use processor::{build_recognizer, TextRecognizer};
pub use worker::Dispatcher;
