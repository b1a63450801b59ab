use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("{0}")]
    Processing(#[from] crate::error::ProcessError),

    #[error("{0}")]
    Export(#[from] crate::error::ExportError),
}
