pub mod error;
pub mod runner;
pub mod upload;

pub use error::PipelineError;
pub use runner::Pipeline;
pub use upload::UploadedImage;
