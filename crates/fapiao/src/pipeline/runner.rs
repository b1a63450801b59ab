use std::sync::Arc;

use chrono::Local;
use tracing::{debug, info_span};

use crate::config::Config;
use crate::export::{Artifact, InvoiceRecord, WorkbookExporter};
use crate::extract::parse_invoice;
use crate::jobs::{ProgressEvent, ProgressReporter};
use crate::processor::{build_recognizer, Preprocessor, TextRecognizer};

use super::error::PipelineError;
use super::upload::UploadedImage;

/// Turns a batch of receipt photos into one spreadsheet.
pub struct Pipeline {
    preprocessor: Preprocessor,
    recognizer: Arc<dyn TextRecognizer>,
    exporter: WorkbookExporter,
}

impl Pipeline {
    /// Production constructor: OCR engine chosen by build features.
    pub fn from_config(config: &Config) -> Self {
        Self::with_recognizer(config, build_recognizer(&config.ocr))
    }

    /// Same as [`Pipeline::from_config`] with a caller-supplied OCR engine.
    pub fn with_recognizer(config: &Config, recognizer: Arc<dyn TextRecognizer>) -> Self {
        Self {
            preprocessor: Preprocessor::new(config.preprocess.clone()),
            recognizer,
            exporter: WorkbookExporter::new(config.export.clone()),
        }
    }

    /// Processes images in upload order and stops at the first failure.
    pub fn run(
        &self,
        images: &[UploadedImage],
        progress: &dyn ProgressReporter,
    ) -> Result<Artifact, PipelineError> {
        let _pipeline_span = info_span!("pipeline", images = images.len()).entered();
        let total = images.len();
        let mut records = Vec::with_capacity(total);

        for (index, image) in images.iter().enumerate() {
            let sequence = index + 1;
            let record = self.process_image(sequence, image, progress)?;
            records.push(record);

            progress.report(ProgressEvent::Advanced {
                current: sequence,
                total,
                filename: image.filename.clone(),
            });
        }

        let _step = info_span!("export").entered();
        progress.report(ProgressEvent::Phase {
            message: "Writing spreadsheet...".to_string(),
        });
        Ok(self.exporter.export(&records, Local::now())?)
    }

    fn process_image(
        &self,
        sequence: usize,
        image: &UploadedImage,
        progress: &dyn ProgressReporter,
    ) -> Result<InvoiceRecord, PipelineError> {
        let _image_span = info_span!("image", sequence, filename = %image.filename).entered();

        let prepared = {
            let _step = info_span!("preprocess").entered();
            self.preprocessor.prepare(&image.filename, &image.bytes)?
        };

        let raw_text = {
            let _step = info_span!("ocr").entered();
            progress.report(ProgressEvent::Phase {
                message: format!("Running OCR on {}...", image.filename),
            });
            self.recognizer.recognize(&prepared)?
        };

        let parsed = {
            let _step = info_span!("extract").entered();
            parse_invoice(&raw_text)
        };
        debug!(
            invoice_number = %parsed.invoice_number,
            items = parsed.items.len(),
            "Parsed receipt"
        );

        Ok(InvoiceRecord {
            sequence,
            filename: image.filename.clone(),
            parsed,
            raw_text,
        })
    }
}
