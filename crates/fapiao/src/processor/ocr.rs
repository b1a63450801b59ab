use std::io::Write;
use std::process::Command;

use image::DynamicImage;

use crate::error::ProcessError;
use crate::processor::{encode_png, TextRecognizer};

fn language_arg(languages: &[String]) -> String {
    if languages.is_empty() {
        "chi_tra".to_string()
    } else {
        languages.join("+")
    }
}

/// Runs the `tesseract` executable once per image.
#[derive(Debug, Clone)]
pub struct TesseractCli {
    command: String,
    languages: String,
    dpi: u32,
}

impl TesseractCli {
    pub fn new(command: &str, languages: &[String], dpi: u32) -> Self {
        Self {
            command: command.to_string(),
            languages: language_arg(languages),
            dpi,
        }
    }

    pub fn languages(&self) -> &str {
        &self.languages
    }
}

impl TextRecognizer for TesseractCli {
    fn recognize(&self, image: &DynamicImage) -> Result<String, ProcessError> {
        let _span = tracing::info_span!("processor.ocr", engine = "tesseract-cli").entered();

        let png_data = encode_png(image)?;

        let mut input = tempfile::Builder::new()
            .prefix("fapiao-ocr-")
            .suffix(".png")
            .tempfile()
            .map_err(|e| ProcessError::OcrFailed(format!("Failed to create temp file: {}", e)))?;
        input
            .write_all(&png_data)
            .and_then(|_| input.flush())
            .map_err(|e| ProcessError::OcrFailed(format!("Failed to write temp file: {}", e)))?;

        let output = Command::new(&self.command)
            .arg(input.path())
            .arg("stdout")
            .arg("-l")
            .arg(&self.languages)
            .arg("--dpi")
            .arg(self.dpi.to_string())
            .output()
            .map_err(|e| {
                ProcessError::OcrFailed(format!("Failed to run '{}': {}", self.command, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProcessError::OcrFailed(format!(
                "'{}' exited with {}: {}",
                self.command,
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// In-process Tesseract through leptess.
#[cfg(feature = "leptess")]
#[derive(Debug, Clone)]
pub struct LeptessRecognizer {
    languages: String,
    dpi: u32,
}

#[cfg(feature = "leptess")]
impl LeptessRecognizer {
    pub fn new(languages: &[String], dpi: u32) -> Self {
        Self {
            languages: language_arg(languages),
            dpi,
        }
    }
}

#[cfg(feature = "leptess")]
impl TextRecognizer for LeptessRecognizer {
    fn recognize(&self, image: &DynamicImage) -> Result<String, ProcessError> {
        let _span = tracing::info_span!("processor.ocr", engine = "leptess").entered();

        let png_data = encode_png(image)?;

        // Tesseract handles are not Sync, so each call gets its own.
        let mut lt = leptess::LepTess::new(None, &self.languages).map_err(|e| {
            ProcessError::OcrFailed(format!("Failed to initialize Tesseract: {}", e))
        })?;

        lt.set_image_from_mem(&png_data)
            .map_err(|e| ProcessError::OcrFailed(format!("Failed to set image for OCR: {}", e)))?;
        lt.set_source_resolution(self.dpi as i32);

        lt.get_utf8_text()
            .map_err(|e| ProcessError::OcrFailed(format!("OCR failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    #[test]
    fn test_multiple_languages_joined() {
        let cli = TesseractCli::new(
            "tesseract",
            &["chi_tra".to_string(), "eng".to_string()],
            300,
        );
        assert_eq!(cli.languages(), "chi_tra+eng");
    }

    #[test]
    fn test_default_language() {
        let cli = TesseractCli::new("tesseract", &[], 300);
        assert_eq!(cli.languages(), "chi_tra");
    }

    #[test]
    fn test_missing_executable_is_ocr_error() {
        let cli = TesseractCli::new("/nonexistent/bin/tesseract", &[], 300);
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(8, 8, Luma([255])));

        match cli.recognize(&img) {
            Err(ProcessError::OcrFailed(msg)) => assert!(msg.contains("Failed to run")),
            other => panic!("Expected OcrFailed, got {:?}", other),
        }
    }
}
