pub mod image;
pub mod ocr;

use std::io::Cursor;
use std::sync::Arc;

use ::image::DynamicImage;

use crate::config::OcrConfig;
use crate::error::ProcessError;

pub use self::image::Preprocessor;
pub use ocr::TesseractCli;
#[cfg(feature = "leptess")]
pub use ocr::LeptessRecognizer;

/// Turns a preprocessed image into raw text.
pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, image: &DynamicImage) -> Result<String, ProcessError>;
}

/// Picks the OCR engine compiled into this build.
///
/// With the `leptess` feature Tesseract runs in-process; otherwise the
/// `tesseract` executable named in the config is invoked per image.
pub fn build_recognizer(config: &OcrConfig) -> Arc<dyn TextRecognizer> {
    #[cfg(feature = "leptess")]
    {
        Arc::new(LeptessRecognizer::new(&config.languages, config.dpi))
    }

    #[cfg(not(feature = "leptess"))]
    {
        Arc::new(TesseractCli::new(
            &config.tesseract_cmd,
            &config.languages,
            config.dpi,
        ))
    }
}

pub(crate) fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, ProcessError> {
    let mut png_data = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png_data), ::image::ImageFormat::Png)
        .map_err(|e| ProcessError::OcrFailed(format!("Failed to convert image: {}", e)))?;
    Ok(png_data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::image::{GrayImage, Luma};

    #[test]
    fn test_encode_png_signature() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(4, 4, Luma([255])));
        let png = encode_png(&img).unwrap();

        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[cfg(not(feature = "leptess"))]
    #[test]
    fn test_default_config_uses_chinese_traditional() {
        let config = OcrConfig::default();
        let cli = TesseractCli::new(&config.tesseract_cmd, &config.languages, config.dpi);

        assert_eq!(cli.languages(), "chi_tra");
    }
}
