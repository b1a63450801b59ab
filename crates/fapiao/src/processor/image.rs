use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, GrayImage};

use crate::config::PreprocessConfig;
use crate::error::ProcessError;

/// Sigma of the unsharp mask applied before binarization.
const SHARPEN_SIGMA: f32 = 1.0;
const SHARPEN_THRESHOLD: i32 = 2;

/// Normalizes receipt photos for OCR.
///
/// Order: downscale wide images, grayscale, contrast, sharpen, threshold.
pub struct Preprocessor {
    config: PreprocessConfig,
}

impl Preprocessor {
    pub fn new(config: PreprocessConfig) -> Self {
        Self { config }
    }

    pub fn decode(&self, filename: &str, data: &[u8]) -> Result<DynamicImage, ProcessError> {
        image::load_from_memory(data).map_err(|e| ProcessError::Decode {
            filename: filename.to_string(),
            reason: e.to_string(),
        })
    }

    pub fn normalize(&self, img: DynamicImage) -> DynamicImage {
        let _span = tracing::debug_span!("processor.preprocess").entered();

        let img = self.limit_width(img);
        let gray = img.to_luma8();

        let mut gray: GrayImage = if self.config.contrast != 0.0 {
            imageops::contrast(&gray, self.config.contrast)
        } else {
            gray
        };

        if self.config.sharpen {
            gray = imageops::unsharpen(&gray, SHARPEN_SIGMA, SHARPEN_THRESHOLD);
        }

        if let Some(cutoff) = self.config.threshold {
            binarize(&mut gray, cutoff);
        }

        DynamicImage::ImageLuma8(gray)
    }

    /// Decodes and normalizes in one step.
    pub fn prepare(&self, filename: &str, data: &[u8]) -> Result<DynamicImage, ProcessError> {
        let img = self.decode(filename, data)?;
        Ok(self.normalize(img))
    }

    fn limit_width(&self, img: DynamicImage) -> DynamicImage {
        let (width, height) = img.dimensions();
        let max_width = self.config.max_width;
        if width <= max_width {
            return img;
        }

        let scale = max_width as f64 / width as f64;
        let new_height = ((height as f64 * scale).round() as u32).max(1);
        tracing::debug!(width, height, max_width, new_height, "Downscaling wide image");
        img.resize_exact(max_width, new_height, FilterType::Lanczos3)
    }
}

fn binarize(img: &mut GrayImage, cutoff: u8) {
    for pixel in img.pixels_mut() {
        pixel.0[0] = if pixel.0[0] >= cutoff { 255 } else { 0 };
    }
}
