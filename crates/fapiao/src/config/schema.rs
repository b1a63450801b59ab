use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub ocr: OcrConfig,
    #[serde(default)]
    pub preprocess: PreprocessConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub workers: WorkersConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            server: ServerConfig::default(),
            ocr: OcrConfig::default(),
            preprocess: PreprocessConfig::default(),
            export: ExportConfig::default(),
            workers: WorkersConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Upper bound for one multipart request body.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_max_upload_bytes() -> usize {
    50 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,
    #[serde(default = "default_dpi")]
    pub dpi: u32,
    /// Executable used by the command-line OCR backend.
    #[serde(default = "default_tesseract_cmd")]
    pub tesseract_cmd: String,
}

fn default_languages() -> Vec<String> {
    vec!["chi_tra".to_string()]
}

fn default_dpi() -> u32 {
    300
}

fn default_tesseract_cmd() -> String {
    "tesseract".to_string()
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            languages: default_languages(),
            dpi: default_dpi(),
            tesseract_cmd: default_tesseract_cmd(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreprocessConfig {
    /// Images wider than this are scaled down, keeping the aspect ratio.
    #[serde(default = "default_max_width")]
    pub max_width: u32,
    /// Contrast adjustment in percent, as accepted by `image::imageops::contrast`.
    #[serde(default = "default_contrast")]
    pub contrast: f32,
    /// Binarization cutoff. `null` keeps the grayscale image.
    #[serde(default = "default_threshold")]
    pub threshold: Option<u8>,
    #[serde(default = "default_true")]
    pub sharpen: bool,
}

fn default_max_width() -> u32 {
    1600
}

fn default_contrast() -> f32 {
    40.0
}

fn default_threshold() -> Option<u8> {
    Some(150)
}

fn default_true() -> bool {
    true
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            max_width: default_max_width(),
            contrast: default_contrast(),
            threshold: default_threshold(),
            sharpen: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_true")]
    pub include_raw_text: bool,
    /// Maximum characters of OCR text kept per image in the diagnostic sheet.
    #[serde(default = "default_raw_text_limit")]
    pub raw_text_limit: usize,
    #[serde(default = "default_filename_prefix")]
    pub filename_prefix: String,
}

fn default_raw_text_limit() -> usize {
    2000
}

fn default_filename_prefix() -> String {
    "invoices".to_string()
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            include_raw_text: true,
            raw_text_limit: default_raw_text_limit(),
            filename_prefix: default_filename_prefix(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkersConfig {
    /// Number of pooled worker threads. `0` spawns one thread per job.
    #[serde(default)]
    pub pool_size: usize,
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_queue_capacity() -> usize {
    16
}

impl Default for WorkersConfig {
    fn default() -> Self {
        Self {
            pool_size: 0,
            queue_capacity: default_queue_capacity(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
        }
    }
}
