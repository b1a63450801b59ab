use std::path::Path;

use crate::config::schema::Config;
use crate::error::ConfigError;

const SCHEMA_JSON: &str = include_str!("../../schema/config-v1.json");

/// Environment variable naming the config file. Defaults apply when unset.
pub const CONFIG_ENV_VAR: &str = "FAPIAO_CONFIG";

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

/// Loads the file named by `FAPIAO_CONFIG`, or returns the defaults.
pub fn load_config_from_env() -> Result<Config, ConfigError> {
    match std::env::var_os(CONFIG_ENV_VAR) {
        Some(path) => load_config(path),
        None => {
            let config = Config::default();
            validate_config(&config)?;
            Ok(config)
        }
    }
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let json_value: serde_json::Value = serde_json::from_str(content)?;

    validate_schema(&json_value)?;

    let config: Config = serde_json::from_value(json_value)?;

    validate_config(&config)?;

    Ok(config)
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let validator = jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
        message: format!("Failed to compile JSON schema: {}", e),
    })?;

    let error_messages: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| e.to_string())
        .collect();
    if !error_messages.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    if config.ocr.languages.is_empty() {
        return Err(ConfigError::Validation {
            message: "ocr.languages must name at least one Tesseract language".to_string(),
        });
    }

    if config.preprocess.max_width == 0 {
        return Err(ConfigError::Validation {
            message: "preprocess.max_width must be positive".to_string(),
        });
    }

    if config.workers.pool_size > 0 && config.workers.queue_capacity == 0 {
        return Err(ConfigError::Validation {
            message: "workers.queue_capacity must be positive when a pool is configured"
                .to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::LogFormat;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = load_config_from_str(r#"{"version": "1.0"}"#).unwrap();

        assert_eq!(config.server.port, 5000);
        assert_eq!(config.ocr.languages, vec!["chi_tra".to_string()]);
        assert_eq!(config.preprocess.threshold, Some(150));
        assert_eq!(config.export.raw_text_limit, 2000);
        assert_eq!(config.workers.pool_size, 0);
        assert_eq!(config.logging.format, LogFormat::Text);
    }

    #[test]
    fn test_full_config() {
        let json = r#"{
            "version": "1.0",
            "server": { "host": "127.0.0.1", "port": 8080, "max_upload_bytes": 1024 },
            "ocr": { "languages": ["chi_tra", "eng"], "dpi": 200 },
            "preprocess": { "max_width": 1200, "contrast": 20.5, "threshold": null, "sharpen": false },
            "export": { "include_raw_text": false, "filename_prefix": "receipts" },
            "workers": { "pool_size": 2, "queue_capacity": 4 },
            "logging": { "level": "debug", "format": "json" }
        }"#;

        let config = load_config_from_str(json).unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.ocr.languages.len(), 2);
        assert_eq!(config.ocr.dpi, 200);
        assert_eq!(config.preprocess.threshold, None);
        assert!(!config.preprocess.sharpen);
        assert!(!config.export.include_raw_text);
        assert_eq!(config.export.filename_prefix, "receipts");
        assert_eq!(config.workers.pool_size, 2);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_unsupported_version() {
        let result = load_config_from_str(r#"{"version": "2.0"}"#);

        match result {
            Err(ConfigError::Validation { message }) => {
                assert!(message.contains("Unsupported config version"));
            }
            other => panic!("Expected Validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_schema_rejects_unknown_field() {
        let result = load_config_from_str(r#"{"version": "1.0", "input_directory": "/tmp"}"#);
        assert!(matches!(result, Err(ConfigError::SchemaValidation { .. })));
    }

    #[test]
    fn test_schema_rejects_bad_port() {
        let result = load_config_from_str(r#"{"version": "1.0", "server": {"port": 0}}"#);
        assert!(matches!(result, Err(ConfigError::SchemaValidation { .. })));
    }

    #[test]
    fn test_empty_languages_rejected() {
        let result = load_config_from_str(r#"{"version": "1.0", "ocr": {"languages": []}}"#);
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_schema_rejects_raw_text_limit_above_cell_size() {
        let result =
            load_config_from_str(r#"{"version": "1.0", "export": {"raw_text_limit": 40000}}"#);
        assert!(matches!(result, Err(ConfigError::SchemaValidation { .. })));

        let config =
            load_config_from_str(r#"{"version": "1.0", "export": {"raw_text_limit": 32767}}"#)
                .unwrap();
        assert_eq!(config.export.raw_text_limit, 32767);
    }

    #[test]
    fn test_invalid_json() {
        let result = load_config_from_str("{not json");
        assert!(matches!(result, Err(ConfigError::ParseJson(_))));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"version": "1.0", "server": {{"port": 9000}}}}"#).unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn test_missing_file() {
        let result = load_config("/nonexistent/fapiao.json");
        assert!(matches!(result, Err(ConfigError::ReadFile { .. })));
    }
}
