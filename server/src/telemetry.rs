use fapiao::config::{LogFormat, LoggingConfig};
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter};

pub type TelemetryError = Box<dyn std::error::Error + Send + Sync>;

/// Installs the global subscriber. `RUST_LOG` overrides the configured level.
///
/// `log` records from the library are forwarded through `tracing-log`.
pub fn init_logging(config: &LoggingConfig) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(&config.level)));
    let registry = tracing_subscriber::registry().with(filter);

    match config.format {
        LogFormat::Json => {
            tracing::subscriber::set_global_default(registry.with(fmt::layer().json()))?;
        }
        LogFormat::Text => {
            tracing::subscriber::set_global_default(registry.with(fmt::layer()))?;
        }
    }
    tracing_log::LogTracer::init()?;
    Ok(())
}

fn default_directives(level: &str) -> String {
    format!("{level},tower_http={level}")
}
