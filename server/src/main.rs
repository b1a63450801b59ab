use fapiao_server::{serve, telemetry, AppState};
use log::info;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("fapiao-server: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = fapiao::load_config_from_env()?;
    telemetry::init_logging(&config.logging)?;

    info!("Starting fapiao-server v{}", env!("CARGO_PKG_VERSION"));

    let state = AppState::new(config)?;
    serve(state).await?;
    Ok(())
}
