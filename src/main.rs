// src/main.rs
// coder-api - REST bridge between editor extensions and the Coder engine

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::FmtSubscriber;

use coder_api::coder::CliCoder;
use coder_api::config::ServerConfig;
use coder_api::{create_api_server, shared};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv(); // Load .env from current directory

    let config = ServerConfig::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level())
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    config.validate()?;

    info!("Initializing engine in {}", config.workspace.display());
    let coder = CliCoder::new(&config.workspace, config.engine_settings())?;
    info!(
        "Engine: {} (model: {})",
        config.engine_command,
        config.model.as_deref().unwrap_or("engine default")
    );
    info!("Working directory: {}", coder.root().display());

    let server = create_api_server(shared(coder), config.host.clone(), config.port);
    info!("Configure your editor extension with: http://{}", server.address());

    server.run().await
}
