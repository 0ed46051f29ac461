// src/config/mod.rs
// Server configuration from command-line flags, with environment fallbacks

use anyhow::{Result, bail};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

use crate::coder::{DEFAULT_ENGINE_TIMEOUT_SECS, EngineSettings, default_engine_args};
use crate::server::{DEFAULT_HOST, DEFAULT_PORT};

#[derive(Debug, Clone, Parser)]
#[command(name = "coder-api")]
#[command(about = "REST API server connecting editor extensions to a Coder engine")]
#[command(version)]
pub struct ServerConfig {
    /// Host to bind to
    #[arg(long, env = "CODER_API_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port to bind to
    #[arg(short, long, env = "CODER_API_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Project directory the engine works in
    #[arg(short, long, env = "CODER_WORKSPACE", default_value = ".")]
    pub workspace: PathBuf,

    /// Engine executable
    #[arg(long = "engine", env = "CODER_ENGINE", default_value = "aider")]
    pub engine_command: String,

    /// Extra engine argument (repeatable); replaces the default non-interactive flags
    #[arg(long = "engine-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub engine_args: Vec<String>,

    /// AI model to use
    #[arg(short, long, env = "CODER_MODEL")]
    pub model: Option<String>,

    /// Seconds to wait for one engine turn
    #[arg(long, env = "CODER_ENGINE_TIMEOUT", default_value_t = DEFAULT_ENGINE_TIMEOUT_SECS)]
    pub engine_timeout: u64,

    /// Enable debug logging
    #[arg(long, env = "CODER_API_DEBUG")]
    pub debug: bool,
}

impl ServerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            bail!("host must not be empty");
        }
        if self.port == 0 {
            bail!("port must be between 1 and 65535");
        }
        if self.engine_timeout == 0 {
            bail!("engine timeout must be at least one second");
        }
        if !self.workspace.is_dir() {
            bail!("workspace {} is not a directory", self.workspace.display());
        }
        Ok(())
    }

    pub fn engine_settings(&self) -> EngineSettings {
        let args = if self.engine_args.is_empty() {
            default_engine_args()
        } else {
            self.engine_args.clone()
        };

        EngineSettings {
            command: self.engine_command.clone(),
            args,
            model: self.model.clone(),
            timeout: Duration::from_secs(self.engine_timeout),
        }
    }

    pub fn log_level(&self) -> Level {
        if self.debug { Level::DEBUG } else { Level::INFO }
    }
}
