mod play;
mod serve;

use std::sync::Arc;

use clap::Parser;
use secrecy::ExposeSecret;

use roundtable::backends::groq::Groq;
use roundtable::config::{load_config, AppConfig};
use roundtable::Orchestrator;

use crate::args::{CliArgs, Command};
use crate::logging::init_logging;

pub async fn run() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    let loaded = load_config(args.config.clone())?;
    let _logger = init_logging(&loaded.config.logging)?;
    if !loaded.exists {
        log::debug!(
            "no config at {}, using defaults",
            loaded.path.display()
        );
    }

    match args.command() {
        Command::Serve { addr } => {
            let addr = addr.unwrap_or_else(|| loaded.config.server.addr.clone());
            let orchestrator = build_orchestrator(&loaded.config)?;
            serve::run(orchestrator, &addr).await
        }
        Command::Play { remote, topic } => play::run(&loaded.config, remote, topic).await,
    }
}

/// Wires the Groq client into an orchestrator.
///
/// A missing key is only warned about; requests then fail upstream with 401.
fn build_orchestrator(config: &AppConfig) -> anyhow::Result<Orchestrator> {
    let api_key = match config.api_key() {
        Some(key) => key.expose_secret().to_string(),
        None => {
            log::warn!(
                "{} is not set; completion requests will be rejected",
                config.provider.api_key_env
            );
            String::new()
        }
    };
    let groq = Groq::new(
        api_key,
        config.provider.base_url.clone(),
        config.provider.timeout_seconds,
    )?;
    Ok(config.orchestrator(Arc::new(groq))?)
}
