//! Manolito chat server
//!
//! `manolito serve` exposes `POST /api/chat`; `manolito chat` runs the
//! interactive terminal loop. Both share the same pipeline.

use anyhow::Context;
use clap::{Parser, Subcommand};
use manolito_mysql::MySqlRunner;
use manolito_server::{
    config::Config, console, http, llm::OpenAiModel, logging, schema::SCHEMA_DESCRIPTION,
    Assistant,
};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "manolito", version, about = "Natural-language chat over the production database")]
struct Cli {
    /// Path to config.yaml
    #[arg(long, short, env = "MANOLITO_CONFIG", default_value = "config.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Clone, Copy)]
enum Command {
    /// Serve the HTTP chat endpoint (default)
    Serve,
    /// Interactive chat in the terminal, answers streamed as they arrive
    Chat,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Serve);

    let mut config = Config::load_or_default(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;

    // Keep the terminal readable unless asked otherwise
    if matches!(command, Command::Chat) && std::env::var("RUST_LOG").is_err() {
        config.logging.level = "warn".to_string();
    }

    config.apply_logging_env();
    logging::init();

    info!(model = %config.llm.model, base_url = %config.llm.base_url, "Using language model");

    let model = Arc::new(OpenAiModel::new(
        &config.llm.base_url,
        &config.llm.api_key,
        config.llm.model.clone(),
    ));
    let runner = Arc::new(MySqlRunner::connect_lazy(&config.database));
    let assistant = Assistant::new(
        model,
        runner.clone(),
        SCHEMA_DESCRIPTION,
        config.llm.answer_temperature,
    );

    match command {
        Command::Serve => {
            let addr = format!("{}:{}", config.server.host, config.server.port);
            http::serve(&addr, Arc::new(assistant))
                .await
                .with_context(|| format!("serving on {}", addr))?;
        }
        Command::Chat => {
            finish(console::run(&assistant), runner.close()).await?;
        }
    }

    Ok(())
}

/// Await `session`, then `shutdown`, even when the session failed
async fn finish<T, E>(
    session: impl Future<Output = Result<T, E>>,
    shutdown: impl Future<Output = ()>,
) -> Result<T, E> {
    let outcome = session.await;
    shutdown.await;
    outcome
}
