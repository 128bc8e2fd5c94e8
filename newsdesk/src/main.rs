/*
newsdesk - main.rs
Starts the interactive console by default, or runs a single summarize request and exits.
*/

use anyhow::Result;
use clap::{Parser, Subcommand};
use common::{Config, CredentialStore, FileCredentialStore};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use newsdesk::console;
use newsdesk::processing::{Backend, Pipeline, PipelineSettings};

#[derive(Parser, Debug)]
#[command(name = "newsdesk", version, about = "Summarize a news article with an LLM")]
struct Args {
    /// Path to config.toml
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Override log level (info, debug, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive console (default)
    Console {
        /// URL to prefill
        #[arg(long)]
        url: Option<String>,
    },
    /// Summarize one article, print the summary and insights, and exit
    Summarize {
        /// Article URL
        #[arg(long)]
        url: String,

        /// API key; falls back to the stored credential
        #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr so they stay out of the console output
    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    // Resolve config paths
    let default_path = PathBuf::from("config.default.toml");
    let override_path = if let Some(p) = args.config {
        if !p.exists() {
            error!(path = ?p, "specified config file not found");
            return Err(anyhow::anyhow!("Config file not found: {}", p.display()));
        }
        Some(p)
    } else {
        let p = PathBuf::from("config.toml");
        if p.exists() { Some(p) } else { None }
    };

    let config = match Config::load_with_defaults(Some(default_path.as_path()), override_path.as_deref()).await {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(%e, "failed to load configuration");
            return Err(e);
        }
    };
    info!(default = ?default_path, override = ?override_path, "configuration loaded");

    let settings = PipelineSettings::from_config(&config);
    info!(api_url = %settings.api_url, model = %settings.model, "LLM endpoint configured");
    let pipeline = Pipeline::new(settings);
    let store = FileCredentialStore::new(config.credential_path());

    match args.command.unwrap_or(Command::Console { url: None }) {
        Command::Console { url } => console::run_console(Arc::new(pipeline), &store, url).await,
        Command::Summarize { url, api_key } => {
            let api_key = api_key.unwrap_or_else(|| store.load());
            let result = pipeline.summarize(&api_key, &url).await.map_err(|e| {
                error!(kind = e.kind(), error = %e, "summarize failed");
                e
            })?;
            println!("=== 요약 ===\n{}\n\n=== 인사이트 ===\n{}", result.summary, result.insights);
            Ok(())
        }
    }
}
