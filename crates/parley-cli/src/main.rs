use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use parley_core::{ChatSession, Locale, Settings};
use parley_cli::app::{self, App, TerminalNotifier};

#[derive(Parser)]
#[command(name = "parley")]
#[command(about = "Parley - chat with an AI assistant from the terminal")]
#[command(version)]
struct Cli {
    /// Send a single message and exit
    #[arg(short, long)]
    prompt: Option<String>,

    /// Model to use
    #[arg(short, long)]
    model: Option<String>,

    /// Interface language (en, ru)
    #[arg(long)]
    locale: Option<Locale>,

    /// Directory holding the chat history
    #[arg(long)]
    storage_dir: Option<PathBuf>,

    /// Config file (defaults to the platform config directory)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let mut settings = match cli.config {
        Some(ref path) => Settings::load_from(path),
        None => Settings::load(),
    };

    if let Some(model) = cli.model {
        settings.provider.model = model;
    }
    if let Some(locale) = cli.locale {
        settings.ui.locale = locale;
    }
    if let Some(dir) = cli.storage_dir {
        settings.storage.dir = Some(dir);
    }

    let provider = settings
        .build_provider()
        .context("Could not configure the completion provider")?;
    let store = settings.build_store();
    tracing::info!("Using chat storage at {}", store.path().display());

    let (event_tx, mut event_rx) = tokio::sync::mpsc::unbounded_channel();
    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            tracing::debug!(?event, "session event");
        }
    });

    let session = ChatSession::load(Arc::new(store), Arc::new(provider))
        .with_notifier(Arc::new(TerminalNotifier))
        .with_options(settings.session_options())
        .with_events(event_tx);

    let app = App::new(session, &settings);

    if let Some(prompt) = cli.prompt {
        app::run_single_prompt(&app, &prompt).await?;
    } else {
        app::run_repl(app).await?;
    }

    Ok(())
}
