//! briefgen - terminal client for the brief generation service
//!
//! Select files, pick an output language, submit, and review the generated
//! meetings and action items. The document itself can be saved with `w`.

mod app;
mod handler;
mod tui;
mod ui;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use briefgen_core::{BriefService, Config, HttpBriefClient, OutputLanguage};

use crate::app::App;
use crate::tui::{EventHandler, Tui};

#[derive(Parser)]
#[command(name = "briefgen")]
#[command(version, about = "Generate creative briefs, meeting proposals, and action items")]
struct Args {
    /// Files to preselect for submission
    files: Vec<PathBuf>,

    /// Base URL of the brief service
    #[arg(long, env = "BRIEFGEN_SERVICE_URL")]
    service_url: Option<String>,

    /// Output language (English, Spanish, French, German, Hindi, Chinese)
    #[arg(short, long, value_parser = parse_language)]
    language: Option<OutputLanguage>,
}

fn parse_language(s: &str) -> Result<OutputLanguage, String> {
    OutputLanguage::from_str(s).ok_or_else(|| {
        let names: Vec<&str> = OutputLanguage::all().iter().map(|l| l.as_str()).collect();
        format!("unknown language '{}' (expected one of: {})", s, names.join(", "))
    })
}

/// Log to a daily file so output never lands on the alternate screen
fn init_logging() -> Option<WorkerGuard> {
    let log_dir = Config::config_dir()
        .map(|dir| dir.join("logs"))
        .unwrap_or_else(|_| std::env::temp_dir().join("briefgen"));

    let appender = tracing_appender::rolling::daily(log_dir, "briefgen.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "briefgen_core=info,briefgen=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(writer).with_ansi(false))
        .try_init()
        .ok()?;

    Some(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let _log_guard = init_logging();

    let mut config = Config::load().unwrap_or_else(|e| {
        tracing::warn!("Using default config: {}", e);
        Config::new()
    });
    if let Some(url) = args.service_url {
        config.service_url = url;
    }
    if let Some(language) = args.language {
        config.language = language;
    }

    info!(
        "Starting briefgen v{} against {}",
        env!("CARGO_PKG_VERSION"),
        config.service_url
    );

    let service: Arc<dyn BriefService> = Arc::new(HttpBriefClient::new(&config));
    let mut app = App::new(config, service);
    for path in &args.files {
        app.add_path(&path.to_string_lossy()).await;
    }

    tui::install_panic_hook();
    let mut terminal = tui::init().context("Failed to initialize terminal")?;
    let result = run(&mut terminal, &mut app).await;
    tui::restore()?;

    result
}

async fn run(terminal: &mut Tui, app: &mut App) -> Result<()> {
    let mut events = EventHandler::new();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event).await?,
            None => break,
        }
        app.poll_submission().await;
    }

    info!("Exiting");
    Ok(())
}
