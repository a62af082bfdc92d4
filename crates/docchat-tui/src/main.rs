use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

use docchat_core::{BackendClient, Config};

mod app;
mod handler;
mod logging;
mod tasks;
mod tui;
mod ui;

use app::{App, Settings};
use tui::EventHandler;

#[derive(Parser)]
#[command(name = "docchat")]
#[command(version, about = "Upload PDFs and chat with an assistant grounded in them")]
struct Cli {
    /// Backend base URL (overrides DOCCHAT_BACKEND_URL and the config file)
    #[arg(long, value_name = "URL")]
    backend_url: Option<String>,

    /// Resume an existing conversation
    #[arg(long, value_name = "ID")]
    conversation: Option<String>,

    /// Stream answers as they are generated
    #[arg(long)]
    stream: bool,

    /// Log filter, e.g. "debug" or "docchat_core=trace"
    #[arg(long, value_name = "FILTER")]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load().unwrap_or_default();

    let log_filter = cli
        .log_level
        .clone()
        .or_else(|| config.log_filter.clone())
        .unwrap_or_else(|| "info".to_string());
    // Keep the guard alive for the whole session or buffered lines are lost
    let (_log_guard, log_path) = match logging::init(&log_filter) {
        Ok((guard, path)) => (Some(guard), Some(path)),
        Err(e) => {
            eprintln!("Logging disabled: {e}");
            (None, None)
        }
    };

    let backend_url = config.backend_url(cli.backend_url.as_deref());
    let client = BackendClient::new(&backend_url)?;
    info!(backend = %client.base_url(), "starting docchat");

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();

    let settings = Settings {
        stream: cli.stream || config.stream.unwrap_or(false),
        toast_timing: config.toast_timing(),
        log_path,
    };
    let mut app = App::new(client, events.sender(), settings);

    app.refresh_documents();
    if let Some(id) = cli.conversation {
        app.resume_conversation(id);
    }

    let result = run(&mut terminal, &mut events, &mut app).await;

    tui::restore()?;
    if let Err(e) = &result {
        warn!(error = %e, "exited with error");
    }
    result
}

async fn run(terminal: &mut tui::Tui, events: &mut EventHandler, app: &mut App) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event),
            None => break,
        }
    }
    Ok(())
}
