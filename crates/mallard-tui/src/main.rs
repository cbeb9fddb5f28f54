use std::time::Duration;

use anyhow::{Context, Result};
use mallard_core::{Config, InteractionController, ReplyTicket, TokioScheduler};
use tokio::sync::mpsc;
use tracing::{error, info};

mod app;
mod handler;
mod logging;
mod tui;
mod ui;

use app::App;
use tui::{EventHandler, Tui};

#[tokio::main]
async fn main() -> Result<()> {
    let log_path = logging::init_logging()?;
    info!(log = %log_path.display(), "starting llmallard");

    let config = Config::load().context("Failed to load config")?;
    let (scheduler, mut replies) = TokioScheduler::new();
    let controller = InteractionController::from_config(&config, scheduler)
        .context("Invalid configuration")?;
    let mut app = App::new(controller);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new(Duration::from_millis(config.tick_rate_ms));

    let result = run(&mut terminal, &mut app, &mut events, &mut replies).await;

    app.controller.dispose();
    tui::restore()?;

    if let Err(err) = &result {
        error!(error = %err, "llmallard exited with an error");
    }
    result
}

async fn run(
    terminal: &mut Tui,
    app: &mut App,
    events: &mut EventHandler,
    replies: &mut mpsc::UnboundedReceiver<ReplyTicket>,
) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        tokio::select! {
            Some(event) = events.next() => handler::handle_event(app, event),
            Some(ticket) = replies.recv() => app.on_reply_due(ticket),
            else => break,
        }
        events.set_ticking(app.needs_ticks());
    }

    info!(messages = app.timeline().len(), "session ended");
    Ok(())
}
