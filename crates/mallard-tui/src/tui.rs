use std::io::{self, Stderr};
use std::time::Duration;
use anyhow::Result;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyEvent, KeyEventKind, MouseEvent,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use futures_util::StreamExt;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;

pub type Tui = Terminal<CrosstermBackend<Stderr>>;

#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize,
    Tick,
}

/// Terminal input plus a tick stream that only runs while something on
/// screen is animating.
pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<AppEvent>,
    _tx: mpsc::UnboundedSender<AppEvent>,
    ticking: watch::Sender<bool>,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let _tx = tx.clone();

        let tx_events = tx.clone();
        tokio::spawn(async move {
            let mut reader = event::EventStream::new();
            while let Some(evt) = reader.next().await {
                let app_event = match evt {
                    // Key presses only
                    Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => Some(AppEvent::Key(key)),
                    Ok(Event::Mouse(mouse)) => Some(AppEvent::Mouse(mouse)),
                    Ok(Event::Resize(_, _)) => Some(AppEvent::Resize),
                    Ok(_) => None,
                    Err(err) => {
                        tracing::warn!(%err, "terminal event stream error");
                        None
                    }
                };

                if let Some(event) = app_event {
                    if tx_events.send(event).is_err() {
                        break;
                    }
                }
            }
        });

        let (ticking, ticking_rx) = watch::channel(false);
        spawn_ticker(tx, tick_rate, ticking_rx);

        Self { rx, _tx, ticking }
    }

    /// Start or pause the tick stream. Idle sessions get no wakeups.
    pub fn set_ticking(&self, on: bool) {
        self.ticking.send_if_modified(|current| {
            let changed = *current != on;
            *current = on;
            changed
        });
    }

    pub async fn next(&mut self) -> Option<AppEvent> {
        self.rx.recv().await
    }
}

/// Sends `AppEvent::Tick` every `tick_rate` while `ticking` holds true.
fn spawn_ticker(
    tx: mpsc::UnboundedSender<AppEvent>,
    tick_rate: Duration,
    mut ticking: watch::Receiver<bool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tick_rate);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            if !*ticking.borrow_and_update() {
                if ticking.changed().await.is_err() {
                    break;
                }
                // First tick one period after resuming
                interval.reset();
                continue;
            }

            tokio::select! {
                _ = interval.tick() => {
                    if tx.send(AppEvent::Tick).is_err() {
                        break;
                    }
                }
                changed = ticking.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        tracing::debug!("tick task stopped");
    })
}

pub fn init() -> Result<Tui> {
    enable_raw_mode()?;
    // Mouse capture feeds wheel scrolling in the chat
    execute!(io::stderr(), EnterAlternateScreen, EnableMouseCapture)?;
    Ok(Terminal::new(CrosstermBackend::new(io::stderr()))?)
}

pub fn restore() -> Result<()> {
    execute!(io::stderr(), DisableMouseCapture, LeaveAlternateScreen)?;
    disable_raw_mode()?;
    Ok(())
}

/// Put the terminal back before the default hook prints the panic.
pub fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        if let Err(err) = restore() {
            tracing::error!(%err, "failed to restore terminal during panic");
        }
        default_hook(info);
    }));
}
