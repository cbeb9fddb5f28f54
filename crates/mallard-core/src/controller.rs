//! The conversation state machine.
//!
//! ```text
//!   Idle --submit--> AwaitingReply --on_timer--> RevealingReply --reveal done--> Idle
//! ```
//!
//! At most one reply is in flight. Submissions while a reply is pending are
//! ignored, and a controller that has been disposed ignores everything.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::Rng;
use tracing::{debug, info, warn};

use crate::clock::{ReplyTicket, Scheduler, TimerHandle};
use crate::config::Config;
use crate::engine::{default_phrases, ResponseEngine};
use crate::error::Result;
use crate::input::InputBuffer;
use crate::reveal::{Reveal, RevealEvent, DEFAULT_CHARS_PER_FRAME};
use crate::state::ChatMessage;
use crate::store::ConversationStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    AwaitingReply,
    RevealingReply,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyPhase {
    Idle,
    Waiting,
    Revealing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Accepted { delay: Duration },
    /// Nothing but whitespace was submitted.
    Blank,
    /// A reply is already pending.
    Busy,
    Disposed,
}

/// The one reply currently being produced.
#[derive(Debug)]
pub struct PendingReply<H> {
    source_text: String,
    chosen_text: Option<String>,
    phase: ReplyPhase,
    ticket: ReplyTicket,
    delay: Duration,
    timer: Option<H>,
    reveal: Option<Reveal>,
}

impl<H> PendingReply<H> {
    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    pub fn chosen_text(&self) -> Option<&str> {
        self.chosen_text.as_deref()
    }

    pub fn phase(&self) -> ReplyPhase {
        self.phase
    }

    pub fn ticket(&self) -> ReplyTicket {
        self.ticket
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Text revealed so far, while revealing.
    pub fn revealed_text(&self) -> Option<&str> {
        self.reveal.as_ref().map(Reveal::visible)
    }
}

pub struct InteractionController<S: Scheduler, R: Rng = StdRng> {
    store: ConversationStore,
    engine: ResponseEngine<R>,
    scheduler: S,
    input: InputBuffer,
    pending: Option<PendingReply<S::Handle>>,
    next_ticket: ReplyTicket,
    reveal_chars_per_frame: usize,
    disposed: bool,
}

impl<S: Scheduler> InteractionController<S, StdRng> {
    /// Build a controller from user configuration.
    pub fn from_config(config: &Config, scheduler: S) -> Result<Self> {
        config.validate()?;

        let store = match &config.greeting {
            Some(greeting) => ConversationStore::with_greeting(greeting)?,
            None => ConversationStore::new(),
        };
        let phrases = config.phrases.clone().unwrap_or_else(default_phrases);
        let engine = ResponseEngine::seeded(config.latency, phrases, config.seed)?;

        Ok(Self::new(store, engine, scheduler).with_reveal_speed(config.reveal_chars_per_frame))
    }
}

impl<S: Scheduler, R: Rng> InteractionController<S, R> {
    pub fn new(store: ConversationStore, engine: ResponseEngine<R>, scheduler: S) -> Self {
        Self {
            store,
            engine,
            scheduler,
            input: InputBuffer::new(),
            pending: None,
            next_ticket: ReplyTicket::new(1),
            reveal_chars_per_frame: DEFAULT_CHARS_PER_FRAME,
            disposed: false,
        }
    }

    pub fn with_reveal_speed(mut self, chars_per_frame: usize) -> Self {
        self.reveal_chars_per_frame = chars_per_frame.max(1);
        self
    }

    pub fn state(&self) -> ControllerState {
        match self.reply_phase() {
            ReplyPhase::Idle => ControllerState::Idle,
            ReplyPhase::Waiting => ControllerState::AwaitingReply,
            ReplyPhase::Revealing => ControllerState::RevealingReply,
        }
    }

    pub fn reply_phase(&self) -> ReplyPhase {
        self.pending
            .as_ref()
            .map(|p| p.phase)
            .unwrap_or(ReplyPhase::Idle)
    }

    /// True when a new question may be submitted.
    pub fn accepts_input(&self) -> bool {
        !self.disposed && self.pending.is_none()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn timeline(&self) -> &[ChatMessage] {
        self.store.snapshot()
    }

    pub fn pending(&self) -> Option<&PendingReply<S::Handle>> {
        self.pending.as_ref()
    }

    pub fn input(&self) -> &InputBuffer {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut InputBuffer {
        &mut self.input
    }

    /// Submit whatever is in the input buffer.
    pub fn submit(&mut self) -> SubmitOutcome {
        let text = self.input.as_str().to_string();
        self.submit_text(&text)
    }

    /// Submit `text` as the user's next question.
    ///
    /// On acceptance the trimmed text is appended to the timeline before the
    /// reply timer starts, and the input buffer is cleared.
    pub fn submit_text(&mut self, text: &str) -> SubmitOutcome {
        if self.disposed {
            debug!("submission ignored after teardown");
            return SubmitOutcome::Disposed;
        }
        if self.pending.is_some() {
            debug!(phase = ?self.reply_phase(), "submission ignored while a reply is pending");
            return SubmitOutcome::Busy;
        }

        let text = text.trim();
        if text.is_empty() {
            return SubmitOutcome::Blank;
        }
        if let Err(err) = self.store.append(ChatMessage::user(text)) {
            debug!(%err, "submission rejected");
            return SubmitOutcome::Blank;
        }
        self.input.clear();

        let ticket = self.next_ticket;
        self.next_ticket = ticket.next();
        let scheduled = self.engine.schedule_reply(&self.scheduler, text, ticket);
        info!(
            chars = text.chars().count(),
            delay_ms = scheduled.delay.as_millis() as u64,
            "submit accepted"
        );

        self.pending = Some(PendingReply {
            source_text: text.to_string(),
            chosen_text: None,
            phase: ReplyPhase::Waiting,
            ticket,
            delay: scheduled.delay,
            timer: Some(scheduled.timer),
            reveal: None,
        });

        SubmitOutcome::Accepted {
            delay: scheduled.delay,
        }
    }

    /// Deliver an expired reply timer.
    ///
    /// Returns true if the ticket belonged to the waiting reply and the reveal
    /// has started. Stale or unknown tickets are ignored.
    pub fn on_timer(&mut self, ticket: ReplyTicket) -> bool {
        if self.disposed {
            debug!(ticket = ticket.id(), "timer ignored after teardown");
            return false;
        }
        let waiting = matches!(
            &self.pending,
            Some(p) if p.phase == ReplyPhase::Waiting && p.ticket == ticket
        );
        if !waiting {
            debug!(ticket = ticket.id(), "stale reply timer ignored");
            return false;
        }

        let text = self.engine.choose_response();
        self.on_ready(text);
        true
    }

    fn on_ready(&mut self, text: String) {
        let chars_per_frame = self.reveal_chars_per_frame;
        if let Some(pending) = self.pending.as_mut() {
            info!(ticket = pending.ticket.id(), reply = %text, "reply ready");
            pending.timer = None;
            pending.reveal = Some(Reveal::new(text.clone(), chars_per_frame));
            pending.chosen_text = Some(text);
            pending.phase = ReplyPhase::Revealing;
        }
    }

    /// Advance the reveal by one frame. When the reveal finishes, the reply
    /// is committed to the timeline and the controller is idle again.
    pub fn tick_reveal(&mut self) -> Option<RevealEvent> {
        let event = self
            .pending
            .as_mut()
            .filter(|p| p.phase == ReplyPhase::Revealing)
            .and_then(|p| p.reveal.as_mut())
            .and_then(|reveal| reveal.next())?;

        if event == RevealEvent::Done {
            self.on_reveal_done();
        }
        Some(event)
    }

    fn on_reveal_done(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        let Some(text) = pending.chosen_text else {
            return;
        };
        match self.store.append(ChatMessage::bot(text)) {
            Ok(()) => info!(ticket = pending.ticket.id(), "reply committed"),
            Err(err) => warn!(%err, "dropping reply"),
        }
    }

    /// Tear down: cancel any pending timer and refuse further work. A reply
    /// that is mid-reveal is dropped without being committed.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        if let Some(pending) = self.pending.take() {
            if let Some(timer) = pending.timer {
                timer.cancel();
            }
            info!(phase = ?pending.phase, "controller disposed with reply in flight");
        } else {
            info!("controller disposed");
        }
    }
}

impl<S: Scheduler, R: Rng> Drop for InteractionController<S, R> {
    fn drop(&mut self) {
        self.dispose();
    }
}
