use mallard_core::{
    ChatMessage, InteractionController, ReplyPhase, ReplyTicket, Scheduler,
    SubmitOutcome, TokioScheduler,
};

/// Ticks per step of the thinking spinner
const SPINNER_TICKS: u64 = 4;
pub const SPINNER_DOTS: usize = 5;

pub struct App<S: Scheduler = TokioScheduler> {
    pub should_quit: bool,
    pub controller: InteractionController<S>,

    // Chat viewport, measured by the last draw
    pub chat_scroll: u16,
    pub chat_height: u16,
    transcript_rows: u16,
    // Pin the viewport to the newest entry on every draw
    follow_bottom: bool,

    ticks: u64,
    pub animation_frame: usize, // 0..SPINNER_DOTS, lit dot of the spinner
}

impl<S: Scheduler> App<S> {
    pub fn new(controller: InteractionController<S>) -> Self {
        Self {
            should_quit: false,
            controller,
            chat_scroll: 0,
            chat_height: 0,
            transcript_rows: 0,
            follow_bottom: true,
            ticks: 0,
            animation_frame: 0,
        }
    }

    /// Submit the input buffer. Ignored by the controller while the duck is
    /// busy or when only whitespace was typed.
    pub fn submit(&mut self) {
        if let SubmitOutcome::Accepted { .. } = self.controller.submit() {
            self.animation_frame = 0;
            self.scroll_to_bottom();
        }
    }

    /// A reply timer fired.
    pub fn on_reply_due(&mut self, ticket: ReplyTicket) {
        if self.controller.on_timer(ticket) {
            self.scroll_to_bottom();
        }
    }

    /// Tick event: animate the spinner while waiting, reveal while revealing.
    pub fn tick(&mut self) {
        self.ticks = self.ticks.wrapping_add(1);
        match self.controller.reply_phase() {
            ReplyPhase::Waiting => {
                if self.ticks % SPINNER_TICKS == 0 {
                    self.animation_frame = (self.animation_frame + 1) % SPINNER_DOTS;
                }
            }
            ReplyPhase::Revealing => {
                // Frames and the final commit both grow the transcript
                if self.controller.tick_reveal().is_some() {
                    self.scroll_to_bottom();
                }
            }
            ReplyPhase::Idle => {}
        }
    }

    /// Ticks only matter while the spinner or the reveal is animating.
    pub fn needs_ticks(&self) -> bool {
        self.controller.reply_phase() != ReplyPhase::Idle
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
        self.controller.dispose();
    }

    /// Record the chat area measured during a draw. `transcript_rows` is the
    /// wrapped height of the whole transcript at the area's width.
    pub fn set_viewport(&mut self, height: u16, transcript_rows: u16) {
        self.chat_height = height;
        self.transcript_rows = transcript_rows;
        self.chat_scroll = if self.follow_bottom {
            self.max_scroll()
        } else {
            self.chat_scroll.min(self.max_scroll())
        };
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(self.max_scroll());
        if self.chat_scroll >= self.max_scroll() {
            self.follow_bottom = true;
        }
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
        self.follow_bottom = self.chat_scroll >= self.max_scroll();
    }

    pub fn half_page(&self) -> u16 {
        (self.chat_height / 2).max(1)
    }

    /// Keep the newest entry in view. The next draw re-measures the
    /// transcript, so this also holds after a resize.
    pub fn scroll_to_bottom(&mut self) {
        self.follow_bottom = true;
        self.chat_scroll = self.max_scroll();
    }

    pub fn is_following(&self) -> bool {
        self.follow_bottom
    }

    fn max_scroll(&self) -> u16 {
        self.transcript_rows.saturating_sub(self.chat_height)
    }

    pub fn timeline(&self) -> &[ChatMessage] {
        self.controller.timeline()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mallard_core::{
        ConversationStore, ControllerState, LatencyPolicy, ManualClock, ResponseEngine,
    };
    use std::time::Duration;

    fn app(clock: &ManualClock) -> App<ManualClock> {
        let store = ConversationStore::with_greeting("Quack! Ask me anything.").unwrap();
        let engine = ResponseEngine::seeded(
            LatencyPolicy::default(),
            vec!["Quack... I ponder.".to_string()],
            Some(1),
        )
        .unwrap();
        App::new(InteractionController::new(store, engine, clock.clone()))
    }

    fn type_text(app: &mut App<ManualClock>, text: &str) {
        for c in text.chars() {
            app.controller.input_mut().insert_char(c);
        }
    }

    #[test]
    fn test_round_trip_through_ticks() {
        let clock = ManualClock::new();
        let mut app = app(&clock);
        type_text(&mut app, "Why?");
        app.submit();
        assert_eq!(app.controller.state(), ControllerState::AwaitingReply);

        // spinner animates while waiting
        for _ in 0..SPINNER_TICKS {
            app.tick();
        }
        assert_eq!(app.animation_frame, 1);

        for ticket in clock.advance(Duration::from_secs(5)) {
            app.on_reply_due(ticket);
        }
        assert_eq!(app.controller.state(), ControllerState::RevealingReply);

        for _ in 0..100 {
            app.tick();
        }
        assert_eq!(app.controller.state(), ControllerState::Idle);
        assert_eq!(app.timeline().len(), 3);
        assert_eq!(app.timeline()[2], ChatMessage::bot("Quack... I ponder."));
    }

    #[test]
    fn test_viewport_follows_bottom_until_scrolled_up() {
        let clock = ManualClock::new();
        let mut app = app(&clock);

        app.set_viewport(4, 10);
        assert_eq!(app.chat_scroll, 6);

        app.scroll_up(100);
        assert_eq!(app.chat_scroll, 0);
        assert!(!app.is_following());
        // Growth while scrolled back leaves the reader where they are
        app.set_viewport(4, 12);
        assert_eq!(app.chat_scroll, 0);

        app.scroll_down(100);
        assert_eq!(app.chat_scroll, 8);
        assert!(app.is_following());
        app.set_viewport(4, 14);
        assert_eq!(app.chat_scroll, 10);
    }

    #[test]
    fn test_new_entry_resumes_following() {
        let clock = ManualClock::new();
        let mut app = app(&clock);
        app.set_viewport(4, 10);
        app.scroll_up(3);
        assert!(!app.is_following());

        type_text(&mut app, "Why?");
        app.submit();
        assert!(app.is_following());
        // A smaller area, e.g. after a resize, is re-pinned on the next draw
        app.set_viewport(2, 14);
        assert_eq!(app.chat_scroll, 12);
    }

    #[test]
    fn test_ticks_needed_only_while_animating() {
        let clock = ManualClock::new();
        let mut app = app(&clock);
        assert!(!app.needs_ticks());

        type_text(&mut app, "Why?");
        app.submit();
        assert!(app.needs_ticks());

        for ticket in clock.advance(Duration::from_secs(5)) {
            app.on_reply_due(ticket);
        }
        assert!(app.needs_ticks());

        while app.controller.reply_phase() != ReplyPhase::Idle {
            app.tick();
        }
        assert!(!app.needs_ticks());
    }

    #[test]
    fn test_quit_tears_down_pending_reply() {
        let clock = ManualClock::new();
        let mut app = app(&clock);
        type_text(&mut app, "Why?");
        app.submit();

        app.quit();
        assert!(app.should_quit);
        assert_eq!(clock.pending(), 0);
        assert_eq!(app.timeline().len(), 2);
    }
}
