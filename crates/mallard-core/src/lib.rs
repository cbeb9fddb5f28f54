pub mod clock;
pub mod config;
pub mod controller;
pub mod engine;
pub mod error;
pub mod input;
pub mod latency;
pub mod reveal;
pub mod state;
pub mod store;

// Re-export main types for convenience
pub use clock::{ManualClock, ReplyTicket, Scheduler, TimerHandle, TokioScheduler};
pub use config::Config;
pub use controller::{ControllerState, InteractionController, PendingReply, ReplyPhase, SubmitOutcome};
pub use engine::{ResponseEngine, DUCK_RESPONSES};
pub use error::{MallardError, Result};
pub use input::InputBuffer;
pub use latency::LatencyPolicy;
pub use reveal::{Reveal, RevealEvent};
pub use state::{ChatMessage, ChatRole};
pub use store::ConversationStore;
