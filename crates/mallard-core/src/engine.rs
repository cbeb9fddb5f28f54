use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::clock::{ReplyTicket, Scheduler};
use crate::error::{MallardError, Result};
use crate::latency::LatencyPolicy;

/// Everything the duck knows how to say.
pub const DUCK_RESPONSES: &[&str] = &[
    "Quack!",
    "Quack quack!",
    "Quack?  Are you sure?",
    "Quack! That's a fine question.",
    "Quack... I ponder.",
    "Quack.  My thoughts are murky.",
];

pub fn default_phrases() -> Vec<String> {
    DUCK_RESPONSES.iter().map(|s| s.to_string()).collect()
}

/// A reply timer that has been started for one submission.
#[derive(Debug)]
pub struct ScheduledReply<H> {
    pub ticket: ReplyTicket,
    pub delay: Duration,
    pub timer: H,
}

/// Picks canned replies and decides how long to wait before giving them.
pub struct ResponseEngine<R = StdRng> {
    phrases: Vec<String>,
    policy: LatencyPolicy,
    rng: R,
}

impl ResponseEngine<StdRng> {
    /// The stock duck: default phrase table, seeded from `seed` when given and
    /// from OS entropy otherwise.
    pub fn duck(policy: LatencyPolicy, seed: Option<u64>) -> Result<Self> {
        Self::seeded(policy, default_phrases(), seed)
    }

    pub fn seeded(policy: LatencyPolicy, phrases: Vec<String>, seed: Option<u64>) -> Result<Self> {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::new(policy, phrases, rng)
    }
}

impl<R: Rng> ResponseEngine<R> {
    pub fn new(policy: LatencyPolicy, phrases: Vec<String>, rng: R) -> Result<Self> {
        policy.validate()?;
        if phrases.is_empty() {
            return Err(MallardError::InvalidArgument(
                "phrase table must not be empty".to_string(),
            ));
        }
        if phrases.iter().any(|p| p.trim().is_empty()) {
            return Err(MallardError::InvalidArgument(
                "phrase table must not contain blank phrases".to_string(),
            ));
        }
        Ok(Self {
            phrases,
            policy,
            rng,
        })
    }

    pub fn policy(&self) -> &LatencyPolicy {
        &self.policy
    }

    pub fn compute_delay(&self, input_len: usize) -> Duration {
        self.policy.compute_delay(input_len)
    }

    /// Uniform pick from the phrase table. Repeats across turns are allowed.
    pub fn choose_response(&mut self) -> String {
        let idx = self.rng.gen_range(0..self.phrases.len());
        self.phrases[idx].clone()
    }

    /// Start the thinking timer for `input_text`.
    pub fn schedule_reply<S: Scheduler>(
        &self,
        scheduler: &S,
        input_text: &str,
        ticket: ReplyTicket,
    ) -> ScheduledReply<S::Handle> {
        let delay = self.compute_delay(input_text.chars().count());
        let timer = scheduler.schedule(delay, ticket);
        debug!(ticket = ticket.id(), delay_ms = delay.as_millis() as u64, "reply scheduled");
        ScheduledReply {
            ticket,
            delay,
            timer,
        }
    }
}
