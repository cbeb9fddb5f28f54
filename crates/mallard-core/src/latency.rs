use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{MallardError, Result};

/// How long the duck "thinks" before answering.
///
/// Delay grows linearly with the length of the question and is capped at
/// `max_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LatencyPolicy {
    pub base_ms: u64,
    pub per_char_ms: u64,
    pub max_ms: u64,
}

impl Default for LatencyPolicy {
    fn default() -> Self {
        Self {
            base_ms: 600,
            per_char_ms: 40,
            max_ms: 4_000,
        }
    }
}

impl LatencyPolicy {
    /// `min(base + per_char * input_len, max)`, measured in characters.
    pub fn compute_delay(&self, input_len: usize) -> Duration {
        let len = u64::try_from(input_len).unwrap_or(u64::MAX);
        let ms = self
            .per_char_ms
            .saturating_mul(len)
            .saturating_add(self.base_ms)
            .min(self.max_ms);
        Duration::from_millis(ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_ms > self.max_ms {
            return Err(MallardError::InvalidArgument(format!(
                "latency base_ms ({}) exceeds max_ms ({})",
                self.base_ms, self.max_ms
            )));
        }
        Ok(())
    }
}
