use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Opt-in reconnect with exponential backoff. `max_attempts == 0` means a
/// dropped stream stays dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 0,
            initial_delay_ms: 1_000,
            max_delay_ms: 30_000,
        }
    }
}

impl ReconnectPolicy {
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn enabled(&self) -> bool {
        self.max_attempts > 0
    }

    /// Delay before reconnect attempt `attempt` (1-based), or `None` once the
    /// policy gives up.
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt > self.max_attempts {
            return None;
        }
        let shift = (attempt - 1).min(20);
        let ms = self
            .initial_delay_ms
            .max(1)
            .saturating_mul(1u64 << shift)
            .min(self.max_delay_ms.max(self.initial_delay_ms.max(1)));
        Some(Duration::from_millis(ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_never_reconnects() {
        let p = ReconnectPolicy::default();
        assert!(!p.enabled());
        assert_eq!(p.delay_for(1), None);
    }

    #[test]
    fn delays_double_then_cap_then_stop() {
        let p = ReconnectPolicy {
            max_attempts: 6,
            initial_delay_ms: 500,
            max_delay_ms: 4_000,
        };
        let delays: Vec<u64> = (1..=6)
            .map(|a| p.delay_for(a).unwrap().as_millis() as u64)
            .collect();
        assert_eq!(delays, vec![500, 1_000, 2_000, 4_000, 4_000, 4_000]);
        assert_eq!(p.delay_for(7), None);
    }
}
