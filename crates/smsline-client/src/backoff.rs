use std::time::Duration;

use smsline_core::config::ClientConfig;

/// Jitter fraction applied to each delay (±10 %).
const JITTER_FRACTION: f64 = 0.10;

/// Reconnect schedule: exponential backoff with jitter and an optional
/// attempt cap.
///
/// Schedule with the defaults: 5 s → 10 s → 20 s → 40 s → 60 s (cap) → 60 s …
/// Call [`reset`](Self::reset) after a successful connect.
#[derive(Debug, Clone)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    max_attempts: Option<u32>,
    jitter: f64,
    attempt: u32,
    current: Duration,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration, max_attempts: Option<u32>) -> Self {
        Self {
            base,
            max: max.max(base),
            max_attempts,
            jitter: JITTER_FRACTION,
            attempt: 0,
            current: base,
        }
    }

    pub fn from_config(cfg: &ClientConfig) -> Self {
        Self::new(
            Duration::from_millis(cfg.reconnect_base_ms),
            Duration::from_millis(cfg.reconnect_max_ms),
            cfg.max_attempts,
        )
    }

    /// Override the jitter fraction (0.0 disables jitter).
    pub fn with_jitter(mut self, fraction: f64) -> Self {
        self.jitter = fraction.clamp(0.0, 1.0);
        self
    }

    /// Consecutive attempts since the last reset.
    pub fn attempts(&self) -> u32 {
        self.attempt
    }

    /// Delay before the next attempt, or `None` once the cap is reached.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.max_attempts.is_some_and(|max| self.attempt >= max) {
            return None;
        }
        self.attempt += 1;
        let delay = self.current;
        self.current = (self.current * 2).min(self.max);
        Some(apply_jitter(delay, self.jitter))
    }

    pub fn reset(&mut self) {
        self.attempt = 0;
        self.current = self.base;
    }
}

/// Spread `delay` by up to ±`fraction`.
///
/// Uses the sub-second part of the wall clock as the random source, avoiding
/// a rand dependency.
fn apply_jitter(delay: Duration, fraction: f64) -> Duration {
    let span_ms = (delay.as_millis() as f64 * fraction) as u64;
    if span_ms == 0 {
        return delay;
    }
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    // offset in [0, 2 * span], shifted to [-span, +span]
    let offset = (nanos as u64) % (2 * span_ms + 1);
    let low = delay.saturating_sub(Duration::from_millis(span_ms));
    low + Duration::from_millis(offset)
}
