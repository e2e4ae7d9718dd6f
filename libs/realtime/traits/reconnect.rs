use rand::Rng;
use std::time::Duration;

/// Trait for defining reconnection strategies
///
/// Implement this trait to control how the client should
/// behave when reconnecting after a disconnection.
pub trait ReconnectionStrategy: Send + Sync {
    /// Get the delay before the given reconnection attempt
    ///
    /// # Arguments
    /// * `attempt` - The reconnection attempt number (1-indexed)
    ///
    /// # Returns
    /// * `Some(duration)` - Wait this long before reconnecting
    /// * `None` - Stop reconnecting
    fn next_delay(&self, attempt: usize) -> Option<Duration>;

    /// Check if we should continue reconnecting
    fn should_reconnect(&self, attempt: usize) -> bool;
}

/// Exponential backoff with proportional jitter
///
/// Pre-jitter delay for attempt `n` is `min(base * 2^(n-1), max)`.
/// The final delay adds `delay * jitter * r` with `r` uniform in `[0, 1)`,
/// so it always lies in `[delay, delay * (1 + jitter))`.
#[derive(Debug, Clone)]
pub struct JitteredBackoff {
    base_delay: Duration,
    max_delay: Duration,
    max_attempts: Option<usize>,
    jitter: f64,
}

impl JitteredBackoff {
    /// Create a new backoff strategy
    ///
    /// # Arguments
    /// * `base_delay` - Delay before the first reconnect
    /// * `max_delay` - Cap applied before jitter
    /// * `max_attempts` - Maximum number of attempts (None = unlimited)
    /// * `jitter` - Jitter factor, clamped to `[0, 1]`
    pub fn new(
        base_delay: Duration,
        max_delay: Duration,
        max_attempts: Option<usize>,
        jitter: f64,
    ) -> Self {
        Self {
            base_delay,
            max_delay,
            max_attempts,
            jitter: jitter.clamp(0.0, 1.0),
        }
    }

    /// Pre-jitter delay for a 1-indexed attempt
    pub fn base_delay(&self, attempt: usize) -> Duration {
        let exponent = attempt.saturating_sub(1).min(63) as u32;
        let factor = 1u64 << exponent;
        let base_ms = self.base_delay.as_millis() as u64;
        let delay_ms = base_ms.saturating_mul(factor);
        Duration::from_millis(delay_ms.min(self.max_delay.as_millis() as u64))
    }

    /// Delay for an attempt with an explicit random sample in `[0, 1)`
    pub fn delay_with_sample(&self, attempt: usize, sample: f64) -> Duration {
        let delay = self.base_delay(attempt);
        let extra_ms = (delay.as_millis() as f64 * self.jitter * sample.clamp(0.0, 1.0)) as u64;
        delay + Duration::from_millis(extra_ms)
    }

    pub fn max_attempts(&self) -> Option<usize> {
        self.max_attempts
    }

    pub fn jitter(&self) -> f64 {
        self.jitter
    }
}

impl Default for JitteredBackoff {
    fn default() -> Self {
        Self::new(
            Duration::from_millis(1_000),
            Duration::from_millis(30_000),
            Some(8),
            0.3,
        )
    }
}

impl ReconnectionStrategy for JitteredBackoff {
    fn next_delay(&self, attempt: usize) -> Option<Duration> {
        if !self.should_reconnect(attempt) {
            return None;
        }
        let sample: f64 = rand::thread_rng().gen();
        Some(self.delay_with_sample(attempt, sample))
    }

    fn should_reconnect(&self, attempt: usize) -> bool {
        attempt >= 1 && self.max_attempts.map_or(true, |max| attempt <= max)
    }
}

/// Fixed delay reconnection strategy
///
/// Always waits the same amount of time between reconnection attempts
#[derive(Debug, Clone)]
pub struct FixedDelay {
    delay: Duration,
    max_attempts: Option<usize>,
}

impl FixedDelay {
    pub fn new(delay: Duration, max_attempts: Option<usize>) -> Self {
        Self { delay, max_attempts }
    }
}

impl ReconnectionStrategy for FixedDelay {
    fn next_delay(&self, attempt: usize) -> Option<Duration> {
        if !self.should_reconnect(attempt) {
            return None;
        }
        Some(self.delay)
    }

    fn should_reconnect(&self, attempt: usize) -> bool {
        attempt >= 1 && self.max_attempts.map_or(true, |max| attempt <= max)
    }
}

/// Never reconnect strategy
#[derive(Debug, Clone)]
pub struct NeverReconnect;

impl ReconnectionStrategy for NeverReconnect {
    fn next_delay(&self, _attempt: usize) -> Option<Duration> {
        None
    }

    fn should_reconnect(&self, _attempt: usize) -> bool {
        false
    }
}
