//! PONG Response Tracker
//!
//! Detects zombie connections: the transport still reports connected but the
//! server stopped answering. Each heartbeat ping arms a deadline; the matching
//! `pong` disarms it. A deadline that passes forces a disconnect.

use std::time::{Duration, Instant};

/// Tracks the outstanding heartbeat ping of one connection
///
/// Owned by the message loop, so no synchronization is needed.
#[derive(Debug)]
pub struct PongTracker {
    timeout: Duration,
    /// When the outstanding ping was sent
    outstanding: Option<Instant>,
    last_round_trip: Option<Duration>,
}

impl PongTracker {
    /// Create a tracker that tolerates `timeout` between ping and pong
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            outstanding: None,
            last_round_trip: None,
        }
    }

    /// Record that a ping was just sent
    ///
    /// A ping sent while another is outstanding keeps the older deadline.
    pub fn record_ping_sent(&mut self) {
        if self.outstanding.is_none() {
            self.outstanding = Some(Instant::now());
        }
    }

    /// Record a pong; any pong proves liveness and disarms the deadline
    pub fn record_pong_received(&mut self) {
        if let Some(sent_at) = self.outstanding.take() {
            self.last_round_trip = Some(sent_at.elapsed());
        }
    }

    /// Instant at which the outstanding ping counts as unanswered
    pub fn deadline(&self) -> Option<Instant> {
        self.outstanding.map(|sent_at| sent_at + self.timeout)
    }

    /// True while no ping is overdue
    pub fn is_healthy(&self) -> bool {
        match self.deadline() {
            Some(deadline) => Instant::now() < deadline,
            None => true,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Round trip of the last answered ping
    pub fn last_round_trip(&self) -> Option<Duration> {
        self.last_round_trip
    }

    /// Forget all state; called when a new connection starts
    pub fn reset(&mut self) {
        self.outstanding = None;
        self.last_round_trip = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_healthy_before_first_ping() {
        let tracker = PongTracker::new(Duration::from_secs(5));
        assert!(tracker.is_healthy());
        assert!(tracker.deadline().is_none());
    }

    #[test]
    fn test_pong_disarms_deadline() {
        let mut tracker = PongTracker::new(Duration::from_secs(5));
        tracker.record_ping_sent();
        assert!(tracker.deadline().is_some());
        tracker.record_pong_received();
        assert!(tracker.deadline().is_none());
        assert!(tracker.last_round_trip().is_some());
    }

    #[test]
    fn test_unhealthy_after_timeout() {
        let mut tracker = PongTracker::new(Duration::from_millis(30));
        tracker.record_ping_sent();
        assert!(tracker.is_healthy());
        sleep(Duration::from_millis(40));
        assert!(!tracker.is_healthy());
    }

    #[test]
    fn test_second_ping_keeps_first_deadline() {
        let mut tracker = PongTracker::new(Duration::from_secs(5));
        tracker.record_ping_sent();
        let first = tracker.deadline();
        sleep(Duration::from_millis(5));
        tracker.record_ping_sent();
        assert_eq!(tracker.deadline(), first);
    }

    #[test]
    fn test_reset() {
        let mut tracker = PongTracker::new(Duration::from_millis(10));
        tracker.record_ping_sent();
        sleep(Duration::from_millis(20));
        assert!(!tracker.is_healthy());
        tracker.reset();
        assert!(tracker.is_healthy());
    }
}
