//! Application-level heartbeat
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │  Heartbeat Task     │
//! │  (Tokio spawn)      │
//! │                     │
//! │  Every interval:    │
//! │  1. Wait for tick   │
//! │  2. Emit timestamp ─┼──> Channel ──> Message Loop ──> 42["ping",{timestamp}]
//! │  3. Repeat          │                     │
//! └─────────────────────┘                     └─> PongTracker::record_ping_sent
//! ```
//!
//! The task lives exactly as long as one connection: it is spawned after the
//! namespace connect acknowledgment and stopped when the message loop exits.

use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

/// Epoch milliseconds carried in `ping {timestamp}`
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

/// Heartbeat task body
///
/// Skips the immediate first tick, then emits a timestamp every `interval`
/// until shutdown is signalled or the receiver is dropped.
pub async fn heartbeat_task(
    interval: Duration,
    tick_tx: mpsc::UnboundedSender<i64>,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.tick().await;
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    debug!("Heartbeat task started with interval: {:?}", interval);

    loop {
        tokio::select! {
            _ = &mut shutdown_rx => {
                debug!("Heartbeat task received shutdown signal");
                break;
            }
            _ = ticker.tick() => {
                if tick_tx.send(now_millis()).is_err() {
                    debug!("Heartbeat channel closed, shutting down heartbeat task");
                    break;
                }
            }
        }
    }

    debug!("Heartbeat task exiting");
}

/// Running heartbeat: stop it with [`Heartbeat::stop`] or by dropping it
pub struct Heartbeat {
    handle: tokio::task::JoinHandle<()>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl Heartbeat {
    /// Spawn a heartbeat task and return it with its tick receiver
    pub fn spawn(interval: Duration) -> (Self, mpsc::UnboundedReceiver<i64>) {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let (tick_tx, tick_rx) = mpsc::unbounded_channel();

        let handle = tokio::spawn(heartbeat_task(interval, tick_tx, shutdown_rx));

        (
            Self {
                handle,
                shutdown_tx: Some(shutdown_tx),
            },
            tick_rx,
        )
    }

    pub fn stop(mut self) {
        self.signal_stop();
    }

    fn signal_stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for Heartbeat {
    fn drop(&mut self) {
        self.signal_stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_heartbeat_ticks_after_interval() {
        let (heartbeat, mut rx) = Heartbeat::spawn(Duration::from_secs(25));

        tokio::time::sleep(Duration::from_secs(24)).await;
        assert!(rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(rx.recv().await.is_some());

        heartbeat.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_heartbeat_stops_on_signal() {
        let (heartbeat, mut rx) = Heartbeat::spawn(Duration::from_secs(1));
        heartbeat.stop();
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(rx.recv().await.is_none());
    }
}
