//! Binary runner utilities
//!
//! Banner logging, periodic status lines and a common execute flow for the
//! long-running binaries.

use std::time::{Duration, Instant};
use tracing::info;

/// Configuration for running a binary application
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Name of the binary (for logging)
    pub name: String,
    /// Interval between status lines in seconds
    pub status_interval_secs: u64,
}

impl RunConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status_interval_secs: 60,
        }
    }

    pub fn with_status_interval(mut self, secs: u64) -> Self {
        self.status_interval_secs = secs;
        self
    }
}

/// Trait for binary applications
pub trait BinaryRunner {
    /// Run the application main loop
    async fn run(&mut self) -> anyhow::Result<()>;

    fn config(&self) -> &RunConfig;

    fn print_banner(&self) {
        info!("========================================");
        info!("Starting {}", self.config().name);
        info!("Press Ctrl+C to stop");
        info!("========================================");
    }

    fn print_shutdown(&self, stats: Option<&str>) {
        info!("========================================");
        info!("{} stopped gracefully", self.config().name);
        if let Some(stats) = stats {
            info!("{}", stats);
        }
        info!("========================================");
    }

    /// Banner, run, shutdown banner
    async fn execute(&mut self) -> anyhow::Result<()> {
        self.print_banner();
        let result = self.run().await;
        self.print_shutdown(None);
        result
    }
}

/// Decides when a periodic status line is due
#[derive(Debug)]
pub struct StatusTicker {
    interval: Duration,
    last: Instant,
}

impl StatusTicker {
    pub fn new(interval_secs: u64) -> Self {
        Self {
            interval: Duration::from_secs(interval_secs),
            last: Instant::now(),
        }
    }

    pub fn is_due(&self) -> bool {
        self.last.elapsed() >= self.interval
    }

    pub fn mark(&mut self) {
        self.last = Instant::now();
    }
}
