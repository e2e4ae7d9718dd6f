//! Capability probe
//!
//! One HTTP request against the Engine.IO polling handshake before any
//! protocol upgrade. A failure means the push feature is disabled server-side,
//! so the caller turns the realtime layer off for the session instead of
//! retrying.

use crate::{RealtimeError, Result};
use std::time::Duration;
use tracing::{debug, warn};

/// Probe the push endpoint once
pub async fn probe(client: &reqwest::Client, url: &str, timeout: Duration) -> Result<()> {
    debug!("Probing push endpoint {}", url);

    let response = client
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| {
            warn!("Push endpoint probe failed: {}", e);
            RealtimeError::Unavailable(e.to_string())
        })?;

    let status = response.status();
    if !status.is_success() {
        warn!("Push endpoint probe returned {}", status);
        return Err(RealtimeError::Unavailable(format!("probe status {}", status)));
    }

    Ok(())
}
