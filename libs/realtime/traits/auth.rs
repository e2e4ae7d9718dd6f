use crate::error::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

/// Trait for providing the authentication event sent after connect
///
/// The event is emitted right after the server acknowledges the namespace
/// connect, on the first connection and after every reconnection.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Get the `(event, payload)` pair to emit
    ///
    /// # Returns
    /// * `Ok(Some(..))` - Emit this event
    /// * `Ok(None)` - No authentication required
    async fn auth_event(&self) -> Result<Option<(String, Value)>>;
}

/// A no-op auth provider
pub struct NoAuth;

#[async_trait]
impl AuthProvider for NoAuth {
    async fn auth_event(&self) -> Result<Option<(String, Value)>> {
        Ok(None)
    }
}

/// Announces the Telegram WebApp init data as `user_connected {initData}`
pub struct InitDataAuth {
    init_data: String,
}

impl InitDataAuth {
    pub fn new(init_data: impl Into<String>) -> Self {
        Self {
            init_data: init_data.into(),
        }
    }
}

#[async_trait]
impl AuthProvider for InitDataAuth {
    async fn auth_event(&self) -> Result<Option<(String, Value)>> {
        if self.init_data.is_empty() {
            return Ok(None);
        }
        Ok(Some((
            "user_connected".to_string(),
            json!({ "initData": self.init_data }),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_data_auth_event() {
        let auth = InitDataAuth::new("query_id=abc&user=1");
        let (name, payload) = auth.auth_event().await.unwrap().unwrap();
        assert_eq!(name, "user_connected");
        assert_eq!(payload["initData"], "query_id=abc&user=1");
    }

    #[tokio::test]
    async fn test_empty_init_data_skips_auth() {
        let auth = InitDataAuth::new("");
        assert!(auth.auth_event().await.unwrap().is_none());
        assert!(NoAuth.auth_event().await.unwrap().is_none());
    }
}
