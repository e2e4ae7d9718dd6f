//! Topic subscription bookkeeping
//!
//! Two sets are kept: `pending` holds every topic the application asked for,
//! `subscribed` holds the topics already sent over the current socket. A
//! subscribe issued while disconnected lands in `pending` only and is sent by
//! [`TopicRegistry::flush_on_connect`]; a disconnect clears `subscribed` so the
//! next connection re-emits everything.

use parking_lot::Mutex;
use std::collections::BTreeSet;

#[derive(Debug, Default)]
struct Topics {
    pending: BTreeSet<String>,
    subscribed: BTreeSet<String>,
    connected: bool,
}

/// Thread-safe topic registry shared by the client handle and its task
#[derive(Debug, Default)]
pub struct TopicRegistry {
    inner: Mutex<Topics>,
}

impl TopicRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record interest in a topic
    ///
    /// Returns true when a `subscribe` frame must be sent right now.
    pub fn subscribe(&self, topic: &str) -> bool {
        let mut topics = self.inner.lock();
        topics.pending.insert(topic.to_string());
        if topics.connected && !topics.subscribed.contains(topic) {
            topics.subscribed.insert(topic.to_string());
            return true;
        }
        false
    }

    /// Drop interest in a topic
    ///
    /// Returns true when an `unsubscribe` frame must be sent right now.
    pub fn unsubscribe(&self, topic: &str) -> bool {
        let mut topics = self.inner.lock();
        let removed_pending = topics.pending.remove(topic);
        let removed_subscribed = topics.subscribed.remove(topic);
        topics.connected && (removed_pending || removed_subscribed)
    }

    /// True if the topic is pending or subscribed
    pub fn has(&self, topic: &str) -> bool {
        let topics = self.inner.lock();
        topics.pending.contains(topic) || topics.subscribed.contains(topic)
    }

    /// Mark the socket connected and return the topics to send
    pub fn flush_on_connect(&self) -> Vec<String> {
        let mut topics = self.inner.lock();
        topics.connected = true;
        let to_send: Vec<String> = topics
            .pending
            .iter()
            .filter(|t| !topics.subscribed.contains(*t))
            .cloned()
            .collect();
        topics.subscribed.extend(to_send.iter().cloned());
        to_send
    }

    /// Mark the socket disconnected; nothing counts as sent anymore
    pub fn on_disconnect(&self) {
        let mut topics = self.inner.lock();
        topics.connected = false;
        topics.subscribed.clear();
    }

    pub fn pending(&self) -> Vec<String> {
        self.inner.lock().pending.iter().cloned().collect()
    }

    pub fn subscribed(&self) -> Vec<String> {
        self.inner.lock().subscribed.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribe_before_connect_is_deferred() {
        let registry = TopicRegistry::new();
        assert!(!registry.subscribe("global"));
        assert!(registry.has("global"));
        assert!(registry.subscribed().is_empty());

        assert_eq!(registry.flush_on_connect(), vec!["global".to_string()]);
        assert_eq!(registry.subscribed(), vec!["global".to_string()]);
    }

    #[test]
    fn test_subscribe_is_idempotent_when_connected() {
        let registry = TopicRegistry::new();
        registry.flush_on_connect();
        assert!(registry.subscribe("predictions_page"));
        assert!(!registry.subscribe("predictions_page"));
    }

    #[test]
    fn test_reconnect_reemits_pending() {
        let registry = TopicRegistry::new();
        registry.subscribe("global");
        registry.subscribe("admin_refresh");
        registry.flush_on_connect();

        registry.on_disconnect();
        assert!(registry.subscribed().is_empty());
        assert!(registry.has("global"));

        let mut resent = registry.flush_on_connect();
        resent.sort();
        assert_eq!(resent, vec!["admin_refresh".to_string(), "global".to_string()]);
    }

    #[test]
    fn test_unsubscribe_removes_from_both_sets() {
        let registry = TopicRegistry::new();
        registry.subscribe("match_odds_7");
        assert!(!registry.unsubscribe("match_odds_7"));
        assert!(!registry.has("match_odds_7"));

        registry.flush_on_connect();
        registry.subscribe("global");
        assert!(registry.unsubscribe("global"));
        assert!(!registry.has("global"));
        assert!(registry.flush_on_connect().is_empty());
    }

    #[test]
    fn test_unsubscribe_unknown_topic_sends_nothing() {
        let registry = TopicRegistry::new();
        registry.flush_on_connect();
        assert!(!registry.unsubscribe("match_odds_404"));

        registry.subscribe("global");
        assert!(registry.unsubscribe("global"));
        assert!(!registry.unsubscribe("global"));
    }
}
