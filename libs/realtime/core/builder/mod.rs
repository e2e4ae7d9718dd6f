pub mod states;

use crate::client::RealtimeClient;
use crate::config::ClientConfig;
use crate::protocol;
use crate::traits::*;
use states::*;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

/// Default application heartbeat interval
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(25);

/// Default time allowed for the heartbeat pong
pub const DEFAULT_PONG_TIMEOUT: Duration = Duration::from_secs(5);

/// Default capability probe timeout
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Type-state builder for [`RealtimeClient`]
///
/// The URL and the event handler are required; `build()` only exists once
/// both are set.
pub struct RealtimeClientBuilder<U, H>
where
    U: UrlState,
    H: HandlerState,
{
    _state: TypeState<U, H>,
    url: Option<String>,
    handler: Option<Arc<dyn EventHandler>>,
    probe_url: Option<String>,
    probe_timeout: Duration,
    auth: Option<Arc<dyn AuthProvider>>,
    heartbeat_interval: Option<Duration>,
    pong_timeout: Duration,
    passive_ping: Arc<dyn PassivePingDetector>,
    reconnect_strategy: Option<Box<dyn ReconnectionStrategy>>,
    topics: Vec<String>,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl RealtimeClientBuilder<NoUrl, NoHandler> {
    pub fn new() -> Self {
        Self {
            _state: TypeState::new(),
            url: None,
            handler: None,
            probe_url: None,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            auth: None,
            heartbeat_interval: Some(DEFAULT_HEARTBEAT_INTERVAL),
            pong_timeout: DEFAULT_PONG_TIMEOUT,
            passive_ping: Arc::new(EngineIoPing),
            reconnect_strategy: None,
            topics: Vec::new(),
            shutdown_flag: None,
        }
    }
}

impl Default for RealtimeClientBuilder<NoUrl, NoHandler> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U, H> RealtimeClientBuilder<U, H>
where
    U: UrlState,
    H: HandlerState,
{
    fn transition<U2, H2>(self) -> RealtimeClientBuilder<U2, H2>
    where
        U2: UrlState,
        H2: HandlerState,
    {
        RealtimeClientBuilder {
            _state: TypeState::new(),
            url: self.url,
            handler: self.handler,
            probe_url: self.probe_url,
            probe_timeout: self.probe_timeout,
            auth: self.auth,
            heartbeat_interval: self.heartbeat_interval,
            pong_timeout: self.pong_timeout,
            passive_ping: self.passive_ping,
            reconnect_strategy: self.reconnect_strategy,
            topics: self.topics,
            shutdown_flag: self.shutdown_flag,
        }
    }

    /// Probe the Engine.IO polling handshake before connecting
    ///
    /// Derives the probe URL from the transport URL.
    pub fn with_probe(mut self) -> Self {
        self.probe_url = self.url.as_deref().map(protocol::probe_url);
        self
    }

    /// Probe an explicit URL before connecting
    pub fn probe_url(mut self, url: impl Into<String>) -> Self {
        self.probe_url = Some(url.into());
        self
    }

    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    pub fn auth(mut self, auth: impl AuthProvider + 'static) -> Self {
        self.auth = Some(Arc::new(auth));
        self
    }

    /// Heartbeat interval; `None` disables the application heartbeat
    pub fn heartbeat(mut self, interval: Option<Duration>) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    pub fn pong_timeout(mut self, timeout: Duration) -> Self {
        self.pong_timeout = timeout;
        self
    }

    pub fn passive_ping(mut self, detector: impl PassivePingDetector + 'static) -> Self {
        self.passive_ping = Arc::new(detector);
        self
    }

    pub fn reconnect_strategy(mut self, strategy: impl ReconnectionStrategy + 'static) -> Self {
        self.reconnect_strategy = Some(Box::new(strategy));
        self
    }

    /// Topic subscribed on every connection
    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topics.push(topic.into());
        self
    }

    pub fn topics<I, S>(mut self, topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.topics.extend(topics.into_iter().map(Into::into));
        self
    }

    /// Share a shutdown flag with other components
    ///
    /// Storing `false` stops the client and suppresses reconnection.
    pub fn shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }
}

impl<H> RealtimeClientBuilder<NoUrl, H>
where
    H: HandlerState,
{
    /// Transport URL; HTTP(S) bases are converted to the Socket.IO endpoint
    pub fn url(self, url: impl Into<String>) -> RealtimeClientBuilder<HasUrl, H> {
        let mut next = self.transition::<HasUrl, H>();
        next.url = Some(protocol::socket_url(&url.into()));
        next
    }
}

impl<U> RealtimeClientBuilder<U, NoHandler>
where
    U: UrlState,
{
    pub fn handler(self, handler: impl EventHandler) -> RealtimeClientBuilder<U, HasHandler> {
        let mut next = self.transition::<U, HasHandler>();
        next.handler = Some(Arc::new(handler));
        next
    }
}

// Build method - only available when all required fields are set
impl RealtimeClientBuilder<HasUrl, HasHandler> {
    pub fn build(self) -> Result<RealtimeClient> {
        let url = self
            .url
            .ok_or_else(|| RealtimeError::Configuration("URL must be set".into()))?;
        let handler = self
            .handler
            .ok_or_else(|| RealtimeError::Configuration("handler must be set".into()))?;

        if self.heartbeat_interval == Some(Duration::ZERO) {
            return Err(RealtimeError::Configuration(
                "heartbeat interval must be greater than zero".into(),
            ));
        }

        let shutdown_flag = self
            .shutdown_flag
            .unwrap_or_else(|| Arc::new(AtomicBool::new(true)));

        let reconnect_strategy = self
            .reconnect_strategy
            .unwrap_or_else(|| Box::new(JitteredBackoff::default()));

        let config = ClientConfig {
            url,
            probe_url: self.probe_url,
            probe_timeout: self.probe_timeout,
            handler,
            auth: self.auth,
            heartbeat_interval: self.heartbeat_interval,
            pong_timeout: self.pong_timeout,
            passive_ping: self.passive_ping,
            shutdown_flag,
        };

        Ok(RealtimeClient::start(config, reconnect_strategy, self.topics))
    }
}
