use crate::config::ClientConfig;
use crate::connection_state::{AtomicConnectionState, AtomicMetrics, ConnectionState};
use crate::heartbeat::Heartbeat;
use crate::machine::{ConnectionMachine, CLIENT_DISCONNECT, PING_TIMEOUT, SERVER_DISCONNECT, TRANSPORT_CLOSE};
use crate::pong_tracker::PongTracker;
use crate::probe::probe;
use crate::protocol::{self, Packet};
use crate::topics::TopicRegistry;
use crate::traits::*;
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

/// How long the Engine.IO open + namespace connect handshake may take
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Granularity of shutdown-flag checks while idle
const SHUTDOWN_CHECK_INTERVAL: Duration = Duration::from_millis(100);

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;
type WsSink = futures::stream::SplitSink<WsStream, Message>;
type WsSource = futures::stream::SplitStream<WsStream>;

/// Internal command messages for client control
#[derive(Debug)]
enum ClientCommand {
    /// Emit an event on the live socket
    Emit { event: String, payload: Value },
    /// Leave the namespace and stop without reconnecting
    Disconnect,
}

/// How a single connection attempt ended
#[derive(Debug)]
enum ConnectionOutcome {
    /// Never reached the namespace connect acknowledgment
    ConnectFailed(String),
    /// Established connection dropped for `reason`
    Closed(String),
    /// Client asked to leave
    ClientClosed,
    /// Shutdown flag or dropped handle
    Shutdown,
}

/// Client metrics snapshot
#[derive(Debug, Clone)]
pub struct Metrics {
    pub messages_sent: u64,
    pub messages_received: u64,
    pub reconnect_count: u64,
    pub connection_state: ConnectionState,
}

/// Socket.IO push client
///
/// Owns exactly one live connection, survives interruptions through the
/// connection state machine and hands every server event to the configured
/// [`EventHandler`]. All methods are non-blocking; transport failures never
/// surface to the caller.
pub struct RealtimeClient {
    config: Arc<ClientConfig>,
    state: Arc<AtomicConnectionState>,
    metrics: Arc<AtomicMetrics>,
    topics: Arc<TopicRegistry>,
    command_tx: mpsc::UnboundedSender<ClientCommand>,
    task_handle: Option<tokio::task::JoinHandle<()>>,
    disabled: Arc<AtomicBool>,
}

impl RealtimeClient {
    /// Spawn the client task; called by the builder
    pub(crate) fn start(
        config: ClientConfig,
        strategy: Box<dyn ReconnectionStrategy>,
        initial_topics: Vec<String>,
    ) -> Self {
        let config = Arc::new(config);
        let state = Arc::new(AtomicConnectionState::new(ConnectionState::Disconnected));
        let metrics = Arc::new(AtomicMetrics::new());
        let topics = Arc::new(TopicRegistry::new());
        let disabled = Arc::new(AtomicBool::new(false));

        for topic in &initial_topics {
            topics.subscribe(topic);
        }

        let (command_tx, command_rx) = mpsc::unbounded_channel();

        let task_handle = {
            let task = ClientTask {
                config: Arc::clone(&config),
                machine: ConnectionMachine::new(strategy),
                state: Arc::clone(&state),
                metrics: Arc::clone(&metrics),
                topics: Arc::clone(&topics),
                disabled: Arc::clone(&disabled),
                command_rx,
            };
            tokio::spawn(task.run())
        };

        Self {
            config,
            state,
            metrics,
            topics,
            command_tx,
            task_handle: Some(task_handle),
            disabled,
        }
    }

    /// Emit an event on the live socket
    ///
    /// Events emitted while no connection is up are dropped.
    pub fn emit(&self, event: impl Into<String>, payload: Value) -> Result<()> {
        self.command_tx
            .send(ClientCommand::Emit {
                event: event.into(),
                payload,
            })
            .map_err(|e| RealtimeError::ChannelSend(e.to_string()))
    }

    /// Subscribe to a topic; idempotent and safe before connecting
    pub fn subscribe_topic(&self, topic: &str) {
        if self.topics.subscribe(topic) {
            debug!("Subscribing to topic {}", topic);
            let _ = self.emit("subscribe", json!({ "topic": topic }));
        }
    }

    /// Unsubscribe from a topic
    pub fn unsubscribe_topic(&self, topic: &str) {
        if self.topics.unsubscribe(topic) {
            debug!("Unsubscribing from topic {}", topic);
            let _ = self.emit("unsubscribe", json!({ "topic": topic }));
        }
    }

    /// True if the topic is pending or subscribed
    ///
    /// Consumers use this to decide whether to fall back to polling.
    pub fn has_topic(&self, topic: &str) -> bool {
        self.topics.has(topic)
    }

    #[inline]
    pub fn connection_state(&self) -> ConnectionState {
        self.state.get()
    }

    #[inline]
    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    /// False once the capability probe failed for this session
    pub fn is_enabled(&self) -> bool {
        !self.disabled.load(Ordering::Acquire)
    }

    pub fn url(&self) -> &str {
        self.config.url()
    }

    pub fn metrics(&self) -> Metrics {
        Metrics {
            messages_sent: self.metrics.messages_sent(),
            messages_received: self.metrics.messages_received(),
            reconnect_count: self.metrics.reconnect_count(),
            connection_state: self.state.get(),
        }
    }

    /// Leave the namespace; the client will not reconnect
    pub fn disconnect(&self) {
        let _ = self.command_tx.send(ClientCommand::Disconnect);
    }

    /// Get a reference to the shutdown flag
    pub fn shutdown_flag(&self) -> &Arc<AtomicBool> {
        &self.config.shutdown_flag
    }

    /// Shutdown the client and wait for its task
    pub async fn shutdown(mut self) -> Result<()> {
        info!("Shutting down realtime client");
        self.config.shutdown_flag.store(false, Ordering::Release);
        let _ = self.command_tx.send(ClientCommand::Disconnect);

        if let Some(handle) = self.task_handle.take() {
            let _ = handle.await;
        }
        self.state.set(ConnectionState::ShuttingDown);
        Ok(())
    }
}

/// State owned by the spawned task
struct ClientTask {
    config: Arc<ClientConfig>,
    machine: ConnectionMachine,
    state: Arc<AtomicConnectionState>,
    metrics: Arc<AtomicMetrics>,
    topics: Arc<TopicRegistry>,
    disabled: Arc<AtomicBool>,
    command_rx: mpsc::UnboundedReceiver<ClientCommand>,
}

impl ClientTask {
    fn running(&self) -> bool {
        self.config.shutdown_flag.load(Ordering::Acquire)
    }

    fn notify(&self, event: &LifecycleEvent) {
        debug!("Lifecycle: {}", event.name());
        self.config.handler.on_lifecycle(event);
    }

    async fn run(mut self) {
        if let Some(url) = self.config.probe_url.clone() {
            let client = reqwest::Client::new();
            if let Err(e) = probe(&client, &url, self.config.probe_timeout).await {
                warn!("Realtime layer disabled for this session: {}", e);
                self.disabled.store(true, Ordering::Release);
                self.notify(&LifecycleEvent::Unavailable {
                    reason: e.to_string(),
                });
                return;
            }
        }

        loop {
            if !self.running() {
                debug!("Shutdown flag is false, exiting main loop");
                break;
            }

            if !self.machine.begin_connect() {
                debug!("Connection machine refused to connect, exiting main loop");
                break;
            }
            self.state.set(ConnectionState::Connecting);
            if self.drain_stale_commands() {
                info!("Disconnect requested before connecting");
                self.machine.on_disconnected(CLIENT_DISCONNECT);
                self.state.set(self.machine.state());
                break;
            }

            let outcome = self.connect_once().await;
            debug!("Connection outcome: {:?}", outcome);

            let events = match &outcome {
                ConnectionOutcome::ConnectFailed(error) => {
                    error!("Failed to connect: {}", error);
                    self.machine.on_connect_error(error)
                }
                ConnectionOutcome::Closed(reason) => self.machine.on_disconnected(reason),
                ConnectionOutcome::ClientClosed => self.machine.on_disconnected(CLIENT_DISCONNECT),
                ConnectionOutcome::Shutdown => {
                    self.machine.on_shutdown();
                    Vec::new()
                }
            };
            self.state.set(self.machine.state());

            let mut delay = None;
            for event in &events {
                self.notify(event);
                if let LifecycleEvent::ReconnectScheduled { delay: d, .. } = event {
                    delay = Some(*d);
                }
            }

            match (outcome, delay) {
                (ConnectionOutcome::Shutdown, _) | (ConnectionOutcome::ClientClosed, _) => break,
                (_, Some(delay)) => {
                    if !self.wait_for_reconnect(delay).await {
                        break;
                    }
                    self.metrics.increment_reconnects();
                }
                (_, None) => break,
            }
        }

        if self.machine.state() == ConnectionState::ShuttingDown {
            self.state.set(ConnectionState::ShuttingDown);
        }
        info!("Realtime client task exiting");
    }

    /// Drop emits queued while no socket was up; true if a disconnect was queued
    fn drain_stale_commands(&mut self) -> bool {
        let mut closed = false;
        while let Ok(command) = self.command_rx.try_recv() {
            match command {
                ClientCommand::Emit { event, .. } => {
                    debug!("Dropping '{}' emitted while disconnected", event);
                }
                ClientCommand::Disconnect => closed = true,
            }
        }
        closed
    }

    /// Sleep for a reconnect delay, waking early on shutdown or disconnect
    async fn wait_for_reconnect(&mut self, delay: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + delay;
        loop {
            if !self.running() {
                debug!("Shutdown flag set during reconnection delay");
                return false;
            }
            let now = tokio::time::Instant::now();
            if now >= deadline {
                return true;
            }
            let step = std::cmp::min(SHUTDOWN_CHECK_INTERVAL, deadline - now);
            tokio::select! {
                _ = tokio::time::sleep(step) => {}
                cmd = self.command_rx.recv() => match cmd {
                    Some(ClientCommand::Disconnect) | None => return false,
                    Some(ClientCommand::Emit { event, .. }) => {
                        debug!("Dropping '{}' emitted during reconnect delay", event);
                    }
                },
            }
        }
    }

    async fn connect_once(&mut self) -> ConnectionOutcome {
        info!("Connecting to {}", self.config.url);
        let ws_stream = match connect_async(self.config.url.as_str()).await {
            Ok((ws_stream, _)) => ws_stream,
            Err(e) => return ConnectionOutcome::ConnectFailed(e.to_string()),
        };
        let (mut write, mut read) = ws_stream.split();

        match tokio::time::timeout(HANDSHAKE_TIMEOUT, self.handshake(&mut write, &mut read)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return ConnectionOutcome::ConnectFailed(e.to_string()),
            Err(_) => return ConnectionOutcome::ConnectFailed("handshake timed out".into()),
        }

        info!("Connected to {}", self.config.url);
        let events = self.machine.on_connected();
        self.state.set(ConnectionState::Connected);

        let outcome = match self.on_open(&mut write).await {
            Ok(()) => {
                for event in &events {
                    self.notify(event);
                }
                self.message_loop(&mut write, &mut read).await
            }
            Err(e) => ConnectionOutcome::Closed(e.to_string()),
        };

        self.topics.on_disconnect();
        if matches!(outcome, ConnectionOutcome::ClientClosed | ConnectionOutcome::Shutdown) {
            let _ = write.send(Message::Text(protocol::DISCONNECT_FRAME.to_string())).await;
            let _ = write.close().await;
        }
        outcome
    }

    /// Wait for the engine open frame, join the namespace, wait for the ack
    async fn handshake(&self, write: &mut WsSink, read: &mut WsSource) -> Result<()> {
        let mut opened = false;
        while let Some(message) = read.next().await {
            let message = message.map_err(|e| RealtimeError::WebSocket(e.to_string()))?;
            let text = match message {
                Message::Text(text) => text,
                Message::Close(_) => break,
                _ => continue,
            };
            self.metrics.increment_received();

            if self.config.passive_ping.is_ping(&text) {
                self.send_frame(write, self.config.passive_ping.pong_response()).await?;
                continue;
            }

            match protocol::decode(&text)? {
                Packet::Open(open) => {
                    debug!("Engine open: {}", open);
                    opened = true;
                    self.send_frame(write, protocol::CONNECT_FRAME.to_string()).await?;
                }
                Packet::Connect(ack) if opened => {
                    debug!("Namespace connect acknowledged: {}", ack);
                    return Ok(());
                }
                Packet::ConnectError(reason) => {
                    return Err(RealtimeError::ConnectRefused(reason.to_string()));
                }
                other => debug!("Ignoring frame during handshake: {:?}", other),
            }
        }
        Err(RealtimeError::ConnectionClosed("closed during handshake".into()))
    }

    /// Authenticate and flush pending topics on a fresh connection
    async fn on_open(&self, write: &mut WsSink) -> Result<()> {
        if let Some(auth) = &self.config.auth {
            if let Some((event, payload)) = auth.auth_event().await? {
                self.send_frame(write, protocol::encode_event(&event, &payload)).await?;
                debug!("Sent authentication event '{}'", event);
            }
        }

        for topic in self.topics.flush_on_connect() {
            self.send_frame(write, protocol::encode_event("subscribe", &json!({ "topic": topic })))
                .await?;
            debug!("Subscribed to topic {}", topic);
        }
        Ok(())
    }

    async fn message_loop(&mut self, write: &mut WsSink, read: &mut WsSource) -> ConnectionOutcome {
        let mut tracker = PongTracker::new(self.config.pong_timeout);
        let (heartbeat, mut heartbeat_rx) = match self.config.heartbeat_interval {
            Some(interval) => {
                let (heartbeat, rx) = Heartbeat::spawn(interval);
                (Some(heartbeat), Some(rx))
            }
            None => (None, None),
        };
        let mut shutdown_check = tokio::time::interval(SHUTDOWN_CHECK_INTERVAL);

        let outcome = loop {
            let pong_deadline = tracker.deadline();

            tokio::select! {
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            self.metrics.increment_received();
                            if let Some(outcome) = self.on_frame(write, &text, &mut tracker).await {
                                break outcome;
                            }
                        }
                        Some(Ok(Message::Close(frame))) => {
                            debug!("Close frame received: {:?}", frame);
                            break ConnectionOutcome::Closed(TRANSPORT_CLOSE.into());
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            error!("WebSocket error: {}", e);
                            break ConnectionOutcome::Closed(format!("transport error: {}", e));
                        }
                        None => {
                            warn!("WebSocket stream closed");
                            break ConnectionOutcome::Closed(TRANSPORT_CLOSE.into());
                        }
                    }
                }

                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(ClientCommand::Emit { event, payload }) => {
                            if let Err(e) = self.send_frame(write, protocol::encode_event(&event, &payload)).await {
                                break ConnectionOutcome::Closed(e.to_string());
                            }
                        }
                        Some(ClientCommand::Disconnect) => {
                            info!("Received disconnect command");
                            break ConnectionOutcome::ClientClosed;
                        }
                        None => {
                            debug!("Command channel closed");
                            break ConnectionOutcome::Shutdown;
                        }
                    }
                }

                tick = async {
                    match heartbeat_rx.as_mut() {
                        Some(rx) => rx.recv().await,
                        None => std::future::pending().await,
                    }
                } => {
                    if let Some(timestamp) = tick {
                        let frame = protocol::encode_event("ping", &json!({ "timestamp": timestamp }));
                        if let Err(e) = self.send_frame(write, frame).await {
                            break ConnectionOutcome::Closed(e.to_string());
                        }
                        tracker.record_ping_sent();
                    }
                }

                _ = async {
                    match pong_deadline {
                        Some(deadline) => tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await,
                        None => std::future::pending().await,
                    }
                } => {
                    warn!("No pong within {:?}, forcing disconnect", tracker.timeout());
                    break ConnectionOutcome::Closed(PING_TIMEOUT.into());
                }

                _ = shutdown_check.tick() => {
                    if !self.running() {
                        debug!("Shutdown flag detected in message loop, closing connection");
                        break ConnectionOutcome::Shutdown;
                    }
                }
            }
        };

        if let Some(heartbeat) = heartbeat {
            heartbeat.stop();
        }
        outcome
    }

    /// Handle one text frame; `Some` ends the connection
    async fn on_frame(
        &self,
        write: &mut WsSink,
        text: &str,
        tracker: &mut PongTracker,
    ) -> Option<ConnectionOutcome> {
        if self.config.passive_ping.is_ping(text) {
            debug!("Passive ping detected from server");
            if let Err(e) = self.send_frame(write, self.config.passive_ping.pong_response()).await {
                return Some(ConnectionOutcome::Closed(e.to_string()));
            }
            return None;
        }

        let packet = match protocol::decode(text) {
            Ok(packet) => packet,
            Err(e) => {
                warn!("Dropping malformed frame: {}", e);
                return None;
            }
        };

        match packet {
            Packet::Event { name, payload } => {
                if name == "pong" {
                    tracker.record_pong_received();
                    if let Some(rtt) = tracker.last_round_trip() {
                        debug!("Heartbeat round trip {:?}", rtt);
                    }
                    return None;
                }
                if let Err(e) = self.config.handler.on_event(&name, payload) {
                    error!("Handler error for event '{}': {}", name, e);
                }
                None
            }
            Packet::Disconnect => {
                info!("Server closed the namespace");
                Some(ConnectionOutcome::Closed(SERVER_DISCONNECT.into()))
            }
            Packet::Close => Some(ConnectionOutcome::Closed(TRANSPORT_CLOSE.into())),
            Packet::ConnectError(reason) => {
                warn!("Connect error on live socket: {}", reason);
                Some(ConnectionOutcome::Closed(format!("connect error: {}", reason)))
            }
            other => {
                debug!("Ignoring frame: {:?}", other);
                None
            }
        }
    }

    async fn send_frame(&self, write: &mut WsSink, frame: String) -> Result<()> {
        write
            .send(Message::Text(frame))
            .await
            .map_err(|e| RealtimeError::WebSocket(e.to_string()))?;
        self.metrics.increment_sent();
        Ok(())
    }
}
