//! Common test utilities for realtime integration tests
//!
//! Provides a minimal Socket.IO v4 server speaking the websocket transport.

#![allow(dead_code)]

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, Notify};
use tokio_tungstenite::tungstenite::Message;

/// Macro for verbose test output (controlled by TEST_VERBOSE env var)
#[macro_export]
macro_rules! verbose_println {
    ($($arg:tt)*) => {
        if std::env::var("TEST_VERBOSE").is_ok() {
            println!($($arg)*);
        }
    };
}

/// Commands pushed from the test to every live socket
#[derive(Debug, Clone)]
enum ServerCommand {
    Send(String),
    Drop,
}

/// Behavior knobs for the mock server
#[derive(Debug, Clone, Copy)]
pub struct ServerOptions {
    /// Reply to `ping` events with `pong`
    pub answer_pings: bool,
    /// Refuse the namespace connect with a `44` frame
    pub refuse_connect: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            answer_pings: true,
            refuse_connect: false,
        }
    }
}

/// A mock Socket.IO server for testing
pub struct MockSocketIoServer {
    pub addr: SocketAddr,
    shutdown: Arc<Notify>,
    commands: broadcast::Sender<ServerCommand>,
    received: Arc<Mutex<Vec<String>>>,
    connections: Arc<AtomicUsize>,
    answer_pings: Arc<AtomicBool>,
}

impl MockSocketIoServer {
    pub async fn start() -> Self {
        Self::start_with(ServerOptions::default()).await
    }

    /// Create and start a new mock server
    pub async fn start_with(options: ServerOptions) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Arc::new(Notify::new());
        let (commands, _) = broadcast::channel(64);
        let received = Arc::new(Mutex::new(Vec::new()));
        let connections = Arc::new(AtomicUsize::new(0));
        let answer_pings = Arc::new(AtomicBool::new(options.answer_pings));

        let server = Self {
            addr,
            shutdown: shutdown.clone(),
            commands: commands.clone(),
            received: received.clone(),
            connections: connections.clone(),
            answer_pings: answer_pings.clone(),
        };

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    result = listener.accept() => {
                        match result {
                            Ok((stream, _)) => {
                                let ctx = ConnectionContext {
                                    shutdown: shutdown.clone(),
                                    commands: commands.subscribe(),
                                    received: received.clone(),
                                    connections: connections.clone(),
                                    answer_pings: answer_pings.clone(),
                                    refuse_connect: options.refuse_connect,
                                };
                                tokio::spawn(handle_connection(stream, ctx));
                            }
                            Err(e) => {
                                eprintln!("Accept error: {}", e);
                                break;
                            }
                        }
                    }
                    _ = shutdown.notified() => break,
                }
            }
        });

        server
    }

    /// Base URL handed to the client builder
    pub fn ws_url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    pub fn http_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Push a server event to every connected client
    pub fn emit(&self, name: &str, payload: serde_json::Value) {
        let frame = format!("42{}", serde_json::json!([name, payload]));
        let _ = self.commands.send(ServerCommand::Send(frame));
    }

    /// Push a raw frame to every connected client
    pub fn send_raw(&self, frame: &str) {
        let _ = self.commands.send(ServerCommand::Send(frame.to_string()));
    }

    /// Drop every live socket without a close handshake
    pub fn drop_connections(&self) {
        let _ = self.commands.send(ServerCommand::Drop);
    }

    pub fn set_answer_pings(&self, answer: bool) {
        self.answer_pings.store(answer, Ordering::SeqCst);
    }

    /// Number of namespace connects accepted so far
    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// All text frames received, in order
    pub fn received(&self) -> Vec<String> {
        self.received.lock().clone()
    }

    /// Received `42` events with the given name
    pub fn received_events(&self, name: &str) -> Vec<serde_json::Value> {
        self.received()
            .iter()
            .filter_map(|frame| frame.strip_prefix("42"))
            .filter_map(|body| serde_json::from_str::<serde_json::Value>(body).ok())
            .filter(|array| array.get(0).and_then(|v| v.as_str()) == Some(name))
            .map(|array| array.get(1).cloned().unwrap_or(serde_json::Value::Null))
            .collect()
    }

    /// Wait until `predicate` holds or the timeout elapses
    pub async fn wait_for<F>(&self, timeout: Duration, predicate: F) -> bool
    where
        F: Fn(&Self) -> bool,
    {
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            if predicate(self) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        predicate(self)
    }

    pub fn shutdown(&self) {
        self.shutdown.notify_waiters();
    }
}

impl Drop for MockSocketIoServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

struct ConnectionContext {
    shutdown: Arc<Notify>,
    commands: broadcast::Receiver<ServerCommand>,
    received: Arc<Mutex<Vec<String>>>,
    connections: Arc<AtomicUsize>,
    answer_pings: Arc<AtomicBool>,
    refuse_connect: bool,
}

async fn handle_connection(stream: tokio::net::TcpStream, mut ctx: ConnectionContext) {
    let ws_stream = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            eprintln!("WebSocket handshake failed: {}", e);
            return;
        }
    };

    let (mut write, mut read) = ws_stream.split();

    let open = r#"0{"sid":"mock","upgrades":[],"pingInterval":25000,"pingTimeout":20000,"maxPayload":1000000}"#;
    if write.send(Message::Text(open.to_string())).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            msg = read.next() => {
                let text = match msg {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Ping(data))) => {
                        let _ = write.send(Message::Pong(data)).await;
                        continue;
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => continue,
                };
                ctx.received.lock().push(text.clone());

                let reply = if text == "40" || text.starts_with("40{") {
                    if ctx.refuse_connect {
                        Some(r#"44{"message":"not authorized"}"#.to_string())
                    } else {
                        ctx.connections.fetch_add(1, Ordering::SeqCst);
                        Some(r#"40{"sid":"mock-ns"}"#.to_string())
                    }
                } else if text.starts_with(r#"42["ping""#) {
                    if ctx.answer_pings.load(Ordering::SeqCst) {
                        let body: serde_json::Value =
                            serde_json::from_str(&text[2..]).unwrap_or(serde_json::Value::Null);
                        let payload = body.get(1).cloned().unwrap_or(serde_json::Value::Null);
                        Some(format!("42{}", serde_json::json!(["pong", payload])))
                    } else {
                        None
                    }
                } else if text == "41" {
                    break;
                } else {
                    None
                };

                if let Some(reply) = reply {
                    if write.send(Message::Text(reply)).await.is_err() {
                        break;
                    }
                }
            }
            cmd = ctx.commands.recv() => {
                match cmd {
                    Ok(ServerCommand::Send(frame)) => {
                        if write.send(Message::Text(frame)).await.is_err() {
                            break;
                        }
                    }
                    Ok(ServerCommand::Drop) => break,
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            _ = ctx.shutdown.notified() => break,
        }
    }
}

/// Test fixture for connection states
pub mod fixtures {
    use realtime::connection_state::{AtomicConnectionState, ConnectionState};

    pub fn disconnected_state() -> AtomicConnectionState {
        AtomicConnectionState::new(ConnectionState::Disconnected)
    }

    pub fn connected_state() -> AtomicConnectionState {
        AtomicConnectionState::new(ConnectionState::Connected)
    }
}
