//! Socket.IO v4 framing over the Engine.IO v4 WebSocket transport
//!
//! Only the default namespace (`/`) is spoken. Frames look like:
//!
//! ```text
//! 0{"sid":"..","pingInterval":25000}   engine open
//! 2 / 3                                engine ping / pong
//! 40 / 40{"sid":".."}                  namespace connect / ack
//! 41                                   namespace disconnect (server drop)
//! 42["event",{...}]                    event
//! 4312[...]                            ack with id 12
//! 44{"message":".."}                   connect error
//! ```

use crate::{RealtimeError, Result};
use serde_json::{json, Value};

/// Decoded frame
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    Open(Value),
    Close,
    Ping,
    Pong,
    Connect(Value),
    Disconnect,
    Event { name: String, payload: Value },
    Ack { id: u64, payload: Value },
    ConnectError(Value),
    Noop,
}

/// Frame the client sends to join the default namespace
pub const CONNECT_FRAME: &str = "40";

/// Frame the client sends to leave the default namespace
pub const DISCONNECT_FRAME: &str = "41";

/// Encode an event frame (`42["name",payload]`)
pub fn encode_event(name: &str, payload: &Value) -> String {
    format!("42{}", json!([name, payload]))
}

/// Decode a raw text frame
pub fn decode(frame: &str) -> Result<Packet> {
    let mut chars = frame.chars();
    let engine = chars
        .next()
        .ok_or_else(|| RealtimeError::Protocol("empty frame".into()))?;
    let rest = &frame[engine.len_utf8()..];

    match engine {
        '0' => Ok(Packet::Open(parse_json_or_null(rest)?)),
        '1' => Ok(Packet::Close),
        '2' => Ok(Packet::Ping),
        '3' => Ok(Packet::Pong),
        '4' => decode_socket(rest),
        '6' => Ok(Packet::Noop),
        other => Err(RealtimeError::Protocol(format!(
            "unknown engine packet type '{}'",
            other
        ))),
    }
}

fn decode_socket(body: &str) -> Result<Packet> {
    let mut chars = body.chars();
    let kind = chars
        .next()
        .ok_or_else(|| RealtimeError::Protocol("empty socket packet".into()))?;
    let rest = strip_namespace(&body[kind.len_utf8()..]);

    match kind {
        '0' => Ok(Packet::Connect(parse_json_or_null(rest)?)),
        '1' => Ok(Packet::Disconnect),
        '2' => {
            let (_, json_part) = split_ack_id(rest);
            let args = parse_json_or_null(json_part)?;
            let mut items = match args {
                Value::Array(items) => items.into_iter(),
                other => {
                    return Err(RealtimeError::Protocol(format!(
                        "event body is not an array: {}",
                        other
                    )))
                }
            };
            let name = match items.next() {
                Some(Value::String(name)) => name,
                _ => return Err(RealtimeError::Protocol("event without a name".into())),
            };
            Ok(Packet::Event {
                name,
                payload: items.next().unwrap_or(Value::Null),
            })
        }
        '3' => {
            let (id, json_part) = split_ack_id(rest);
            let id = id.ok_or_else(|| RealtimeError::Protocol("ack without id".into()))?;
            let payload = match parse_json_or_null(json_part)? {
                Value::Array(mut items) if !items.is_empty() => items.swap_remove(0),
                other => other,
            };
            Ok(Packet::Ack { id, payload })
        }
        '4' => Ok(Packet::ConnectError(parse_json_or_null(rest)?)),
        other => Err(RealtimeError::Protocol(format!(
            "unsupported socket packet type '{}'",
            other
        ))),
    }
}

/// Drop a `/nsp,` prefix if present
fn strip_namespace(body: &str) -> &str {
    if body.starts_with('/') {
        match body.find(',') {
            Some(idx) => &body[idx + 1..],
            None => "",
        }
    } else {
        body
    }
}

fn split_ack_id(body: &str) -> (Option<u64>, &str) {
    let digits = body.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return (None, body);
    }
    (body[..digits].parse().ok(), &body[digits..])
}

fn parse_json_or_null(text: &str) -> Result<Value> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(text).map_err(|e| RealtimeError::Protocol(e.to_string()))
}

/// Build the WebSocket transport URL from an HTTP(S) or WS(S) base URL
pub fn socket_url(base: &str) -> String {
    let base = base.trim_end_matches('/');
    let ws_base = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        base.to_string()
    };

    if ws_base.contains("/socket.io") {
        ws_base
    } else {
        format!("{}/socket.io/?EIO=4&transport=websocket", ws_base)
    }
}

/// Build the HTTP long-polling handshake URL used as capability probe
pub fn probe_url(base: &str) -> String {
    let base = base.trim_end_matches('/');
    let http_base = if let Some(rest) = base.strip_prefix("wss://") {
        format!("https://{}", rest)
    } else if let Some(rest) = base.strip_prefix("ws://") {
        format!("http://{}", rest)
    } else {
        base.to_string()
    };
    let root = match http_base.find("/socket.io") {
        Some(idx) => &http_base[..idx],
        None => http_base.as_str(),
    };
    format!("{}/socket.io/?EIO=4&transport=polling", root)
}
