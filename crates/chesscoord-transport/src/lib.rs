//! Transport abstraction layer.
//!
//! Two layers, outside-in:
//!
//! - [`Endpoint`] — the handle the core actually talks to (§4.1 "Endpoint
//!   abstraction"): `send(route, action, payload, correlationId?)`,
//!   `is_open()`, and a metadata bag holding the endpoint's current game
//!   subscription. This is what `chesscoord-session` depends on.
//! - [`Transport`] / [`Connection`] — the raw byte-level abstraction an
//!   `Endpoint` is built on top of, so swapping WebSocket for another
//!   protocol never touches the core.
//!
//! # Feature Flags
//!
//! - `websocket` (default) — WebSocket transport via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketTransport};

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use chesscoord_protocol::{Codec, Color, JsonCodec, OutboundMessage};
use serde_json::Value;

/// Opaque identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Accepts new incoming connections.
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by this transport.
    type Connection: Connection;
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync;

    /// Waits for and accepts the next incoming connection.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;

    /// Gracefully shuts down the transport, stopping new connections.
    async fn shutdown(&self) -> Result<(), Self::Error>;
}

/// A single connection that can send and receive bytes.
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync;

    /// Sends data to the remote peer.
    async fn send(&self, data: &[u8]) -> Result<(), Self::Error>;

    /// Receives the next message from the remote peer.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Closes the connection.
    async fn close(&self) -> Result<(), Self::Error>;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}

/// What game and seat an endpoint is currently subscribed to, if any
/// (§4.1: "a metadata bag holding its current game subscription").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub game_id: String,
    pub color: Color,
}

/// The handle the core holds for one connected client. Wraps a raw
/// [`Connection`] with the protocol-level `send` the session manager
/// actually calls, plus the subscription metadata bag.
pub struct Endpoint<C: Connection> {
    connection: C,
    codec: JsonCodec,
    subscription: Mutex<Option<Subscription>>,
    open: AtomicBool,
}

impl<C: Connection> Endpoint<C> {
    pub fn new(connection: C) -> Self {
        Self {
            connection,
            codec: JsonCodec,
            subscription: Mutex::new(None),
            open: AtomicBool::new(true),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.connection.id()
    }

    /// The wrapped low-level connection, for transports that need to
    /// reach through the `Endpoint` abstraction (tests, metrics probes).
    pub fn raw_connection(&self) -> &C {
        &self.connection
    }

    /// Sends `{route, action, value, id}` to this endpoint. A send
    /// failure marks the endpoint closed — callers should treat it the
    /// same as an observed disconnect.
    pub async fn send(
        &self,
        route: &'static str,
        action: &'static str,
        payload: Value,
        correlation_id: Option<String>,
    ) -> Result<(), TransportError> {
        let message = OutboundMessage {
            route,
            action,
            value: payload,
            id: correlation_id,
        };
        let bytes = self.codec.encode(&message)?;
        match self.connection.send(&bytes).await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.open.store(false, Ordering::SeqCst);
                Err(TransportError::SendFailed(std::io::Error::other(e)))
            }
        }
    }

    /// Receives the next decoded inbound message, or `None` on clean
    /// close. A receive error marks the endpoint closed.
    pub async fn recv(
        &self,
    ) -> Result<Option<chesscoord_protocol::InboundMessage>, TransportError> {
        match self.connection.recv().await {
            Ok(Some(bytes)) => self.codec.decode(&bytes).map(Some).map_err(Into::into),
            Ok(None) => {
                self.open.store(false, Ordering::SeqCst);
                Ok(None)
            }
            Err(e) => {
                self.open.store(false, Ordering::SeqCst);
                Err(TransportError::ReceiveFailed(std::io::Error::other(e)))
            }
        }
    }

    pub async fn close(&self) -> Result<(), TransportError> {
        self.open.store(false, Ordering::SeqCst);
        self.connection
            .close()
            .await
            .map_err(|e| TransportError::SendFailed(std::io::Error::other(e)))
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    pub fn subscription(&self) -> Option<Subscription> {
        self.subscription.lock().unwrap().clone()
    }

    pub fn set_subscription(&self, subscription: Option<Subscription>) {
        *self.subscription.lock().unwrap() = subscription;
    }
}
