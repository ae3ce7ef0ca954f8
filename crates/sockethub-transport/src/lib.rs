//! Transport abstraction layer for Socket-Hub clients.
//!
//! Provides the [`Transport`] trait: a thin lifecycle wrapper around one
//! bidirectional, message-based connection. A transport can `open`,
//! `send` and `close`; everything that happens asynchronously (the
//! connection opening, closing, failing, or a frame arriving) is reported
//! as a [`TransportEvent`] through an [`EventSink`].
//!
//! The transport never interprets frame contents. That is the codec's job.
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket client transport via `tokio-tungstenite`

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConfig, WebSocketTransport};

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identifier for one connection attempt.
///
/// Every call to [`Transport::open`] gets a fresh id, and every event the
/// attempt produces is tagged with it. This lets the receiver tell events
/// of the current connection apart from late events of an abandoned one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Allocates the next process-wide unique id.
    pub fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
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

/// What happened on a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEventKind {
    /// The connection is open and frames can be sent.
    Opened,
    /// The connection closed (by either side).
    Closed,
    /// The connection failed. Carries a human-readable detail.
    Errored(String),
    /// A textual frame arrived from the peer.
    Received(String),
}

/// A lifecycle event or inbound frame, tagged with its connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportEvent {
    /// The connection attempt that produced this event.
    pub conn: ConnectionId,
    /// What happened.
    pub kind: TransportEventKind,
}

impl TransportEvent {
    /// Creates an event for the given connection.
    pub fn new(conn: ConnectionId, kind: TransportEventKind) -> Self {
        Self { conn, kind }
    }
}

/// Where a transport delivers its events.
///
/// A cloneable callback. Transports call [`emit`](Self::emit) from
/// whatever task observes the event; the receiving side decides how to
/// funnel it (usually into a channel).
#[derive(Clone)]
pub struct EventSink(Arc<dyn Fn(TransportEvent) + Send + Sync>);

impl EventSink {
    /// Wraps a callback.
    pub fn new(f: impl Fn(TransportEvent) + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Forwards events into an unbounded channel. Events are dropped once
    /// the receiver is gone.
    pub fn from_channel(
        tx: tokio::sync::mpsc::UnboundedSender<TransportEvent>,
    ) -> Self {
        Self::new(move |event| {
            let _ = tx.send(event);
        })
    }

    /// Delivers an event.
    pub fn emit(&self, event: TransportEvent) {
        (self.0)(event);
    }
}

impl fmt::Debug for EventSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSink").finish_non_exhaustive()
    }
}

/// A client-side connection that can be opened, written to and closed.
///
/// All methods are non-blocking: `open` only *starts* the attempt and
/// returns its [`ConnectionId`]; the outcome arrives later as an
/// [`Opened`](TransportEventKind::Opened) or
/// [`Errored`](TransportEventKind::Errored) event.
pub trait Transport: Send + 'static {
    /// Starts opening a connection to `address`.
    ///
    /// Any connection the transport still holds is closed first.
    ///
    /// # Errors
    /// Returns an error if the attempt can't even be started (bad
    /// address, no runtime). Failures after that are reported as events.
    fn open(&mut self, address: &str) -> Result<ConnectionId, TransportError>;

    /// Sends one textual frame.
    ///
    /// # Errors
    /// Returns [`TransportError::NotConnected`] if the connection is not
    /// open.
    fn send(&mut self, frame: String) -> Result<(), TransportError>;

    /// Closes the current connection, or abandons the pending attempt.
    ///
    /// Idempotent: closing with nothing open does nothing.
    fn close(&mut self);
}
