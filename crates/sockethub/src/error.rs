//! Unified error type for the Socket-Hub client.

use sockethub_protocol::ProtocolError;
use sockethub_session::SessionError;
use sockethub_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant generates a `From` impl, so
/// `?` converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum SocketHubError {
    /// A transport-level error (open, send).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (state machine, identity, auth).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The session task has stopped; the handle is no longer usable.
    #[error("session has shut down")]
    SessionClosed,

    /// A session was started outside a Tokio runtime.
    #[error("no Tokio runtime available: {0}")]
    NoRuntime(String),
}
