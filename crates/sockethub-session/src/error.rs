//! Error types for the session layer.

use sockethub_protocol::ProtocolError;
use sockethub_transport::TransportError;

/// Errors that can occur while driving a chat session.
///
/// None of these is fatal. The session records each one in its transcript
/// as a `System` entry and stays usable; the user can simply retry.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The transport could not start opening a connection.
    #[error("could not open connection: {0}")]
    TransportOpenFailure(#[source] TransportError),

    /// The operation needs an open connection and there isn't one.
    #[error("you are not connected")]
    NotConnected,

    /// A join, leave, or send that the current room state doesn't allow.
    #[error("{0}")]
    InvalidRoomOperation(String),

    /// An inbound frame could not be decoded and was dropped.
    #[error("dropped malformed frame: {0}")]
    Decode(#[source] ProtocolError),

    /// An outbound envelope could not be encoded.
    #[error("could not encode frame: {0}")]
    Encode(#[source] ProtocolError),

    /// The transport refused a frame for a reason other than being
    /// disconnected.
    #[error("send failed: {0}")]
    Transport(#[source] TransportError),

    /// The identity can't be used for a session.
    #[error("invalid identity: {0}")]
    InvalidIdentity(String),

    /// The authentication collaborator rejected the credentials or token.
    #[error("authentication failed: {0}")]
    AuthFailed(String),
}

impl SessionError {
    /// Maps a failed send. A transport that isn't open is the same
    /// condition as a session that isn't connected.
    pub(crate) fn from_send(err: TransportError) -> Self {
        match err {
            TransportError::NotConnected => Self::NotConnected,
            other => Self::Transport(other),
        }
    }
}
