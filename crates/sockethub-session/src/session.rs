//! Session types: configuration, identity, and the states a chat session
//! moves through.

use std::fmt;

use serde::{Deserialize, Serialize};
use sockethub_protocol::{RoomId, UserId};

use crate::SessionError;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for a chat session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Base URL of the chat server's WebSocket endpoint.
    ///
    /// The connection for a user is opened at `{server_url}/{user_id}`.
    /// Default: `ws://localhost:8000/ws`.
    pub server_url: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            server_url: "ws://localhost:8000/ws".to_string(),
        }
    }
}

impl SessionConfig {
    /// Returns the transport address for `user_id`.
    ///
    /// Each user id gets its own path segment, so reconnecting as someone
    /// else opens a logically distinct connection.
    pub fn address_for(&self, user_id: &UserId) -> String {
        format!("{}/{}", self.server_url.trim_end_matches('/'), user_id)
    }
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Who the session speaks for.
///
/// Supplied once, by whatever authenticated the user, and never changed.
/// Talking as somebody else takes a new session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    user_id: UserId,
    display_name: String,
}

impl Identity {
    /// Creates an identity.
    ///
    /// # Errors
    /// Returns [`SessionError::InvalidIdentity`] if `user_id` is blank or
    /// contains `/`, since it becomes a path segment of the connection
    /// address.
    pub fn new(
        user_id: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Result<Self, SessionError> {
        let user_id = user_id.into();
        if user_id.trim().is_empty() {
            return Err(SessionError::InvalidIdentity(
                "user id must not be empty".into(),
            ));
        }
        if user_id.contains('/') {
            return Err(SessionError::InvalidIdentity(format!(
                "user id {user_id:?} must not contain '/'"
            )));
        }
        Ok(Self {
            user_id: UserId(user_id),
            display_name: display_name.into(),
        })
    }

    /// The user id sent on every frame and used in the connection path.
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// The human-readable name.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }
}

// ---------------------------------------------------------------------------
// ConnectionState / RoomMembership
// ---------------------------------------------------------------------------

/// Where the session's connection is in its lifecycle.
///
/// ```text
///   Disconnected ──(connect)──→ Connecting ──(opened)──→ Connected
///        ↑                          │                        │
///        └──────(closed / errored / disconnect)──────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    /// No connection and no attempt in flight.
    Disconnected,
    /// An open attempt is in flight.
    Connecting,
    /// The connection is open.
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Connected => write!(f, "Connected"),
        }
    }
}

/// The room the session is in, if any. At most one at a time.
///
/// Only ever `Joined` while the connection is `Connected`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RoomMembership {
    /// Not in a room.
    #[default]
    None,
    /// In the given room.
    Joined(RoomId),
}

impl RoomMembership {
    /// The joined room, if any.
    pub fn room(&self) -> Option<&RoomId> {
        match self {
            Self::None => None,
            Self::Joined(room) => Some(room),
        }
    }

    /// Returns `true` if in a room.
    pub fn is_joined(&self) -> bool {
        matches!(self, Self::Joined(_))
    }
}
