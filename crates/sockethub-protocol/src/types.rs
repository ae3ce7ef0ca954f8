//! Wire envelope types for Socket-Hub.
//!
//! Every frame on the wire is one JSON object with the same five fields:
//!
//! ```text
//! { "type": "...", "content": "...", "room_id": "...", "user_id": "...", "timestamp": "..." }
//! ```
//!
//! The client only ever *sends* three kinds (`join_room`, `leave_room`,
//! `message`), so [`OutboundEnvelope`] uses a closed enum for `type`. The
//! server may send anything it likes (confirmations, broadcasts, errors),
//! so [`InboundEnvelope`] keeps `type` as an open string.

use std::fmt;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// The identifier of a chat user, as used on the wire and in the
/// connection path.
///
/// Newtype over `String` so a `UserId` can't be passed where a [`RoomId`]
/// is expected. `#[serde(transparent)]` keeps it a plain JSON string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// The identifier of a chat room.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for RoomId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// ---------------------------------------------------------------------------
// Timestamps
// ---------------------------------------------------------------------------

/// Formats a timestamp the way it appears on the wire: ISO 8601 in UTC,
/// e.g. `2025-03-01T12:30:05.120Z`.
///
/// Uses as many fractional digits as the value needs (none, 3, 6 or 9),
/// so parsing the result gives back exactly the same instant.
pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Serde adapter for `DateTime<Utc>` fields using [`format_timestamp`].
mod iso8601 {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        at: &DateTime<Utc>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_timestamp(at))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|at| at.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Outbound
// ---------------------------------------------------------------------------

/// The kinds of frame a client sends.
///
/// `rename_all = "snake_case"` gives the wire names `join_room`,
/// `leave_room` and `message`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutboundKind {
    /// Ask the server to add us to a room.
    JoinRoom,
    /// Ask the server to remove us from a room.
    LeaveRoom,
    /// A chat message for everyone in the room.
    Message,
}

impl OutboundKind {
    /// The wire name of this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::JoinRoom => "join_room",
            Self::LeaveRoom => "leave_room",
            Self::Message => "message",
        }
    }
}

impl fmt::Display for OutboundKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A frame built by the client for one user intent.
///
/// Field declaration order is the serialization order, so it stays stable
/// across builds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundEnvelope {
    /// What the frame asks for.
    #[serde(rename = "type")]
    pub kind: OutboundKind,
    /// Human-readable payload.
    pub content: String,
    /// The target room.
    pub room_id: RoomId,
    /// The sender.
    pub user_id: UserId,
    /// When the client built the frame.
    #[serde(with = "iso8601")]
    pub timestamp: DateTime<Utc>,
}

impl OutboundEnvelope {
    // Envelopes built here carry millisecond timestamps, the precision the
    // server and browser clients work with.

    /// A `join_room` request.
    pub fn join(room_id: RoomId, user_id: UserId, at: DateTime<Utc>) -> Self {
        Self {
            kind: OutboundKind::JoinRoom,
            content: format!("Joining room {room_id}"),
            room_id,
            user_id,
            timestamp: at.trunc_subsecs(3),
        }
    }

    /// A `leave_room` request.
    pub fn leave(room_id: RoomId, user_id: UserId, at: DateTime<Utc>) -> Self {
        Self {
            kind: OutboundKind::LeaveRoom,
            content: format!("Leaving room {room_id}"),
            room_id,
            user_id,
            timestamp: at.trunc_subsecs(3),
        }
    }

    /// A chat `message` carrying `text` verbatim.
    pub fn message(
        room_id: RoomId,
        user_id: UserId,
        text: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            kind: OutboundKind::Message,
            content: text.into(),
            room_id,
            user_id,
            timestamp: at.trunc_subsecs(3),
        }
    }
}

// ---------------------------------------------------------------------------
// Inbound
// ---------------------------------------------------------------------------

/// A frame received from the server.
///
/// Same shape as [`OutboundEnvelope`], except that `type` is whatever the
/// server says it is and the timestamp is kept exactly as sent. All five
/// fields are required; a frame missing any of them fails to decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundEnvelope {
    /// Server-defined label, e.g. `message`. Treated as opaque.
    #[serde(rename = "type")]
    pub kind: String,
    /// Human-readable payload.
    pub content: String,
    /// The room the frame belongs to.
    pub room_id: RoomId,
    /// The originating user.
    pub user_id: UserId,
    /// Server-sourced ISO 8601 timestamp, unparsed.
    pub timestamp: String,
    /// Display name of the sender, when the server attaches one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl InboundEnvelope {
    /// Returns `true` for ordinary chat messages (as opposed to
    /// confirmations, broadcasts, or other server-defined kinds).
    pub fn is_chat_message(&self) -> bool {
        self.kind == OutboundKind::Message.as_str()
    }
}

/// The inbound view of an outbound frame: what a peer decodes when it
/// receives exactly what we sent.
impl From<&OutboundEnvelope> for InboundEnvelope {
    fn from(out: &OutboundEnvelope) -> Self {
        Self {
            kind: out.kind.as_str().to_string(),
            content: out.content.clone(),
            room_id: out.room_id.clone(),
            user_id: out.user_id.clone(),
            timestamp: format_timestamp(&out.timestamp),
            username: None,
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Tests for envelope types and their JSON shape.
    //!
    //! The server parses these frames with its own model, so a field name
    //! or a kind spelled differently here means the server rejects us.

    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 30, 5).unwrap()
            + chrono::Duration::milliseconds(120)
    }

    #[test]
    fn test_user_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&UserId::from("alice")).unwrap();
        assert_eq!(json, "\"alice\"");
    }

    #[test]
    fn test_room_id_display() {
        assert_eq!(RoomId::from("lobby").to_string(), "lobby");
    }

    #[test]
    fn test_outbound_kind_wire_names() {
        for (kind, name) in [
            (OutboundKind::JoinRoom, "join_room"),
            (OutboundKind::LeaveRoom, "leave_room"),
            (OutboundKind::Message, "message"),
        ] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{name}\""));
            assert_eq!(kind.as_str(), name);
        }
    }

    #[test]
    fn test_format_timestamp_is_iso8601_millis_utc() {
        assert_eq!(format_timestamp(&at()), "2025-03-01T12:30:05.120Z");
    }

    #[test]
    fn test_outbound_constructors_truncate_to_millis() {
        let precise = at() + chrono::Duration::nanoseconds(456_789);
        let room = RoomId::from("lobby");
        let user = UserId::from("alice");

        for env in [
            OutboundEnvelope::join(room.clone(), user.clone(), precise),
            OutboundEnvelope::leave(room.clone(), user.clone(), precise),
            OutboundEnvelope::message(room.clone(), user.clone(), "hi", precise),
        ] {
            assert_eq!(env.timestamp, at());
            assert_eq!(format_timestamp(&env.timestamp), "2025-03-01T12:30:05.120Z");
        }
    }

    #[test]
    fn test_outbound_envelope_json_shape() {
        let env = OutboundEnvelope::message(
            RoomId::from("lobby"),
            UserId::from("alice"),
            "hi",
            at(),
        );

        let json = serde_json::to_string(&env).unwrap();

        assert_eq!(
            json,
            r#"{"type":"message","content":"hi","room_id":"lobby","user_id":"alice","timestamp":"2025-03-01T12:30:05.120Z"}"#
        );
    }

    #[test]
    fn test_join_and_leave_carry_readable_content() {
        let join =
            OutboundEnvelope::join(RoomId::from("lobby"), UserId::from("a"), at());
        let leave =
            OutboundEnvelope::leave(RoomId::from("lobby"), UserId::from("a"), at());

        assert_eq!(join.kind, OutboundKind::JoinRoom);
        assert_eq!(join.content, "Joining room lobby");
        assert_eq!(leave.kind, OutboundKind::LeaveRoom);
        assert_eq!(leave.content, "Leaving room lobby");
    }

    #[test]
    fn test_inbound_accepts_server_defined_kind_and_username() {
        let json = r#"{"type":"announcement","content":"maintenance at 5","room_id":"lobby","user_id":"system","timestamp":"2025-03-01T12:30:05Z","username":"Ops"}"#;

        let env: InboundEnvelope = serde_json::from_str(json).unwrap();

        assert_eq!(env.kind, "announcement");
        assert!(!env.is_chat_message());
        assert_eq!(env.username.as_deref(), Some("Ops"));
    }

    #[test]
    fn test_inbound_from_outbound_matches_wire_form() {
        let out = OutboundEnvelope::join(
            RoomId::from("lobby"),
            UserId::from("alice"),
            at(),
        );

        let inbound = InboundEnvelope::from(&out);

        assert_eq!(inbound.kind, "join_room");
        assert_eq!(inbound.timestamp, "2025-03-01T12:30:05.120Z");
        assert_eq!(inbound.username, None);
    }
}
