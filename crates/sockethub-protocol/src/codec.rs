//! Codec trait and implementations for turning envelopes into frames.
//!
//! A "codec" (coder/decoder) converts between Rust types and the textual
//! frames the transport carries. The session doesn't care HOW envelopes
//! are serialized; it only needs something implementing [`Codec`].
//!
//! Currently we provide [`JsonCodec`], which is what the chat server
//! speaks.

use serde::{Serialize, de::DeserializeOwned};

use crate::{InboundEnvelope, OutboundEnvelope, ProtocolError};

/// A codec that encodes values to text frames and decodes them back.
///
/// `Send + Sync + 'static` so a codec can live inside a session that is
/// moved into a Tokio task.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into a frame.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError>;

    /// Deserializes a frame back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the frame is malformed or
    /// doesn't match the expected type.
    fn decode<T: DeserializeOwned>(
        &self,
        frame: &str,
    ) -> Result<T, ProtocolError>;

    /// Encodes an outbound envelope.
    ///
    /// Deterministic: the same envelope always yields the same frame.
    fn encode_outbound(
        &self,
        envelope: &OutboundEnvelope,
    ) -> Result<String, ProtocolError> {
        self.encode(envelope)
    }

    /// Decodes a frame from the server.
    ///
    /// # Errors
    /// Fails if the frame is not well-formed, lacks a required field, or
    /// has an empty `type`.
    fn decode_inbound(
        &self,
        frame: &str,
    ) -> Result<InboundEnvelope, ProtocolError> {
        let envelope: InboundEnvelope = self.decode(frame)?;
        if envelope.kind.trim().is_empty() {
            return Err(ProtocolError::InvalidMessage(
                "frame has an empty type".into(),
            ));
        }
        Ok(envelope)
    }
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// This is behind the `json` feature flag (enabled by default).
///
/// ## Example
///
/// ```rust
/// use sockethub_protocol::{Codec, JsonCodec, OutboundEnvelope, InboundEnvelope};
///
/// let codec = JsonCodec;
/// let envelope = OutboundEnvelope::message(
///     "lobby".into(),
///     "alice".into(),
///     "hi",
///     chrono::Utc::now(),
/// );
///
/// let frame = codec.encode_outbound(&envelope).unwrap();
/// let decoded = codec.decode_inbound(&frame).unwrap();
/// assert_eq!(decoded, InboundEnvelope::from(&envelope));
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError> {
        serde_json::to_string(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        frame: &str,
    ) -> Result<T, ProtocolError> {
        serde_json::from_str(frame).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::{OutboundKind, RoomId, UserId};

    fn envelope(kind: OutboundKind, content: &str) -> OutboundEnvelope {
        OutboundEnvelope {
            kind,
            content: content.to_string(),
            room_id: RoomId::from("lobby"),
            user_id: UserId::from("alice"),
            timestamp: Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap(),
        }
    }

    #[test]
    fn test_encode_outbound_is_deterministic() {
        let env = envelope(OutboundKind::Message, "hi");

        let a = JsonCodec.encode_outbound(&env).unwrap();
        let b = JsonCodec.encode_outbound(&env).unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn test_decode_of_encoded_envelope_stamped_now_is_equal() {
        let env = OutboundEnvelope::message(
            RoomId::from("lobby"),
            UserId::from("alice"),
            "hi",
            Utc::now(),
        );

        let frame = JsonCodec.encode_outbound(&env).unwrap();
        let decoded: OutboundEnvelope = JsonCodec.decode(&frame).unwrap();

        assert_eq!(decoded, env);
    }

    #[test]
    fn test_decode_of_encoded_nanosecond_timestamp_is_exact() {
        let mut env = envelope(OutboundKind::Message, "hi");
        env.timestamp += chrono::Duration::nanoseconds(495_423_183);

        let frame = JsonCodec.encode_outbound(&env).unwrap();
        let decoded: OutboundEnvelope = JsonCodec.decode(&frame).unwrap();

        assert!(frame.contains("05.495423183Z"));
        assert_eq!(decoded.timestamp, env.timestamp);
    }

    #[test]
    fn test_decode_inbound_of_encoded_outbound_round_trips() {
        for kind in [
            OutboundKind::JoinRoom,
            OutboundKind::LeaveRoom,
            OutboundKind::Message,
        ] {
            let env = envelope(kind, "payload with \"quotes\" and ünïcode");

            let frame = JsonCodec.encode_outbound(&env).unwrap();
            let decoded = JsonCodec.decode_inbound(&frame).unwrap();

            assert_eq!(decoded, InboundEnvelope::from(&env));
        }
    }

    #[test]
    fn test_outbound_decodes_back_to_itself() {
        let env = envelope(OutboundKind::JoinRoom, "Joining room lobby");

        let frame = JsonCodec.encode_outbound(&env).unwrap();
        let decoded: OutboundEnvelope = JsonCodec.decode(&frame).unwrap();

        assert_eq!(decoded, env);
    }

    #[test]
    fn test_decode_inbound_missing_room_id_fails() {
        let frame = r#"{"type":"message","content":"hello","user_id":"bob","timestamp":"2025-01-02T03:04:05Z"}"#;

        let result = JsonCodec.decode_inbound(frame);

        assert!(matches!(result, Err(ProtocolError::Decode(_))));
        assert!(result.unwrap_err().to_string().contains("room_id"));
    }

    #[test]
    fn test_decode_inbound_each_required_field_is_required() {
        let full = serde_json::json!({
            "type": "message",
            "content": "hello",
            "room_id": "lobby",
            "user_id": "bob",
            "timestamp": "2025-01-02T03:04:05Z",
        });

        for field in ["type", "content", "room_id", "user_id", "timestamp"] {
            let mut partial = full.clone();
            partial.as_object_mut().unwrap().remove(field);
            let frame = partial.to_string();

            assert!(
                JsonCodec.decode_inbound(&frame).is_err(),
                "frame without {field} should not decode"
            );
        }
    }

    #[test]
    fn test_decode_inbound_not_json_fails() {
        let result = JsonCodec.decode_inbound("hello there");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_decode_inbound_empty_type_is_invalid() {
        let frame = r#"{"type":" ","content":"x","room_id":"r","user_id":"u","timestamp":"t"}"#;

        let result = JsonCodec.decode_inbound(frame);

        assert!(matches!(result, Err(ProtocolError::InvalidMessage(_))));
    }

    #[test]
    fn test_decode_inbound_ignores_unknown_fields() {
        let frame = r#"{"type":"message","content":"hello","room_id":"lobby","user_id":"bob","timestamp":"now","message_id":"msg-2"}"#;

        let env = JsonCodec.decode_inbound(frame).unwrap();

        assert_eq!(env.content, "hello");
        assert!(env.is_chat_message());
    }
}
