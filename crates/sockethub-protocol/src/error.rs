//! Error types for the protocol layer.
//!
//! When you see a `ProtocolError`, the problem is in turning envelopes
//! into frames or back, not in the network or the session.

/// Errors that can occur while encoding or decoding frames.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning an envelope into a frame).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning a frame into an envelope).
    ///
    /// Common causes: the frame isn't JSON at all, a required field
    /// (`type`, `content`, `room_id`, `user_id`, `timestamp`) is missing,
    /// or a field has the wrong JSON type.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The frame parsed but violates protocol rules.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
