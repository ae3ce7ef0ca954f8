//! Wire protocol for Socket-Hub chat sessions.
//!
//! This crate defines what a client and the chat server say to each other:
//!
//! - **Types** ([`OutboundEnvelope`], [`InboundEnvelope`], [`RoomId`],
//!   [`UserId`]): the frames that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how envelopes become
//!   text frames and back.
//! - **Errors** ([`ProtocolError`]): what can go wrong doing so.
//!
//! # Architecture
//!
//! ```text
//! Transport (text frames) → Protocol (envelopes) → Session (state)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    InboundEnvelope, OutboundEnvelope, OutboundKind, RoomId, UserId,
    format_timestamp,
};
