//! Client-side chat session management for Socket-Hub.
//!
//! This crate holds the state machine at the heart of a chat client:
//!
//! 1. **Identity**: who the session speaks for ([`Identity`], resolved
//!    through the [`IdentityProvider`] seam)
//! 2. **Connection lifecycle**: `Disconnected → Connecting → Connected`
//!    ([`ConnectionState`])
//! 3. **Room membership**: at most one room at a time ([`RoomMembership`])
//! 4. **Transcript**: the ordered log the user reads ([`Transcript`])
//!
//! [`ChatSession`] ties them together and enforces which operations are
//! legal in which state.
//!
//! # How it fits in the stack
//!
//! ```text
//! Facade (above)   ← runs a ChatSession as a task, feeds it intents and events
//!     ↕
//! Session (this crate)  ← validates intents, tracks state, builds envelopes
//!     ↕
//! Protocol + Transport (below)  ← frames on the wire
//! ```

mod auth;
mod controller;
mod error;
mod session;
mod transcript;

pub use auth::{Credentials, IdentityProvider};
pub use controller::{ChatSession, SessionSnapshot};
pub use error::SessionError;
pub use session::{ConnectionState, Identity, RoomMembership, SessionConfig};
pub use transcript::{EntryId, Origin, Transcript, TranscriptEntry};
