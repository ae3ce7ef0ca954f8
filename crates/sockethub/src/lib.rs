//! # Socket-Hub
//!
//! Client side of a real-time chat over WebSockets.
//!
//! A session connects one user to a chat server, joins at most one room at
//! a time, sends messages to it, and keeps an ordered transcript of what
//! was sent, what arrived, and what happened along the way. The transcript
//! is what a terminal or UI renders.
//!
//! Each session runs as its own Tokio task. User intents and transport
//! events are queued into one inbox and applied in order, so the state
//! machine never sees two things at once.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sockethub::prelude::*;
//!
//! # async fn run() -> Result<(), SocketHubError> {
//! let session = ChatClientBuilder::new()
//!     .server_url("ws://localhost:8000/ws")
//!     .spawn(Identity::new("alice", "Alice")?)?;
//!
//! session.connect().await?;
//! let mut updates = session.subscribe();
//! while updates.changed().await.is_ok() {
//!     let snapshot = updates.borrow_and_update().clone();
//!     if let Some(entry) = snapshot.transcript.last() {
//!         println!("{}", entry.text);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod actor;
mod client;
mod error;

pub use actor::{spawn_session, SessionHandle};
pub use client::ChatClientBuilder;
pub use error::SocketHubError;

pub use sockethub_protocol as protocol;
pub use sockethub_session as session;
pub use sockethub_transport as transport;

/// Everything needed to run a chat session.
pub mod prelude {
    pub use crate::{spawn_session, ChatClientBuilder, SessionHandle, SocketHubError};
    pub use sockethub_protocol::{RoomId, UserId};
    pub use sockethub_session::{
        ConnectionState, Credentials, EntryId, Identity, IdentityProvider,
        Origin, RoomMembership, SessionConfig, SessionError, SessionSnapshot,
        TranscriptEntry,
    };
    pub use sockethub_transport::WebSocketConfig;
}
