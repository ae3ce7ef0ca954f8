//! The chat session controller: one logical connection to the chat server.
//!
//! [`ChatSession`] owns the connection state, the current room, and the
//! transcript. User intents (`connect`, `join_room`, `send_message`, ...)
//! and transport events (`opened`, `closed`, `errored`, `received`) both
//! arrive here, and every one of them is checked against the *current*
//! state before it changes anything. Transport events arrive whenever the
//! network gets around to it, so an event may describe a connection the
//! user already abandoned; those are dropped.
//!
//! The controller is synchronous and does no I/O of its own. It tells the
//! [`Transport`] what to do and learns what happened through
//! [`handle_event`](ChatSession::handle_event). Driving it from a task is
//! the facade crate's job.
//!
//! # Errors
//!
//! Every failed operation is recorded in the transcript as a `System`
//! entry *and* returned to the caller. Nothing here is fatal: the session
//! stays usable and the user may retry.

use chrono::Utc;
use sockethub_protocol::{Codec, JsonCodec, OutboundEnvelope, RoomId};
use sockethub_transport::{
    ConnectionId, Transport, TransportEvent, TransportEventKind,
};

use crate::{
    ConnectionState, EntryId, Identity, Origin, RoomMembership, SessionConfig,
    SessionError, Transcript, TranscriptEntry,
};

/// The connection, as far as the session knows. Membership lives inside
/// `Up`, so a room can't outlive the connection it was joined on.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Link {
    Down,
    Opening {
        conn: ConnectionId,
        address: String,
    },
    Up {
        conn: ConnectionId,
        address: String,
        membership: RoomMembership,
    },
}

impl Link {
    fn conn(&self) -> Option<ConnectionId> {
        match self {
            Self::Down => None,
            Self::Opening { conn, .. } | Self::Up { conn, .. } => Some(*conn),
        }
    }
}

/// A point-in-time copy of everything a presentation surface renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Who the session speaks for.
    pub identity: Identity,
    /// Connection lifecycle state.
    pub connection: ConnectionState,
    /// Current room, if any.
    pub membership: RoomMembership,
    /// The full transcript, oldest first.
    pub transcript: Vec<TranscriptEntry>,
}

impl SessionSnapshot {
    /// Transcript entries appended after `id`. All of them when `id` is
    /// `None`.
    pub fn entries_since(&self, id: Option<EntryId>) -> &[TranscriptEntry] {
        let Some(id) = id else {
            return &self.transcript;
        };
        let start = self.transcript.partition_point(|entry| entry.id <= id);
        &self.transcript[start..]
    }
}

/// A client-side chat session.
///
/// ## Lifecycle
///
/// ```text
/// connect() ──→ Connecting ──(opened)──→ Connected ──→ join_room() ──→ Joined
///                  │                        │                           │
///                  └──(errored)──┐          └──(closed/errored)──┐      │
///                                ▼                               ▼      │
///                           Disconnected ◀──────(disconnect)────────────┘
/// ```
///
/// Room membership is optimistic: `join_room` and `leave_room` take effect
/// as soon as the request is on the wire, without waiting for the server.
pub struct ChatSession<T: Transport, C: Codec = JsonCodec> {
    identity: Identity,
    config: SessionConfig,
    transport: T,
    codec: C,
    link: Link,
    transcript: Transcript,
}

impl<T: Transport> ChatSession<T, JsonCodec> {
    /// Creates a disconnected session speaking JSON.
    pub fn new(identity: Identity, config: SessionConfig, transport: T) -> Self {
        Self::with_codec(identity, config, transport, JsonCodec)
    }
}

impl<T: Transport, C: Codec> ChatSession<T, C> {
    /// Creates a disconnected session with a custom codec.
    pub fn with_codec(
        identity: Identity,
        config: SessionConfig,
        transport: T,
        codec: C,
    ) -> Self {
        Self {
            identity,
            config,
            transport,
            codec,
            link: Link::Down,
            transcript: Transcript::new(),
        }
    }

    // =====================================================================
    // Accessors
    // =====================================================================

    /// Who the session speaks for.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// The connection lifecycle state.
    pub fn connection_state(&self) -> ConnectionState {
        match self.link {
            Link::Down => ConnectionState::Disconnected,
            Link::Opening { .. } => ConnectionState::Connecting,
            Link::Up { .. } => ConnectionState::Connected,
        }
    }

    /// The current room membership.
    pub fn membership(&self) -> RoomMembership {
        self.current_room()
            .map_or(RoomMembership::None, |room| {
                RoomMembership::Joined(room.clone())
            })
    }

    /// The joined room, if any.
    pub fn current_room(&self) -> Option<&RoomId> {
        match &self.link {
            Link::Up { membership, .. } => membership.room(),
            _ => None,
        }
    }

    /// The connection attempt the session is tracking, if any.
    pub fn connection(&self) -> Option<ConnectionId> {
        self.link.conn()
    }

    /// The transcript.
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Copies out everything needed to render the session.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            identity: self.identity.clone(),
            connection: self.connection_state(),
            membership: self.membership(),
            transcript: self.transcript.entries().to_vec(),
        }
    }

    /// Brings a snapshot taken from this session up to date.
    ///
    /// Only entries appended since the snapshot's last entry are copied,
    /// so refreshing after every event costs what the event added, not the
    /// length of the transcript. Returns `true` if anything changed.
    pub fn refresh_snapshot(&self, snapshot: &mut SessionSnapshot) -> bool {
        let fresh = self
            .transcript
            .since(snapshot.transcript.last().map(|entry| entry.id));
        let connection = self.connection_state();
        let membership = self.membership();

        let changed = !fresh.is_empty()
            || snapshot.connection != connection
            || snapshot.membership != membership;
        snapshot.transcript.extend_from_slice(fresh);
        snapshot.connection = connection;
        snapshot.membership = membership;
        changed
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The underlying transport, mutably.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    // =====================================================================
    // Intents
    // =====================================================================

    /// Starts connecting to the chat server.
    ///
    /// Already connected (or connecting): records a note and does nothing
    /// else.
    ///
    /// # Errors
    /// [`SessionError::TransportOpenFailure`] if the transport can't start
    /// the attempt. The session stays `Disconnected`.
    pub fn connect(&mut self) -> Result<(), SessionError> {
        match self.link {
            Link::Up { .. } => {
                self.note("You are already connected");
                return Ok(());
            }
            Link::Opening { .. } => {
                self.note("Connection already in progress");
                return Ok(());
            }
            Link::Down => {}
        }

        let address = self.config.address_for(self.identity.user_id());
        match self.transport.open(&address) {
            Ok(conn) => {
                tracing::info!(
                    %conn,
                    user_id = %self.identity.user_id(),
                    %address,
                    "connecting"
                );
                self.link = Link::Opening { conn, address };
                Ok(())
            }
            Err(e) => Err(self.record(SessionError::TransportOpenFailure(e))),
        }
    }

    /// Closes the connection, or abandons the attempt in flight.
    ///
    /// Always leaves the session `Disconnected` with no room. Does nothing
    /// if already disconnected.
    pub fn disconnect(&mut self) {
        let previous = std::mem::replace(&mut self.link, Link::Down);
        match previous {
            Link::Down => {}
            Link::Opening { conn, .. } => {
                self.transport.close();
                tracing::info!(%conn, "connection attempt cancelled");
                self.note("Connection attempt cancelled");
            }
            Link::Up { conn, .. } => {
                self.transport.close();
                tracing::info!(%conn, "disconnected by user");
                self.note("Disconnected from chat server");
            }
        }
    }

    /// Joins `room_id` (surrounding whitespace ignored).
    ///
    /// # Errors
    /// - [`SessionError::NotConnected`]: not connected
    /// - [`SessionError::InvalidRoomOperation`]: blank room id, or
    ///   already in a room
    pub fn join_room(&mut self, room_id: &str) -> Result<(), SessionError> {
        let room = self.try_join_room(room_id).map_err(|e| self.record(e))?;
        tracing::info!(user_id = %self.identity.user_id(), room_id = %room, "joined room");
        self.note(format!("You joined room: {room}"));
        Ok(())
    }

    /// Leaves the current room.
    ///
    /// # Errors
    /// - [`SessionError::NotConnected`]: not connected
    /// - [`SessionError::InvalidRoomOperation`]: not in a room
    pub fn leave_room(&mut self) -> Result<(), SessionError> {
        let room = self.try_leave_room().map_err(|e| self.record(e))?;
        tracing::info!(user_id = %self.identity.user_id(), room_id = %room, "left room");
        self.note(format!("You left the room: {room}"));
        Ok(())
    }

    /// Sends `text` to the current room and records it as `Sent`.
    ///
    /// The text goes out exactly as given; only the emptiness check
    /// ignores surrounding whitespace.
    ///
    /// # Errors
    /// - [`SessionError::NotConnected`]: not connected
    /// - [`SessionError::InvalidRoomOperation`]: not in a room, or blank
    ///   text
    pub fn send_message(&mut self, text: &str) -> Result<(), SessionError> {
        self.try_send_message(text).map_err(|e| self.record(e))?;
        self.transcript.push(text, Origin::Sent);
        Ok(())
    }

    // =====================================================================
    // Transport events
    // =====================================================================

    /// Applies one transport event.
    ///
    /// Events for any connection other than the one being tracked are
    /// stale and ignored.
    pub fn handle_event(&mut self, event: TransportEvent) {
        let TransportEvent { conn, kind } = event;
        match kind {
            TransportEventKind::Opened => self.on_transport_opened(conn),
            TransportEventKind::Closed => self.on_transport_closed(conn),
            TransportEventKind::Errored(detail) => {
                self.on_transport_error(conn, &detail)
            }
            TransportEventKind::Received(frame) => {
                self.on_inbound_frame(conn, &frame)
            }
        }
    }

    /// The attempt `conn` finished opening.
    pub fn on_transport_opened(&mut self, conn: ConnectionId) {
        let address = match &self.link {
            Link::Opening { conn: current, address } if *current == conn => {
                address.clone()
            }
            _ => {
                tracing::debug!(%conn, "ignoring open of untracked connection");
                return;
            }
        };
        tracing::info!(%conn, %address, "connected");
        self.link = Link::Up {
            conn,
            address,
            membership: RoomMembership::None,
        };
        self.note("Connected to chat server");
    }

    /// Connection `conn` closed.
    pub fn on_transport_closed(&mut self, conn: ConnectionId) {
        if self.link.conn() != Some(conn) {
            tracing::debug!(%conn, "ignoring close of untracked connection");
            return;
        }
        self.link = Link::Down;
        self.transport.close();
        tracing::info!(%conn, "connection closed");
        self.note("Disconnected from chat server");
    }

    /// Connection `conn` failed, either while opening or once open.
    pub fn on_transport_error(&mut self, conn: ConnectionId, detail: &str) {
        if self.link.conn() != Some(conn) {
            tracing::debug!(%conn, detail, "ignoring error of untracked connection");
            return;
        }
        let was_opening = matches!(self.link, Link::Opening { .. });
        self.link = Link::Down;
        self.transport.close();
        tracing::warn!(%conn, detail, "connection failed");
        if was_opening {
            self.note(format!("Could not connect: {detail}"));
        } else {
            self.note(format!("Connection error: {detail}"));
        }
    }

    /// A frame arrived on connection `conn`.
    ///
    /// Frames that fail to decode are recorded and dropped.
    pub fn on_inbound_frame(&mut self, conn: ConnectionId, frame: &str) {
        if !matches!(self.link, Link::Up { conn: current, .. } if current == conn) {
            tracing::debug!(%conn, "dropping frame for untracked connection");
            return;
        }
        match self.codec.decode_inbound(frame) {
            Ok(envelope) => {
                tracing::debug!(
                    %conn,
                    kind = %envelope.kind,
                    room_id = %envelope.room_id,
                    user_id = %envelope.user_id,
                    "frame received"
                );
                self.transcript.push(envelope.content, Origin::Received);
            }
            Err(e) => {
                tracing::debug!(%conn, error = %e, "dropping malformed frame");
                self.record(SessionError::Decode(e));
            }
        }
    }

    // =====================================================================
    // Internals
    // =====================================================================

    fn try_join_room(&mut self, room_id: &str) -> Result<RoomId, SessionError> {
        let Link::Up { membership, .. } = &self.link else {
            return Err(SessionError::NotConnected);
        };
        if let RoomMembership::Joined(current) = membership {
            return Err(SessionError::InvalidRoomOperation(format!(
                "You are already in room {current}; leave it first"
            )));
        }
        let room_id = room_id.trim();
        if room_id.is_empty() {
            return Err(SessionError::InvalidRoomOperation(
                "You must specify a room to join".into(),
            ));
        }

        let room = RoomId::from(room_id);
        let envelope = OutboundEnvelope::join(
            room.clone(),
            self.identity.user_id().clone(),
            Utc::now(),
        );
        self.send_envelope(&envelope)?;
        self.set_membership(RoomMembership::Joined(room.clone()));
        Ok(room)
    }

    fn try_leave_room(&mut self) -> Result<RoomId, SessionError> {
        let room = match &self.link {
            Link::Up {
                membership: RoomMembership::Joined(room),
                ..
            } => room.clone(),
            Link::Up { .. } => {
                return Err(SessionError::InvalidRoomOperation(
                    "You are not in any room".into(),
                ));
            }
            _ => return Err(SessionError::NotConnected),
        };

        let envelope = OutboundEnvelope::leave(
            room.clone(),
            self.identity.user_id().clone(),
            Utc::now(),
        );
        self.send_envelope(&envelope)?;
        self.set_membership(RoomMembership::None);
        Ok(room)
    }

    fn try_send_message(&mut self, text: &str) -> Result<(), SessionError> {
        let room = match &self.link {
            Link::Up {
                membership: RoomMembership::Joined(room),
                ..
            } => room.clone(),
            Link::Up { .. } => {
                return Err(SessionError::InvalidRoomOperation(
                    "You must join a room before sending messages".into(),
                ));
            }
            _ => return Err(SessionError::NotConnected),
        };
        if text.trim().is_empty() {
            return Err(SessionError::InvalidRoomOperation(
                "Message is empty".into(),
            ));
        }

        let envelope = OutboundEnvelope::message(
            room,
            self.identity.user_id().clone(),
            text,
            Utc::now(),
        );
        self.send_envelope(&envelope)
    }

    fn send_envelope(
        &mut self,
        envelope: &OutboundEnvelope,
    ) -> Result<(), SessionError> {
        let frame = self
            .codec
            .encode_outbound(envelope)
            .map_err(SessionError::Encode)?;
        self.transport.send(frame).map_err(SessionError::from_send)?;
        tracing::debug!(
            kind = %envelope.kind,
            room_id = %envelope.room_id,
            "frame sent"
        );
        Ok(())
    }

    fn set_membership(&mut self, next: RoomMembership) {
        if let Link::Up { membership, .. } = &mut self.link {
            *membership = next;
        }
    }

    fn note(&mut self, text: impl Into<String>) {
        self.transcript.push(text, Origin::System);
    }

    /// Records `err` in the transcript and hands it back.
    fn record(&mut self, err: SessionError) -> SessionError {
        tracing::debug!(error = %err, "operation failed");
        self.note(err.to_string());
        err
    }
}

// =========================================================================
// Tests
// =========================================================================
