//! Session actor: a Tokio task that owns one [`ChatSession`].
//!
//! User intents and transport events both travel through a single
//! unbounded channel into the task, so the session sees them one at a
//! time, in arrival order. After each one the actor brings the
//! [`SessionSnapshot`] on its `watch` channel up to date for whoever is
//! rendering, appending new transcript entries rather than re-copying the
//! whole transcript.

use sockethub_session::{
    ChatSession, Identity, SessionConfig, SessionError, SessionSnapshot,
};
use sockethub_transport::{EventSink, Transport, TransportEvent};
use tokio::sync::{mpsc, oneshot, watch};

use crate::SocketHubError;

type Reply<R> = oneshot::Sender<R>;

/// Everything that can happen to a session, in one inbox.
pub(crate) enum SessionCommand {
    Connect { reply: Reply<Result<(), SessionError>> },
    Disconnect { reply: Reply<()> },
    JoinRoom {
        room_id: String,
        reply: Reply<Result<(), SessionError>>,
    },
    LeaveRoom { reply: Reply<Result<(), SessionError>> },
    SendMessage {
        text: String,
        reply: Reply<Result<(), SessionError>>,
    },
    /// An event reported by the transport.
    Transport(TransportEvent),
    /// Disconnect and stop the actor.
    Shutdown { reply: Reply<()> },
}

/// Handle to a running session actor.
///
/// Cheap to clone. The session is torn down (connection closed) when
/// [`shutdown`](Self::shutdown) is called or the last handle is dropped.
#[derive(Clone)]
pub struct SessionHandle {
    sender: mpsc::UnboundedSender<SessionCommand>,
    snapshots: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    /// Starts connecting. Returns once the attempt has started; watch the
    /// snapshots for the outcome.
    pub async fn connect(&self) -> Result<(), SocketHubError> {
        self.request(|reply| SessionCommand::Connect { reply })
            .await?
            .map_err(SocketHubError::Session)
    }

    /// Closes the connection. Always succeeds while the session runs.
    pub async fn disconnect(&self) -> Result<(), SocketHubError> {
        self.request(|reply| SessionCommand::Disconnect { reply })
            .await
    }

    /// Joins a room.
    pub async fn join_room(
        &self,
        room_id: impl Into<String>,
    ) -> Result<(), SocketHubError> {
        let room_id = room_id.into();
        self.request(|reply| SessionCommand::JoinRoom { room_id, reply })
            .await?
            .map_err(SocketHubError::Session)
    }

    /// Leaves the current room.
    pub async fn leave_room(&self) -> Result<(), SocketHubError> {
        self.request(|reply| SessionCommand::LeaveRoom { reply })
            .await?
            .map_err(SocketHubError::Session)
    }

    /// Sends a chat message to the current room.
    pub async fn send_message(
        &self,
        text: impl Into<String>,
    ) -> Result<(), SocketHubError> {
        let text = text.into();
        self.request(|reply| SessionCommand::SendMessage { text, reply })
            .await?
            .map_err(SocketHubError::Session)
    }

    /// A copy of the latest published snapshot.
    ///
    /// This clones the whole transcript; renderers that follow a session
    /// should [`subscribe`](Self::subscribe) and read
    /// [`SessionSnapshot::entries_since`] instead.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// A receiver that is notified whenever the session changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    /// Waits until a published snapshot satisfies `pred`, and returns it.
    ///
    /// Fails with [`SocketHubError::SessionClosed`] if the session stops
    /// first.
    pub async fn wait_until(
        &self,
        mut pred: impl FnMut(&SessionSnapshot) -> bool,
    ) -> Result<SessionSnapshot, SocketHubError> {
        let mut rx = self.snapshots.clone();
        let snapshot = rx
            .wait_for(|snapshot| pred(snapshot))
            .await
            .map_err(|_| SocketHubError::SessionClosed)?;
        Ok(SessionSnapshot::clone(&snapshot))
    }

    /// Disconnects and stops the session task.
    pub async fn shutdown(self) -> Result<(), SocketHubError> {
        self.request(|reply| SessionCommand::Shutdown { reply })
            .await
    }

    /// Returns `true` once the session task has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Sends a command and waits for its reply.
    async fn request<R>(
        &self,
        make: impl FnOnce(Reply<R>) -> SessionCommand,
    ) -> Result<R, SocketHubError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(make(reply_tx))
            .map_err(|_| SocketHubError::SessionClosed)?;
        reply_rx.await.map_err(|_| SocketHubError::SessionClosed)
    }
}

/// The task-side state.
struct SessionActor<T: Transport> {
    session: ChatSession<T>,
    receiver: mpsc::UnboundedReceiver<SessionCommand>,
    snapshots: watch::Sender<SessionSnapshot>,
}

impl<T: Transport> SessionActor<T> {
    async fn run(mut self) {
        let user_id = self.session.identity().user_id().clone();
        tracing::info!(%user_id, "session actor started");

        let mut shutdown_reply = None;
        // Each reply goes out after the snapshot is published, so a caller
        // that awaited an operation already sees its effect.
        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                SessionCommand::Connect { reply } => {
                    let result = self.session.connect();
                    self.publish();
                    let _ = reply.send(result);
                }
                SessionCommand::Disconnect { reply } => {
                    self.session.disconnect();
                    self.publish();
                    let _ = reply.send(());
                }
                SessionCommand::JoinRoom { room_id, reply } => {
                    let result = self.session.join_room(&room_id);
                    self.publish();
                    let _ = reply.send(result);
                }
                SessionCommand::LeaveRoom { reply } => {
                    let result = self.session.leave_room();
                    self.publish();
                    let _ = reply.send(result);
                }
                SessionCommand::SendMessage { text, reply } => {
                    let result = self.session.send_message(&text);
                    self.publish();
                    let _ = reply.send(result);
                }
                SessionCommand::Transport(event) => {
                    self.session.handle_event(event);
                    self.publish();
                }
                SessionCommand::Shutdown { reply } => {
                    shutdown_reply = Some(reply);
                    break;
                }
            }
        }

        // Either shut down explicitly or every handle is gone.
        self.session.disconnect();
        self.publish();
        tracing::info!(%user_id, "session actor stopped");
        if let Some(reply) = shutdown_reply {
            let _ = reply.send(());
        }
    }

    /// Updates the published snapshot in place. Receivers are only woken
    /// when something actually changed.
    fn publish(&self) {
        let session = &self.session;
        self.snapshots
            .send_if_modified(|snapshot| session.refresh_snapshot(snapshot));
    }
}

/// Spawns a session actor and returns a handle to it.
///
/// `make_transport` receives the [`EventSink`] that feeds the actor's
/// inbox. The sink only holds a weak reference to the inbox, so the
/// transport doesn't keep the session alive after its handles are gone.
pub fn spawn_session<T, F>(
    identity: Identity,
    config: SessionConfig,
    make_transport: F,
) -> Result<SessionHandle, SocketHubError>
where
    T: Transport,
    F: FnOnce(EventSink) -> T,
{
    let runtime = tokio::runtime::Handle::try_current()
        .map_err(|e| SocketHubError::NoRuntime(e.to_string()))?;

    let (tx, rx) = mpsc::unbounded_channel();
    let inbox = tx.downgrade();
    let sink = EventSink::new(move |event| {
        if let Some(inbox) = inbox.upgrade() {
            let _ = inbox.send(SessionCommand::Transport(event));
        }
    });

    let session = ChatSession::new(identity, config, make_transport(sink));
    let (snap_tx, snap_rx) = watch::channel(session.snapshot());

    runtime.spawn(
        SessionActor {
            session,
            receiver: rx,
            snapshots: snap_tx,
        }
        .run(),
    );

    Ok(SessionHandle {
        sender: tx,
        snapshots: snap_rx,
    })
}
