//! `ChatClientBuilder`: the entry point for running a chat session.
//!
//! Ties the layers together: WebSocket transport → JSON codec → session
//! state machine → actor task.

use std::time::Duration;

use sockethub_session::{Credentials, Identity, IdentityProvider, SessionConfig};
use sockethub_transport::{WebSocketConfig, WebSocketTransport};

use crate::actor::{spawn_session, SessionHandle};
use crate::SocketHubError;

/// Builder for configuring and starting a chat session.
///
/// # Example
///
/// ```rust,no_run
/// use sockethub::prelude::*;
///
/// # async fn run() -> Result<(), SocketHubError> {
/// let me = Identity::new("alice", "Alice")?;
/// let session = ChatClientBuilder::new()
///     .server_url("ws://localhost:8000/ws")
///     .spawn(me)?;
///
/// session.connect().await?;
/// session
///     .wait_until(|s| s.connection == ConnectionState::Connected)
///     .await?;
/// session.join_room("lobby").await?;
/// session.send_message("hi").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ChatClientBuilder {
    session_config: SessionConfig,
    websocket_config: WebSocketConfig,
}

impl ChatClientBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base WebSocket URL; the user id is appended per session.
    pub fn server_url(mut self, url: impl Into<String>) -> Self {
        self.session_config.server_url = url.into();
        self
    }

    /// Sets how long an open attempt may take.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.websocket_config.connect_timeout = timeout;
        self
    }

    /// Sets the session configuration.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Sets the WebSocket configuration.
    pub fn websocket_config(mut self, config: WebSocketConfig) -> Self {
        self.websocket_config = config;
        self
    }

    /// Starts a session for `identity` on the current Tokio runtime.
    ///
    /// The session starts disconnected; call
    /// [`SessionHandle::connect`] to open the connection.
    pub fn spawn(self, identity: Identity) -> Result<SessionHandle, SocketHubError> {
        tracing::debug!(
            user_id = %identity.user_id(),
            server_url = %self.session_config.server_url,
            "spawning chat session"
        );
        let websocket_config = self.websocket_config;
        spawn_session(identity, self.session_config, move |sink| {
            WebSocketTransport::new(websocket_config, sink)
        })
    }

    /// Logs in through `provider` and starts a session for the identity
    /// it resolves.
    ///
    /// # Errors
    /// Whatever the provider reports, typically
    /// `SessionError::AuthFailed`, wrapped in [`SocketHubError::Session`].
    pub async fn spawn_authenticated<P: IdentityProvider>(
        self,
        provider: &P,
        credentials: &Credentials,
    ) -> Result<SessionHandle, SocketHubError> {
        let token = provider.login(credentials).await?;
        let identity = provider.current_user(&token).await?;
        tracing::info!(user_id = %identity.user_id(), "authenticated");
        self.spawn(identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let builder = ChatClientBuilder::new();
        assert_eq!(builder.session_config.server_url, "ws://localhost:8000/ws");
        assert_eq!(
            builder.websocket_config.connect_timeout,
            Duration::from_secs(10)
        );
    }

    #[test]
    fn test_builder_overrides() {
        let builder = ChatClientBuilder::new()
            .server_url("ws://chat.example:9000/ws")
            .connect_timeout(Duration::from_millis(250));
        assert_eq!(builder.session_config.server_url, "ws://chat.example:9000/ws");
        assert_eq!(
            builder.websocket_config.connect_timeout,
            Duration::from_millis(250)
        );
    }

    #[test]
    fn test_spawn_outside_runtime_fails() {
        let me = Identity::new("alice", "Alice").unwrap();
        let result = ChatClientBuilder::new().spawn(me);
        assert!(matches!(result, Err(SocketHubError::NoRuntime(_))));
    }

    #[tokio::test]
    async fn test_spawn_starts_disconnected() {
        let me = Identity::new("alice", "Alice").unwrap();
        let handle = ChatClientBuilder::new().spawn(me).unwrap();

        let snapshot = handle.snapshot();
        assert_eq!(
            snapshot.connection,
            sockethub_session::ConnectionState::Disconnected
        );
        assert!(snapshot.transcript.is_empty());
        handle.shutdown().await.unwrap();
    }
}
