//! WebSocket client transport using `tokio-tungstenite`.
//!
//! Each [`open`](Transport::open) spawns one connection task. The task owns
//! the socket; the [`WebSocketTransport`] keeps only a channel to it plus
//! a flag saying whether the socket is open for writing.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

use crate::{
    ConnectionId, EventSink, Transport, TransportError, TransportEvent,
    TransportEventKind,
};

/// Settings for [`WebSocketTransport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebSocketConfig {
    /// How long an open attempt may take before it is reported as failed.
    pub connect_timeout: Duration,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Requests from the transport handle to the connection task.
#[derive(Debug)]
enum Outgoing {
    Frame(String),
    Close,
}

/// The handle side of one live connection task.
struct Link {
    id: ConnectionId,
    outgoing: mpsc::UnboundedSender<Outgoing>,
    open: Arc<AtomicBool>,
}

/// A WebSocket-based client [`Transport`].
///
/// Holds at most one connection at a time. Events are delivered to the
/// [`EventSink`] given at construction.
pub struct WebSocketTransport {
    config: WebSocketConfig,
    sink: EventSink,
    link: Option<Link>,
}

impl WebSocketTransport {
    /// Creates a transport that reports events to `sink`.
    pub fn new(config: WebSocketConfig, sink: EventSink) -> Self {
        Self {
            config,
            sink,
            link: None,
        }
    }

    /// Returns `true` while the current connection is open for writing.
    pub fn is_open(&self) -> bool {
        self.link
            .as_ref()
            .is_some_and(|link| link.open.load(Ordering::Acquire))
    }
}

impl Transport for WebSocketTransport {
    fn open(&mut self, address: &str) -> Result<ConnectionId, TransportError> {
        if !(address.starts_with("ws://") || address.starts_with("wss://")) {
            return Err(TransportError::InvalidAddress {
                address: address.to_string(),
                reason: "expected a ws:// or wss:// URL".into(),
            });
        }

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| TransportError::OpenFailed(e.to_string()))?;

        self.close();

        let id = ConnectionId::next();
        let (tx, rx) = mpsc::unbounded_channel();
        let open = Arc::new(AtomicBool::new(false));

        runtime.spawn(run_connection(
            id,
            address.to_string(),
            self.config.connect_timeout,
            self.sink.clone(),
            Arc::clone(&open),
            rx,
        ));

        tracing::debug!(%id, address, "WebSocket open started");
        self.link = Some(Link {
            id,
            outgoing: tx,
            open,
        });
        Ok(id)
    }

    fn send(&mut self, frame: String) -> Result<(), TransportError> {
        let link = match &self.link {
            Some(link) if link.open.load(Ordering::Acquire) => link,
            _ => return Err(TransportError::NotConnected),
        };
        link.outgoing.send(Outgoing::Frame(frame)).map_err(|_| {
            TransportError::ConnectionClosed(format!(
                "{} task has exited",
                link.id
            ))
        })
    }

    fn close(&mut self) {
        if let Some(link) = self.link.take() {
            link.open.store(false, Ordering::Release);
            // The task may already be gone; then there's nothing to close.
            let _ = link.outgoing.send(Outgoing::Close);
            tracing::debug!(id = %link.id, "WebSocket close requested");
        }
    }
}

impl Drop for WebSocketTransport {
    fn drop(&mut self) {
        self.close();
    }
}

/// Drives one connection from the open attempt to the close.
async fn run_connection(
    id: ConnectionId,
    url: String,
    connect_timeout: Duration,
    sink: EventSink,
    open: Arc<AtomicBool>,
    mut outgoing: mpsc::UnboundedReceiver<Outgoing>,
) {
    let emit = |kind| sink.emit(TransportEvent::new(id, kind));

    let ws = match tokio::time::timeout(
        connect_timeout,
        tokio_tungstenite::connect_async(url.as_str()),
    )
    .await
    {
        Ok(Ok((ws, _response))) => ws,
        Ok(Err(e)) => {
            tracing::warn!(%id, error = %e, "WebSocket open failed");
            emit(TransportEventKind::Errored(e.to_string()));
            return;
        }
        Err(_) => {
            tracing::warn!(%id, "WebSocket open timed out");
            emit(TransportEventKind::Errored(format!(
                "connection attempt timed out after {}ms",
                connect_timeout.as_millis()
            )));
            return;
        }
    };

    let (mut write, mut read) = ws.split();

    // Closed while the attempt was still in flight: open-then-close.
    if matches!(
        outgoing.try_recv(),
        Ok(Outgoing::Close) | Err(mpsc::error::TryRecvError::Disconnected)
    ) {
        let _ = write.send(Message::Close(None)).await;
        tracing::debug!(%id, "connection abandoned before open");
        emit(TransportEventKind::Closed);
        return;
    }

    open.store(true, Ordering::Release);
    tracing::info!(%id, %url, "WebSocket connected");
    emit(TransportEventKind::Opened);

    loop {
        tokio::select! {
            cmd = outgoing.recv() => match cmd {
                Some(Outgoing::Frame(frame)) => {
                    if let Err(e) = write.send(Message::Text(frame.into())).await {
                        open.store(false, Ordering::Release);
                        tracing::warn!(%id, error = %e, "WebSocket send failed");
                        emit(TransportEventKind::Errored(e.to_string()));
                        return;
                    }
                }
                Some(Outgoing::Close) | None => {
                    open.store(false, Ordering::Release);
                    let _ = write.send(Message::Close(None)).await;
                    tracing::info!(%id, "WebSocket closed locally");
                    emit(TransportEventKind::Closed);
                    return;
                }
            },
            msg = read.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    emit(TransportEventKind::Received(text.as_str().to_owned()));
                }
                Some(Ok(Message::Binary(data))) => {
                    match String::from_utf8(data.to_vec()) {
                        Ok(text) => emit(TransportEventKind::Received(text)),
                        Err(_) => {
                            tracing::debug!(%id, "dropping non-UTF-8 binary frame");
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | None => {
                    open.store(false, Ordering::Release);
                    tracing::info!(%id, "WebSocket closed by peer");
                    emit(TransportEventKind::Closed);
                    return;
                }
                Some(Ok(_)) => continue, // ping/pong/raw frame
                Some(Err(e)) => {
                    open.store(false, Ordering::Release);
                    tracing::warn!(%id, error = %e, "WebSocket receive failed");
                    emit(TransportEventKind::Errored(e.to_string()));
                    return;
                }
            },
        }
    }
}
