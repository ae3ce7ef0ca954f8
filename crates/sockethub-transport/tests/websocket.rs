//! Integration tests for the WebSocket client transport.
//!
//! These tests spin up a real `tokio-tungstenite` server on a random local
//! port and drive a [`WebSocketTransport`] against it, checking the events
//! it reports and the frames that actually reach the server.

#[cfg(feature = "websocket")]
mod websocket {
    use std::time::Duration;

    use futures_util::{SinkExt, StreamExt};
    use sockethub_transport::{
        EventSink, Transport, TransportError, TransportEvent,
        TransportEventKind, WebSocketConfig, WebSocketTransport,
    };
    use tokio::net::TcpListener;
    use tokio::sync::mpsc;
    use tokio_tungstenite::tungstenite::Message;

    type ServerWs = tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>;

    /// Binds a listener on an OS-assigned port and returns it with its
    /// `ws://` base URL.
    async fn bind_server() -> (TcpListener, String) {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = listener.local_addr().expect("should have address");
        (listener, format!("ws://{addr}"))
    }

    async fn accept(listener: &TcpListener) -> ServerWs {
        let (stream, _) = listener.accept().await.expect("should accept");
        tokio_tungstenite::accept_async(stream)
            .await
            .expect("handshake should succeed")
    }

    fn transport() -> (WebSocketTransport, mpsc::UnboundedReceiver<TransportEvent>)
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let config = WebSocketConfig {
            connect_timeout: Duration::from_secs(2),
        };
        (WebSocketTransport::new(config, EventSink::from_channel(tx)), rx)
    }

    async fn next_event(
        rx: &mut mpsc::UnboundedReceiver<TransportEvent>,
    ) -> TransportEvent {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("event should arrive in time")
            .expect("sink should still be alive")
    }

    #[tokio::test]
    async fn test_open_send_receive_and_peer_close() {
        let (listener, base) = bind_server().await;
        let (mut transport, mut events) = transport();

        let conn = transport
            .open(&format!("{base}/ws/alice"))
            .expect("open should start");
        let mut server_ws = accept(&listener).await;

        let opened = next_event(&mut events).await;
        assert_eq!(opened, TransportEvent::new(conn, TransportEventKind::Opened));
        assert!(transport.is_open());

        // --- Client sends, server receives ---
        transport
            .send(r#"{"hello":"server"}"#.to_string())
            .expect("send should succeed once open");
        let msg = server_ws.next().await.unwrap().unwrap();
        assert_eq!(msg.into_text().unwrap().as_str(), r#"{"hello":"server"}"#);

        // --- Server sends, client receives ---
        server_ws
            .send(Message::Text("hello client".into()))
            .await
            .unwrap();
        let received = next_event(&mut events).await;
        assert_eq!(
            received.kind,
            TransportEventKind::Received("hello client".into())
        );

        // --- Server closes ---
        server_ws.close(None).await.unwrap();
        let closed = next_event(&mut events).await;
        assert_eq!(closed, TransportEvent::new(conn, TransportEventKind::Closed));
    }

    #[tokio::test]
    async fn test_send_before_open_is_not_connected() {
        let (listener, base) = bind_server().await;
        let (mut transport, _events) = transport();

        transport.open(&base).expect("open should start");
        // The handshake hasn't been accepted yet, so nothing is open.
        let result = transport.send("early".into());

        assert!(matches!(result, Err(TransportError::NotConnected)));
        drop(listener);
    }

    #[tokio::test]
    async fn test_local_close_reports_closed() {
        let (listener, base) = bind_server().await;
        let (mut transport, mut events) = transport();

        let conn = transport.open(&base).expect("open should start");
        let mut server_ws = accept(&listener).await;
        assert_eq!(next_event(&mut events).await.kind, TransportEventKind::Opened);

        transport.close();

        assert_eq!(
            next_event(&mut events).await,
            TransportEvent::new(conn, TransportEventKind::Closed)
        );
        assert!(!transport.is_open());
        // The server sees the close frame.
        let msg = server_ws.next().await;
        assert!(matches!(msg, Some(Ok(Message::Close(_))) | None));
    }

    #[tokio::test]
    async fn test_close_while_connecting_never_opens() {
        let (listener, base) = bind_server().await;
        let (mut transport, mut events) = transport();

        let conn = transport.open(&base).expect("open should start");
        transport.close();

        // Let the handshake complete on the server side.
        let _server_ws = accept(&listener).await;

        let event = next_event(&mut events).await;
        assert_eq!(event, TransportEvent::new(conn, TransportEventKind::Closed));
        assert!(!transport.is_open());
    }

    #[tokio::test]
    async fn test_open_unreachable_reports_error() {
        // Bind then drop to get a port nobody listens on.
        let (listener, base) = bind_server().await;
        drop(listener);
        let (mut transport, mut events) = transport();

        let conn = transport.open(&base).expect("open should start");

        let event = next_event(&mut events).await;
        assert_eq!(event.conn, conn);
        assert!(matches!(event.kind, TransportEventKind::Errored(_)));
    }

    #[tokio::test]
    async fn test_reopen_uses_new_connection_id() {
        let (listener, base) = bind_server().await;
        let (mut transport, mut events) = transport();

        let first = transport.open(&base).expect("first open");
        let _ws1 = accept(&listener).await;
        assert_eq!(next_event(&mut events).await.kind, TransportEventKind::Opened);

        let second = transport.open(&base).expect("second open");
        let _ws2 = accept(&listener).await;

        assert_ne!(first, second);
        // The first connection reports its close, the second its open.
        let mut seen = vec![next_event(&mut events).await, next_event(&mut events).await];
        seen.sort_by_key(|e| e.conn.into_inner());
        assert_eq!(seen[0], TransportEvent::new(first, TransportEventKind::Closed));
        assert_eq!(seen[1], TransportEvent::new(second, TransportEventKind::Opened));
    }
}
