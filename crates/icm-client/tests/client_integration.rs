//! Integration tests for `IcmClient` against a simulated compositor.
//!
//! # Purpose
//!
//! These tests drive the client through its *public* API the way an
//! application would, with the other end of the stream played by
//! [`FakeCompositor`].  They verify:
//!
//! - The happy path: queries resolve with the reply the compositor sends,
//!   and commands reach the socket in call order.
//! - Correlation: unechoed replies go to the oldest waiter; echoed sequence
//!   numbers pick the exact waiter even out of order.
//! - Teardown: closing, compositor EOF, and a malformed header all fail
//!   pending queries and emit `Closed`.
//!
//! # The fake compositor
//!
//! ```text
//! IcmClient ──frames──▶ duplex / UnixStream ──▶ FakeCompositor::next_message()
//! IcmClient ◀──frames── duplex / UnixStream ◀── FakeCompositor::send()
//! ```

use std::time::Duration;

use icm_client::{ClientConfig, ClientError, Event, EventKind, IcmClient, WindowOptions};
use icm_core::dispatch::MouseButton;
use icm_core::protocol::messages::{
    button, layer, CreateBuffer, PointerEvent, ScreenDimensions, WindowPosition, WindowSize,
    FORMAT_ARGB8888,
};
use icm_core::{decode_frame, encode_frame, FrameDecoder, IcmMessage};
use tokio::io::{duplex, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, DuplexStream};

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Compositor side of the stream: reads client frames, writes replies and
/// events.
struct FakeCompositor<S> {
    stream: S,
    decoder: FrameDecoder,
}

impl<S: AsyncRead + AsyncWrite + Unpin> FakeCompositor<S> {
    fn new(stream: S) -> Self {
        Self {
            stream,
            decoder: FrameDecoder::new(),
        }
    }

    /// Next frame from the client as `(sequence, message)`, or `None` once
    /// the client has shut down its write side.
    async fn next_message(&mut self) -> Option<(u32, IcmMessage)> {
        loop {
            if let Some(frame) = self.decoder.next_frame() {
                let frame = frame.expect("client sent a malformed frame");
                let msg = decode_frame(&frame).expect("client frame must decode");
                return Some((frame.header.sequence, msg));
            }
            let mut buf = [0u8; 4096];
            let n = self.stream.read(&mut buf).await.expect("read from client");
            if n == 0 {
                return None;
            }
            self.decoder.feed(&buf[..n]);
        }
    }

    async fn send(&mut self, msg: &IcmMessage, sequence: u32) {
        self.stream
            .write_all(&encode_frame(msg, sequence))
            .await
            .expect("write to client");
    }

    async fn send_raw(&mut self, bytes: &[u8]) {
        self.stream.write_all(bytes).await.expect("write to client");
    }
}

fn connected_pair() -> (IcmClient, FakeCompositor<DuplexStream>) {
    let (client_end, server_end) = duplex(64 * 1024);
    let mut client = IcmClient::new(ClientConfig::default());
    client.connect_with_stream(client_end);
    (client, FakeCompositor::new(server_end))
}

fn position(window_id: u32, x: i32, y: i32) -> IcmMessage {
    IcmMessage::WindowPositionData(WindowPosition { window_id, x, y })
}

/// Fails the test instead of hanging when something never arrives.
async fn within<F: std::future::Future>(fut: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(2), fut)
        .await
        .expect("timed out")
}

// ── Queries ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_screen_dimensions_query_resolves() {
    // Arrange
    let (client, mut server) = connected_pair();
    let dims = ScreenDimensions {
        total_width: 5760,
        total_height: 1080,
        scale: 1.0,
    };

    // Act
    let compositor = async {
        let (sequence, msg) = server.next_message().await.unwrap();
        assert_eq!(msg, IcmMessage::QueryScreenDimensions);
        assert_ne!(sequence, 0, "queries carry a fresh sequence number");
        server.send(&IcmMessage::ScreenDimensionsData(dims), 0).await;
    };
    let (result, ()) =
        within(async { tokio::join!(client.query_screen_dimensions(), compositor) }).await;

    // Assert
    assert_eq!(result.unwrap(), dims);
}

/// Two position queries are in flight and the compositor answers both
/// without echoing sequence numbers.  The first reply must go to the first
/// caller.
#[tokio::test]
async fn test_unechoed_replies_resolve_in_fifo_order() {
    // Arrange
    let (client, mut server) = connected_pair();

    // Act
    let compositor = async {
        let (_, first) = server.next_message().await.unwrap();
        let (_, second) = server.next_message().await.unwrap();
        assert_eq!(first, IcmMessage::QueryWindowPosition { window_id: 7 });
        assert_eq!(second, IcmMessage::QueryWindowPosition { window_id: 8 });
        server.send(&position(7, 70, 700), 0).await;
        server.send(&position(8, 80, 800), 0).await;
    };
    let (seven, eight, ()) = within(async {
        tokio::join!(
            client.query_window_position(7),
            client.query_window_position(8),
            compositor
        )
    })
    .await;

    // Assert
    assert_eq!(seven.unwrap().window_id, 7);
    assert_eq!(eight.unwrap().window_id, 8);
}

#[tokio::test]
async fn test_echoed_sequences_resolve_out_of_order_replies() {
    // Arrange
    let (client, mut server) = connected_pair();

    // Act – answer the second query first, echoing sequence numbers
    let compositor = async {
        let (seq_a, _) = server.next_message().await.unwrap();
        let (seq_b, _) = server.next_message().await.unwrap();
        server
            .send(
                &IcmMessage::WindowSizeData(WindowSize {
                    window_id: 2,
                    width: 20,
                    height: 20,
                }),
                seq_b,
            )
            .await;
        server
            .send(
                &IcmMessage::WindowSizeData(WindowSize {
                    window_id: 1,
                    width: 10,
                    height: 10,
                }),
                seq_a,
            )
            .await;
    };
    let (a, b, ()) = within(async {
        tokio::join!(client.query_window_size(1), client.query_window_size(2), compositor)
    })
    .await;

    // Assert
    assert_eq!(a.unwrap().width, 10);
    assert_eq!(b.unwrap().width, 20);
}

// ── Commands ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_create_window_sends_setup_frames_in_order() {
    // Arrange
    let (client, mut server) = connected_pair();

    // Act
    let id = client
        .create_window(WindowOptions::new(320, 200).at(40, 50).on_layer(layer::OVERLAY))
        .unwrap();
    let mut frames = Vec::new();
    for _ in 0..6 {
        frames.push(within(server.next_message()).await.unwrap());
    }

    // Assert
    assert_eq!(id, 1);
    assert!(frames.iter().all(|(seq, _)| *seq == 0), "commands carry sequence 0");
    let messages: Vec<IcmMessage> = frames.into_iter().map(|(_, m)| m).collect();
    assert_eq!(
        messages,
        vec![
            IcmMessage::CreateBuffer(CreateBuffer {
                buffer_id: 1,
                width: 320,
                height: 200,
                format: FORMAT_ARGB8888,
                usage_flags: 0,
            }),
            IcmMessage::SetWindowPosition(WindowPosition {
                window_id: 1,
                x: 40,
                y: 50,
            }),
            IcmMessage::SetWindowSize(WindowSize {
                window_id: 1,
                width: 320,
                height: 200,
            }),
            IcmMessage::SetWindowLayer {
                window_id: 1,
                layer: layer::OVERLAY,
            },
            IcmMessage::RegisterPointerEvent { window_id: 1 },
            IcmMessage::RegisterKeyboardEvent { window_id: 1 },
        ]
    );
    assert_eq!(client.window_ids(), vec![1]);
}

#[tokio::test]
async fn test_window_destroyed_event_evicts_cached_window() {
    // Arrange
    let (client, mut server) = connected_pair();
    let mut destroyed = client.subscribe(EventKind::WindowDestroyed);
    let id = client.create_window(WindowOptions::new(10, 10)).unwrap();
    assert!(client.cached_geometry(id).is_some());

    // Act
    server
        .send(&IcmMessage::WindowDestroyed { window_id: id }, 0)
        .await;
    within(destroyed.recv()).await;

    // Assert
    assert!(client.cached_geometry(id).is_none());
}

// ── Events ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_left_press_delivers_pointer_and_click() {
    // Arrange
    let (client, mut server) = connected_pair();
    let mut pointer = client.subscribe(EventKind::Pointer);
    let mut clicks = client.subscribe(EventKind::Click);
    let mut global = client.subscribe(EventKind::GlobalPointer);
    let press = PointerEvent {
        window_id: 3,
        time: 42,
        button: button::LEFT,
        state: 1,
        x: 12,
        y: 34,
    };

    // Act
    server.send(&IcmMessage::PointerEvent(press), 0).await;

    // Assert
    assert_eq!(within(pointer.recv()).await, Some(Event::Pointer(press)));
    match within(clicks.recv()).await {
        Some(Event::Click(t)) => {
            assert_eq!(t.button, MouseButton::Left);
            assert_eq!((t.window_id, t.x, t.y), (3, 12, 34));
        }
        other => panic!("expected a click, got {other:?}"),
    }
    assert_eq!(global.try_recv(), None);
}

#[tokio::test]
async fn test_subscriber_sees_connected_when_registered_before_connect() {
    // Arrange
    let (client_end, _server_end) = duplex(1024);
    let mut client = IcmClient::new(ClientConfig::default());
    let mut connected = client.subscribe(EventKind::Connected);

    // Act
    client.connect_with_stream(client_end);

    // Assert
    assert_eq!(connected.try_recv(), Some(Event::Connected));
    assert!(client.is_connected());
}

// ── Teardown ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_close_flushes_then_pending_query_fails() {
    // Arrange
    let (client, mut server) = connected_pair();
    let mut closed = client.subscribe(EventKind::Closed);

    // Act – queue a query, close, then let the compositor hang up
    let compositor = async {
        let (_, msg) = server.next_message().await.unwrap();
        assert_eq!(msg, IcmMessage::QueryMonitors);
        assert!(server.next_message().await.is_none(), "write side shut down");
        drop(server);
    };
    let query = client.query_monitors();
    let close = async {
        tokio::task::yield_now().await;
        client.close();
    };
    let (result, (), ()) = within(async { tokio::join!(query, close, compositor) }).await;

    // Assert
    assert!(matches!(result, Err(ClientError::ConnectionClosed)));
    assert_eq!(within(closed.recv()).await, Some(Event::Closed));
    assert!(!client.is_connected());
    assert!(matches!(
        client.query_monitors().await,
        Err(ClientError::ConnectionClosed)
    ));
}

#[tokio::test]
async fn test_malformed_header_tears_down_connection() {
    // Arrange
    let (client, mut server) = connected_pair();
    let mut violations = client.subscribe(EventKind::ProtocolViolation);
    let mut closed = client.subscribe(EventKind::Closed);

    // Act – the query is pending when a header claiming 4 bytes arrives
    let compositor = async {
        server.next_message().await.unwrap();
        let mut bad = 4u32.to_le_bytes().to_vec();
        bad.extend_from_slice(&[0u8; 12]);
        server.send_raw(&bad).await;
        server
    };
    let (result, _server) =
        within(async { tokio::join!(client.query_window_layer(1), compositor) }).await;

    // Assert
    assert!(matches!(result, Err(ClientError::ConnectionClosed)));
    assert!(matches!(
        within(violations.recv()).await,
        Some(Event::ProtocolViolation(_))
    ));
    assert_eq!(within(closed.recv()).await, Some(Event::Closed));
    assert!(!client.is_connected());
}

#[tokio::test]
async fn test_operations_before_connect_are_rejected() {
    let client = IcmClient::new(ClientConfig::default());
    assert!(matches!(
        client.set_window_visible(1, true),
        Err(ClientError::NotConnected)
    ));
    assert!(matches!(
        client.query_window_info(1).await,
        Err(ClientError::NotConnected)
    ));
}

// ── Unix socket ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_connect_over_unix_socket_from_config() {
    // Arrange
    let path = std::env::temp_dir().join(format!("icm-client-it-{}.sock", std::process::id()));
    let _ = std::fs::remove_file(&path);
    let listener = tokio::net::UnixListener::bind(&path).unwrap();
    let mut client = IcmClient::new(ClientConfig::with_socket_path(&path));

    // Act
    client.connect().await.unwrap();
    let (stream, _) = within(listener.accept()).await.unwrap();
    let mut server = FakeCompositor::new(stream);
    client.raise_window(9).unwrap();

    // Assert
    assert_eq!(
        within(server.next_message()).await,
        Some((0, IcmMessage::RaiseWindow { window_id: 9 }))
    );
    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn test_connect_to_missing_socket_reports_path() {
    let path = std::env::temp_dir().join("icm-client-it-does-not-exist.sock");
    let mut client = IcmClient::new(ClientConfig::with_socket_path(&path));

    match client.connect().await {
        Err(ClientError::Connect { path: p, .. }) => assert_eq!(p, path),
        other => panic!("expected a connect error, got {other:?}"),
    }
    assert!(!client.is_connected());
}
