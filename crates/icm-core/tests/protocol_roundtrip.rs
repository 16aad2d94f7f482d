//! Integration tests for the icm-core protocol layer.
//!
//! These tests drive the public API end to end: messages are encoded into
//! frames, cut back out of a byte stream by [`FrameDecoder`], decoded, and
//! handed to a [`Dispatcher`].

use std::sync::{Arc, Mutex};

use icm_core::{
    decode_frame, encode_frame,
    protocol::messages::{
        button, CreateBuffer, DrawPolygon, DrawText, MonitorInfo, PointerEvent, ToplevelWindow,
        UploadImage, WindowPosition, WindowStateFlags, FORMAT_ARGB8888,
    },
    Delivery, Dispatcher, Event, EventKind, FrameDecoder, IcmMessage, ProtocolError, Reply,
    ReplyKind, SequenceCounter,
};

/// Encodes `msg`, pushes the bytes through a fresh decoder, and decodes the
/// single resulting frame.
fn roundtrip(msg: &IcmMessage) -> IcmMessage {
    let counter = SequenceCounter::new();
    let bytes = encode_frame(msg, counter.next());

    let mut decoder = FrameDecoder::new();
    decoder.feed(&bytes);
    let frame = decoder
        .next_frame()
        .expect("one complete frame")
        .expect("well-formed frame");
    assert_eq!(decoder.buffered_len(), 0, "all bytes must be consumed");

    decode_frame(&frame).expect("decode must succeed")
}

#[test]
fn test_create_buffer_matches_documented_wire_bytes() {
    // Arrange
    let msg = IcmMessage::CreateBuffer(CreateBuffer {
        buffer_id: 1,
        width: 800,
        height: 600,
        format: FORMAT_ARGB8888,
        usage_flags: 0,
    });

    // Act
    let bytes = encode_frame(&msg, 0);

    // Assert
    let expected: [u8; 36] = [
        0x24, 0, 0, 0, // length 36
        0x13, 0, // type 19
        0, 0, // flags
        0, 0, 0, 0, // sequence
        0, 0, 0, 0, // num_fds
        1, 0, 0, 0, // buffer id
        0x20, 0x03, 0, 0, // 800
        0x58, 0x02, 0, 0, // 600
        0x41, 0x52, 0x32, 0x34, // "AR24"
        0, 0, 0, 0, // usage
    ];
    assert_eq!(bytes, expected);
}

#[test]
fn test_roundtrip_variable_length_commands() {
    let messages = [
        IcmMessage::DrawPolygon(DrawPolygon {
            window_id: 2,
            color_rgba: 0xFF00_00FF,
            fill: true,
            points: vec![(0, 0), (10, 0), (5, -8)],
        }),
        IcmMessage::UploadImage(UploadImage {
            image_id: 4,
            width: 2,
            height: 1,
            format: 0,
            data: vec![1, 2, 3, 4, 5, 6, 7, 8],
        }),
        IcmMessage::DrawText(DrawText {
            window_id: 2,
            x: 4,
            y: 16,
            color_rgba: 0xFFFF_FFFF,
            font_size: 12,
            text: "héllo".to_string(),
        }),
        IcmMessage::LaunchApp {
            command: "foot --server".to_string(),
        },
    ];

    for msg in &messages {
        assert_eq!(&roundtrip(msg), msg);
    }
}

#[test]
fn test_roundtrip_replies_with_records() {
    let monitors = IcmMessage::MonitorsData(vec![
        MonitorInfo {
            x: 0,
            y: 0,
            width: 1920,
            height: 1080,
            physical_width: 530,
            physical_height: 300,
            refresh_rate: 60000,
            scale: 1.0,
            enabled: true,
            primary: true,
            name: "DP-1".to_string(),
        },
        MonitorInfo {
            x: 1920,
            y: 0,
            width: 2560,
            height: 1440,
            physical_width: 600,
            physical_height: 340,
            refresh_rate: 144000,
            scale: 1.25,
            enabled: true,
            primary: false,
            name: "HDMI-A-1".to_string(),
        },
    ]);
    let toplevels = IcmMessage::ToplevelWindowsData(vec![ToplevelWindow {
        window_id: 9,
        x: 10,
        y: 20,
        width: 640,
        height: 480,
        visible: true,
        focused: false,
        state: WindowStateFlags(WindowStateFlags::MAXIMIZED),
        title: "Terminal".to_string(),
        app_id: "org.example.term".to_string(),
    }]);

    assert_eq!(roundtrip(&monitors), monitors);
    assert_eq!(roundtrip(&toplevels), toplevels);
}

#[test]
fn test_stream_of_frames_split_across_reads() {
    // Arrange – three frames delivered in awkward 7-byte chunks
    let counter = SequenceCounter::new();
    let messages = [
        IcmMessage::RaiseWindow { window_id: 1 },
        IcmMessage::QueryMonitors,
        IcmMessage::LaunchApp {
            command: "true".to_string(),
        },
    ];
    let stream: Vec<u8> = messages
        .iter()
        .flat_map(|m| encode_frame(m, counter.next()))
        .collect();

    // Act
    let mut decoder = FrameDecoder::new();
    let mut decoded = Vec::new();
    for chunk in stream.chunks(7) {
        decoder.feed(chunk);
        for frame in decoder.take_frames() {
            decoded.push(decode_frame(&frame.unwrap()).unwrap());
        }
    }

    // Assert
    assert_eq!(decoded, messages);
}

#[test]
fn test_malformed_header_stops_the_stream() {
    // Arrange – a valid frame followed by a header claiming 8 bytes
    let mut bytes = encode_frame(&IcmMessage::QueryMonitors, 1);
    bytes.extend_from_slice(&8u32.to_le_bytes());
    bytes.extend_from_slice(&[0u8; 12]);
    bytes.extend(encode_frame(&IcmMessage::QueryMonitors, 2));

    // Act
    let mut decoder = FrameDecoder::new();
    decoder.feed(&bytes);
    let results: Vec<_> = decoder.take_frames().collect();

    // Assert
    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert_eq!(
        results[1],
        Err(ProtocolError::MalformedFrame { length: 8 })
    );
    assert!(decoder.is_poisoned());
}

#[test]
fn test_stream_feeds_dispatcher_events_and_replies() {
    // Arrange
    let mut dispatcher = Dispatcher::new();
    let clicks = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&clicks);
    dispatcher.subscribe(EventKind::Click, move |ev| sink.lock().unwrap().push(ev.clone()));
    let mut reply = dispatcher.register_query(ReplyKind::WindowPosition, 1);

    let mut bytes = encode_frame(
        &IcmMessage::PointerEvent(PointerEvent {
            window_id: 3,
            time: 100,
            button: button::LEFT,
            state: 1,
            x: 5,
            y: 6,
        }),
        0,
    );
    let position = WindowPosition {
        window_id: 3,
        x: -10,
        y: 20,
    };
    bytes.extend(encode_frame(&IcmMessage::WindowPositionData(position), 0));

    // Act
    let mut decoder = FrameDecoder::new();
    decoder.feed(&bytes);
    let deliveries: Vec<Delivery> = decoder
        .take_frames()
        .map(|frame| dispatcher.dispatch_frame(&frame.unwrap()).unwrap())
        .collect();

    // Assert
    assert_eq!(
        deliveries[0],
        Delivery::Events {
            kinds: vec![EventKind::Pointer, EventKind::Click],
            handlers: 1,
        }
    );
    assert_eq!(clicks.lock().unwrap().len(), 1);
    assert!(matches!(clicks.lock().unwrap()[0], Event::Click(_)));
    assert_eq!(reply.try_recv().unwrap(), Ok(Reply::WindowPosition(position)));
}
