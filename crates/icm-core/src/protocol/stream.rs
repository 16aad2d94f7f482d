//! Frame demultiplexer for the inbound byte stream.
//!
//! # Why accumulate? (for beginners)
//!
//! A stream socket has no notion of message boundaries.  One `read()` may
//! return half a frame, exactly one frame, or the tail of one frame glued to
//! three more.  [`FrameDecoder`] hides that: bytes go in through
//! [`feed`](FrameDecoder::feed) in whatever chunks the socket produced, and
//! complete frames come out of [`take_frames`](FrameDecoder::take_frames) in
//! arrival order.  A trailing partial frame stays buffered until the next
//! `feed` completes it.
//!
//! Framing relies only on the header's `length` field, never on the type
//! code, so a frame of an unknown type is still cut out correctly and the
//! stream stays in sync.  The one unrecoverable case is a `length` below the
//! header size: after that the decoder cannot know where the next frame
//! starts, so it reports [`ProtocolError::MalformedFrame`] and stays poisoned.

use crate::protocol::codec::{parse_header, ProtocolError};
use crate::protocol::messages::{Frame, HEADER_SIZE};

/// Consumed bytes are only shifted out of the buffer once this many pile up.
const COMPACT_THRESHOLD: usize = 64 * 1024;

/// Incremental splitter turning stream chunks into [`Frame`]s.
///
/// # Examples
///
/// ```rust
/// use icm_core::protocol::{encode_frame, FrameDecoder, IcmMessage};
///
/// let bytes = encode_frame(&IcmMessage::CompositorShutdown, 0);
/// let mut decoder = FrameDecoder::new();
/// decoder.feed(&bytes[..10]);
/// assert_eq!(decoder.take_frames().count(), 0);
/// decoder.feed(&bytes[10..]);
/// assert_eq!(decoder.take_frames().count(), 1);
/// ```
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: Vec<u8>,
    /// Start of the first unconsumed byte in `buf`.
    pos: usize,
    poisoned: Option<ProtocolError>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a chunk read from the socket.
    pub fn feed(&mut self, bytes: &[u8]) {
        if self.poisoned.is_some() {
            return;
        }
        self.compact();
        self.buf.extend_from_slice(bytes);
    }

    /// Cuts the next complete frame off the front of the buffer.
    ///
    /// Returns `None` when fewer bytes than a whole frame are buffered.
    /// Once a malformed header has been seen, every call returns that error.
    pub fn next_frame(&mut self) -> Option<Result<Frame, ProtocolError>> {
        if let Some(err) = &self.poisoned {
            return Some(Err(err.clone()));
        }

        let pending = &self.buf[self.pos..];
        if pending.len() < HEADER_SIZE {
            return None;
        }

        let header = match parse_header(pending) {
            Ok(header) => header,
            Err(err) => return Some(Err(err)),
        };
        let length = header.length as usize;
        if length < HEADER_SIZE {
            let err = ProtocolError::MalformedFrame {
                length: header.length,
            };
            self.poisoned = Some(err.clone());
            return Some(Err(err));
        }
        if pending.len() < length {
            return None;
        }

        let payload = pending[HEADER_SIZE..length].to_vec();
        self.pos += length;
        Some(Ok(Frame { header, payload }))
    }

    /// Drains every complete frame currently buffered, in arrival order.
    ///
    /// The iterator is lazy and finite.  It stops at the first partial frame,
    /// or after yielding a [`ProtocolError::MalformedFrame`].
    pub fn take_frames(&mut self) -> TakeFrames<'_> {
        TakeFrames {
            decoder: self,
            done: false,
        }
    }

    /// Bytes buffered but not yet returned as frames.
    pub fn buffered_len(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Returns `true` after a malformed header has been seen.
    pub fn is_poisoned(&self) -> bool {
        self.poisoned.is_some()
    }

    fn compact(&mut self) {
        if self.pos == self.buf.len() {
            self.buf.clear();
            self.pos = 0;
        } else if self.pos >= COMPACT_THRESHOLD {
            self.buf.drain(..self.pos);
            self.pos = 0;
        }
    }
}

/// Iterator returned by [`FrameDecoder::take_frames`].
pub struct TakeFrames<'a> {
    decoder: &'a mut FrameDecoder,
    done: bool,
}

impl Iterator for TakeFrames<'_> {
    type Item = Result<Frame, ProtocolError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = self.decoder.next_frame();
        if matches!(item, None | Some(Err(_))) {
            self.done = true;
        }
        item
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::codec::encode_frame;
    use crate::protocol::messages::{IcmMessage, MessageType, PointerEvent};

    fn pointer(window_id: u32, x: i32) -> IcmMessage {
        IcmMessage::PointerEvent(PointerEvent {
            window_id,
            time: 0,
            button: 0,
            state: 0,
            x,
            y: 0,
        })
    }

    fn three_frames() -> Vec<u8> {
        let mut bytes = encode_frame(&pointer(1, 10), 0);
        bytes.extend(encode_frame(&IcmMessage::CompositorShutdown, 0));
        bytes.extend(encode_frame(&pointer(2, 20), 0));
        bytes
    }

    fn types(frames: &[Frame]) -> Vec<u16> {
        frames.iter().map(|f| f.header.message_type).collect()
    }

    #[test]
    fn test_single_chunk_with_multiple_frames_yields_all_in_order() {
        // Arrange
        let mut decoder = FrameDecoder::new();

        // Act
        decoder.feed(&three_frames());
        let frames: Vec<Frame> = decoder.take_frames().map(Result::unwrap).collect();

        // Assert
        assert_eq!(
            types(&frames),
            vec![
                MessageType::PointerEvent as u16,
                MessageType::CompositorShutdown as u16,
                MessageType::PointerEvent as u16,
            ]
        );
        assert_eq!(decoder.buffered_len(), 0);
    }

    #[test]
    fn test_one_byte_at_a_time_matches_whole_feed() {
        // Arrange
        let bytes = three_frames();
        let mut whole = FrameDecoder::new();
        whole.feed(&bytes);
        let expected: Vec<Frame> = whole.take_frames().map(Result::unwrap).collect();

        // Act
        let mut decoder = FrameDecoder::new();
        let mut frames = Vec::new();
        for b in &bytes {
            decoder.feed(std::slice::from_ref(b));
            frames.extend(decoder.take_frames().map(Result::unwrap));
        }

        // Assert
        assert_eq!(frames, expected);
    }

    #[test]
    fn test_split_at_every_offset_reassembles() {
        let bytes = three_frames();
        for split in 0..=bytes.len() {
            let mut decoder = FrameDecoder::new();
            decoder.feed(&bytes[..split]);
            let mut frames: Vec<Frame> = decoder.take_frames().map(Result::unwrap).collect();
            decoder.feed(&bytes[split..]);
            frames.extend(decoder.take_frames().map(Result::unwrap));
            assert_eq!(frames.len(), 3, "split at {split}");
        }
    }

    #[test]
    fn test_partial_frame_stays_buffered() {
        // Arrange
        let bytes = encode_frame(&pointer(1, 1), 0);
        let mut decoder = FrameDecoder::new();

        // Act
        decoder.feed(&bytes[..bytes.len() - 1]);

        // Assert
        assert!(decoder.next_frame().is_none());
        assert_eq!(decoder.buffered_len(), bytes.len() - 1);
    }

    #[test]
    fn test_header_only_frame_has_empty_payload() {
        let mut decoder = FrameDecoder::new();
        decoder.feed(&encode_frame(&IcmMessage::QueryMonitors, 3));
        let frame = decoder.next_frame().unwrap().unwrap();
        assert_eq!(frame.header.length, 16);
        assert_eq!(frame.header.sequence, 3);
        assert!(frame.payload.is_empty());
    }

    #[test]
    fn test_length_below_header_is_malformed_and_poisons() {
        // Arrange – header claiming length 8
        let mut bytes = vec![0u8; 16];
        bytes[0..4].copy_from_slice(&8u32.to_le_bytes());
        let mut decoder = FrameDecoder::new();
        decoder.feed(&bytes);

        // Act
        let first = decoder.next_frame();
        decoder.feed(&encode_frame(&IcmMessage::CompositorShutdown, 0));
        let second = decoder.next_frame();

        // Assert
        let expected = ProtocolError::MalformedFrame { length: 8 };
        assert_eq!(first, Some(Err(expected.clone())));
        assert_eq!(second, Some(Err(expected)));
        assert!(decoder.is_poisoned());
    }

    #[test]
    fn test_take_frames_stops_after_malformed() {
        let mut bytes = encode_frame(&IcmMessage::CompositorShutdown, 0);
        bytes.extend_from_slice(&[0u8; 16]);
        let mut decoder = FrameDecoder::new();
        decoder.feed(&bytes);

        let items: Vec<_> = decoder.take_frames().collect();

        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert_eq!(items[1], Err(ProtocolError::MalformedFrame { length: 0 }));
    }

    #[test]
    fn test_unknown_type_is_still_framed() {
        // Arrange – type 999 with a 4-byte payload, then a known frame
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&20u32.to_le_bytes());
        bytes.extend_from_slice(&999u16.to_le_bytes());
        bytes.extend_from_slice(&[0u8; 10]);
        bytes.extend_from_slice(&[1, 2, 3, 4]);
        bytes.extend(encode_frame(&IcmMessage::CompositorShutdown, 0));
        let mut decoder = FrameDecoder::new();

        // Act
        decoder.feed(&bytes);
        let frames: Vec<Frame> = decoder.take_frames().map(Result::unwrap).collect();

        // Assert
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].payload, vec![1, 2, 3, 4]);
        assert_eq!(frames[1].header.message_type, MessageType::CompositorShutdown as u16);
    }
}
