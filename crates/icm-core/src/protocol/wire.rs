//! Little-endian field helpers shared by every payload codec.
//!
//! Two shapes recur across the protocol: plain scalars at fixed offsets and
//! fixed-capacity, NUL-padded UTF-8 strings.  Both are handled here once so
//! the per-message codecs only list fields in order.

use crate::protocol::codec::ProtocolError;

// ── Writers ───────────────────────────────────────────────────────────────────

pub(crate) fn put_u16(buf: &mut Vec<u8>, v: u16) {
    buf.extend_from_slice(&v.to_le_bytes());
}

pub(crate) fn put_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

pub(crate) fn put_i32(buf: &mut Vec<u8>, v: i32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

pub(crate) fn put_f32(buf: &mut Vec<u8>, v: f32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

pub(crate) fn put_bool(buf: &mut Vec<u8>, v: bool) {
    buf.push(u8::from(v));
}

/// Booleans the C structures declare as 32-bit words.
pub(crate) fn put_bool32(buf: &mut Vec<u8>, v: bool) {
    put_u32(buf, u32::from(v));
}

pub(crate) fn put_zeros(buf: &mut Vec<u8>, n: usize) {
    buf.resize(buf.len() + n, 0);
}

/// Writes `s` into exactly `capacity` bytes, NUL-padded.
///
/// A string longer than `capacity` is cut at the last UTF-8 character
/// boundary that fits, so the field never holds a partial code point.
/// A string of exactly `capacity` bytes is written without a terminator.
pub fn write_fixed_str(buf: &mut Vec<u8>, s: &str, capacity: usize) {
    let bytes = truncate_to_boundary(s, capacity).as_bytes();
    buf.extend_from_slice(bytes);
    put_zeros(buf, capacity - bytes.len());
}

/// Decodes a fixed-capacity field: everything before the first NUL, or the
/// whole field when it holds no NUL.  Invalid UTF-8 is replaced, not rejected.
pub fn read_fixed_str(field: &[u8]) -> String {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end]).into_owned()
}

fn truncate_to_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

// ── Reader ────────────────────────────────────────────────────────────────────

/// Bounds-checked cursor over one payload.
///
/// Every read reports [`ProtocolError::TruncatedPayload`] tagged with the
/// message kind instead of panicking on a short buffer.
pub(crate) struct PayloadReader<'a> {
    buf: &'a [u8],
    pos: usize,
    kind: &'static str,
}

impl<'a> PayloadReader<'a> {
    /// Checks the kind's minimum fixed prefix up front.
    pub(crate) fn new(
        buf: &'a [u8],
        kind: &'static str,
        min_len: usize,
    ) -> Result<Self, ProtocolError> {
        if buf.len() < min_len {
            return Err(ProtocolError::TruncatedPayload {
                kind,
                needed: min_len,
                available: buf.len(),
            });
        }
        Ok(Self { buf, pos: 0, kind })
    }

    pub(crate) fn bytes(&mut self, n: usize) -> Result<&'a [u8], ProtocolError> {
        let end = self.pos.checked_add(n).filter(|&end| end <= self.buf.len());
        match end {
            Some(end) => {
                let slice = &self.buf[self.pos..end];
                self.pos = end;
                Ok(slice)
            }
            None => Err(ProtocolError::TruncatedPayload {
                kind: self.kind,
                needed: self.pos.saturating_add(n),
                available: self.buf.len(),
            }),
        }
    }

    /// Reads `count` records of `record_size` bytes, guarding the multiplication.
    pub(crate) fn records(
        &mut self,
        count: usize,
        record_size: usize,
    ) -> Result<&'a [u8], ProtocolError> {
        let total = count.checked_mul(record_size).unwrap_or(usize::MAX);
        self.bytes(total)
    }

    pub(crate) fn skip(&mut self, n: usize) -> Result<(), ProtocolError> {
        self.bytes(n).map(|_| ())
    }

    pub(crate) fn u8(&mut self) -> Result<u8, ProtocolError> {
        Ok(self.bytes(1)?[0])
    }

    pub(crate) fn bool(&mut self) -> Result<bool, ProtocolError> {
        Ok(self.u8()? != 0)
    }

    pub(crate) fn bool32(&mut self) -> Result<bool, ProtocolError> {
        Ok(self.u32()? != 0)
    }

    pub(crate) fn u16(&mut self) -> Result<u16, ProtocolError> {
        let b = self.bytes(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub(crate) fn u32(&mut self) -> Result<u32, ProtocolError> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    pub(crate) fn i32(&mut self) -> Result<i32, ProtocolError> {
        Ok(i32::from_le_bytes(self.array()?))
    }

    pub(crate) fn f32(&mut self) -> Result<f32, ProtocolError> {
        Ok(f32::from_le_bytes(self.array()?))
    }

    pub(crate) fn fixed_str(&mut self, capacity: usize) -> Result<String, ProtocolError> {
        Ok(read_fixed_str(self.bytes(capacity)?))
    }

    /// Everything not yet consumed.
    pub(crate) fn rest(&mut self) -> &'a [u8] {
        let rest = &self.buf[self.pos..];
        self.pos = self.buf.len();
        rest
    }

    fn array(&mut self) -> Result<[u8; 4], ProtocolError> {
        let b = self.bytes(4)?;
        Ok([b[0], b[1], b[2], b[3]])
    }
}
