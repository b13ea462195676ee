//! The protocol's variable-length integer: seven data bits per byte, least
//! significant group first, high bit set on every byte but the last.

use crate::error::ProtocolError;

const SEGMENT_BITS: u8 = 0x7F;
const CONTINUE_BIT: u8 = 0x80;

/// A 32-bit value never needs more than five bytes.
pub const MAX_LEN: usize = 5;

/// Encodes `value` into a freshly allocated buffer.
#[must_use]
pub fn encode(value: u32) -> Vec<u8> {
    let mut buf = Vec::with_capacity(MAX_LEN);
    write(&mut buf, value);
    buf
}

/// Appends the encoding of `value` to `buf`.
pub fn write(buf: &mut Vec<u8>, mut value: u32) {
    loop {
        #[allow(clippy::cast_possible_truncation)]
        let byte = (value as u8) & SEGMENT_BITS;
        value >>= 7;
        if value == 0 {
            buf.push(byte);
            return;
        }
        buf.push(byte | CONTINUE_BIT);
    }
}

/// Signed protocol fields (packet ids, protocol version) travel as their
/// two's complement bit pattern.
#[allow(clippy::cast_sign_loss)]
pub const fn from_signed(value: i32) -> u32 {
    value as u32
}

#[allow(clippy::cast_possible_wrap)]
pub const fn to_signed(value: u32) -> i32 {
    value as i32
}

/// Incremental decoder, fed one byte at a time.
///
/// Both the blocking and the async readers drive this, so the five byte
/// limit is enforced in one place no matter where the bytes come from.
#[derive(Debug, Default)]
pub struct Decoder {
    value: u32,
    len: usize,
}

impl Decoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds the next byte. Returns the value once the terminating byte is seen.
    ///
    /// # Errors
    /// [`ProtocolError::VarIntTooLong`] if the fifth byte still has its
    /// continuation bit set. No sixth byte is ever requested.
    pub fn push(&mut self, byte: u8) -> Result<Option<u32>, ProtocolError> {
        self.value |= u32::from(byte & SEGMENT_BITS) << (7 * self.len);
        self.len += 1;
        if byte & CONTINUE_BIT == 0 {
            return Ok(Some(self.value));
        }
        if self.len == MAX_LEN {
            return Err(ProtocolError::VarIntTooLong);
        }
        Ok(None)
    }
}

/// Decodes a varint from a source of bytes.
///
/// # Errors
/// [`ProtocolError::UnexpectedEof`] if the source runs dry before the value
/// terminates, [`ProtocolError::VarIntTooLong`] past five bytes.
pub fn decode<I: IntoIterator<Item = u8>>(source: I) -> Result<u32, ProtocolError> {
    let mut decoder = Decoder::new();
    for byte in source {
        if let Some(value) = decoder.push(byte)? {
            return Ok(value);
        }
    }
    Err(ProtocolError::UnexpectedEof)
}
