//! Length-prefixed packet framing.
//!
//! A frame is `varint(len(id ++ payload)) ++ varint(id) ++ payload`. Inbound
//! frames are read in two steps: the length prefix straight off the stream,
//! then exactly that many bytes into memory. Everything after that point is
//! parsed through [`Reader`], which cannot run past the frame it was given.

use std::io::Read;

use crate::{
    error::{Error, ProtocolError},
    varint,
};

/// Largest frame body accepted from a peer: the biggest value a three byte
/// varint can hold, which is the protocol's own packet size ceiling.
pub const MAX_PACKET_LENGTH: u32 = 2_097_151;

/// A decoded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub id: i32,
    pub payload: Vec<u8>,
}

impl Packet {
    pub fn new(id: i32, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            id,
            payload: payload.into(),
        }
    }

    /// Serializes the packet with its length prefix.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        build(self.id, &self.payload)
    }

    /// Splits a frame body (everything after the length prefix) into id and payload.
    ///
    /// # Errors
    /// [`ProtocolError::EmptyPacket`] for a zero length body, or whatever the
    /// id varint fails with.
    pub fn from_body(body: &[u8]) -> Result<Self, ProtocolError> {
        if body.is_empty() {
            return Err(ProtocolError::EmptyPacket);
        }
        let mut reader = Reader::new(body);
        let id = varint::to_signed(reader.read_varint()?);
        Ok(Self::new(id, reader.remaining()))
    }
}

/// Builds an outbound frame. The length prefix covers the encoded id too.
#[must_use]
pub fn build(id: i32, payload: &[u8]) -> Vec<u8> {
    let mut body = varint::encode(varint::from_signed(id));
    body.extend_from_slice(payload);

    #[allow(clippy::cast_possible_truncation)]
    let mut frame = varint::encode(body.len() as u32);
    frame.append(&mut body);
    frame
}

/// Validates a declared frame length before anything is allocated for it.
///
/// # Errors
/// [`ProtocolError::PacketTooLarge`] above [`MAX_PACKET_LENGTH`].
pub const fn checked_length(length: u32) -> Result<usize, ProtocolError> {
    if length > MAX_PACKET_LENGTH {
        return Err(ProtocolError::PacketTooLarge {
            length,
            max: MAX_PACKET_LENGTH,
        });
    }
    Ok(length as usize)
}

/// Reads one frame from a blocking byte stream.
///
/// Exactly the declared number of bytes is consumed; anything the peer sent
/// after the frame stays in the stream.
///
/// # Errors
/// Protocol errors for a bad length prefix, a short read or an empty body.
/// I/O failures are classified as described on [`Error`].
pub fn read<R: Read>(reader: &mut R) -> Result<Packet, Error> {
    let mut decoder = varint::Decoder::new();
    let mut byte = [0u8];
    let length = loop {
        reader.read_exact(&mut byte)?;
        if let Some(length) = decoder.push(byte[0])? {
            break length;
        }
    };

    let mut body = vec![0; checked_length(length)?];
    reader.read_exact(&mut body)?;
    trace!(length, "read packet frame");

    Ok(Packet::from_body(&body)?)
}

/// Appends a length-prefixed UTF-8 string.
pub fn write_string(buf: &mut Vec<u8>, value: &str) {
    #[allow(clippy::cast_possible_truncation)]
    let len = value.len() as u32;
    varint::write(buf, len);
    buf.extend_from_slice(value.as_bytes());
}

/// Bounded cursor over an in-memory frame.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    buf: &'a [u8],
}

impl<'a> Reader<'a> {
    #[must_use]
    pub const fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    /// # Errors
    /// [`ProtocolError::UnexpectedEof`] or [`ProtocolError::VarIntTooLong`].
    pub fn read_varint(&mut self) -> Result<u32, ProtocolError> {
        let mut decoder = varint::Decoder::new();
        for (index, &byte) in self.buf.iter().enumerate() {
            if let Some(value) = decoder.push(byte)? {
                self.buf = &self.buf[index + 1..];
                return Ok(value);
            }
        }
        Err(ProtocolError::UnexpectedEof)
    }

    /// # Errors
    /// [`ProtocolError::UnexpectedEof`] if fewer than `len` bytes remain.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], ProtocolError> {
        if self.buf.len() < len {
            return Err(ProtocolError::UnexpectedEof);
        }
        let (head, tail) = self.buf.split_at(len);
        self.buf = tail;
        Ok(head)
    }

    /// Reads a length-prefixed UTF-8 string.
    ///
    /// # Errors
    /// A short read, or [`ProtocolError::InvalidUtf8`].
    pub fn read_string(&mut self) -> Result<&'a str, ProtocolError> {
        let len = self.read_varint()? as usize;
        let bytes = self.read_bytes(len)?;
        Ok(std::str::from_utf8(bytes)?)
    }

    /// Everything not consumed yet.
    #[must_use]
    pub const fn remaining(&self) -> &'a [u8] {
        self.buf
    }
}
