//! The status half of the handshake protocol.
//! [Server List Ping](https://wiki.vg/Server_List_Ping)

use std::{
    io::{Read, Write},
    time::{Duration, Instant},
};

use crate::{
    Target,
    error::{Error, ProtocolError},
    packet::{self, Packet, Reader},
    varint,
};

/// Protocol version announced in the handshake (1.19.4).
///
/// Servers answer a status request regardless of the version a client
/// claims, so this only matters to servers that tailor their reply.
pub const DEFAULT_PROTOCOL_VERSION: i32 = 762;

pub const HANDSHAKE_ID: i32 = 0x00;
pub const STATUS_REQUEST_ID: i32 = 0x00;
pub const STATUS_RESPONSE_ID: i32 = 0x00;

/// `next_state` value asking the server to switch to the status state.
pub const NEXT_STATE_STATUS: i32 = 1;

/// First packet of every connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake<'a> {
    pub protocol_version: i32,
    pub host: &'a str,
    pub port: u16,
    pub next_state: i32,
}

impl<'a> Handshake<'a> {
    #[must_use]
    pub const fn status(protocol_version: i32, host: &'a str, port: u16) -> Self {
        Self {
            protocol_version,
            host,
            port,
            next_state: NEXT_STATE_STATUS,
        }
    }

    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut payload = varint::encode(varint::from_signed(self.protocol_version));
        packet::write_string(&mut payload, self.host);
        payload.extend_from_slice(&self.port.to_be_bytes());
        varint::write(&mut payload, varint::from_signed(self.next_state));
        packet::build(HANDSHAKE_ID, &payload)
    }
}

/// Asks for the status document. Carries no fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusRequest;

impl StatusRequest {
    #[must_use]
    pub fn to_bytes(self) -> Vec<u8> {
        packet::build(STATUS_REQUEST_ID, &[])
    }
}

/// The server's answer: a single length-prefixed JSON string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusResponse {
    pub json: String,
}

impl TryFrom<Packet> for StatusResponse {
    type Error = ProtocolError;

    fn try_from(packet: Packet) -> Result<Self, Self::Error> {
        if packet.id != STATUS_RESPONSE_ID {
            return Err(ProtocolError::UnexpectedPacket {
                expected: STATUS_RESPONSE_ID,
                found: packet.id,
            });
        }
        let mut reader = Reader::new(&packet.payload);
        let json = reader.read_string()?.to_owned();
        if !reader.remaining().is_empty() {
            trace!(
                trailing = reader.remaining().len(),
                "ignoring bytes after status json"
            );
        }
        Ok(Self { json })
    }
}

/// Runs the status exchange over an already connected blocking stream.
///
/// Writes the handshake and the status request, then reads exactly one
/// frame back. Returns the raw status JSON together with the time between
/// sending the request and holding the complete response.
///
/// # Errors
/// Whatever the stream or the framing fails with, or
/// [`ProtocolError::UnexpectedPacket`] if the reply is not a status response.
pub fn exchange<S: Read + Write>(
    stream: &mut S,
    target: &Target,
) -> Result<(String, Duration), Error> {
    let handshake = Handshake::status(target.protocol_version, &target.host, target.port);
    stream.write_all(&handshake.to_bytes())?;

    let sent = Instant::now();
    stream.write_all(&StatusRequest.to_bytes())?;
    stream.flush()?;

    let packet = packet::read(stream)?;
    trace!(id = packet.id, len = packet.payload.len(), "received status frame");
    let response = StatusResponse::try_from(packet)?;
    Ok((response.json, sent.elapsed()))
}
