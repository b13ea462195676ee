use std::io;

/// Errors that can occur when querying a server's status.
///
/// Every variant is collapsed into an offline [`ServerStatus`](crate::ServerStatus)
/// by [`ping`](crate::ping); use [`get_status`](crate::get_status) to observe
/// the distinction.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Connection(#[from] ConnectionError),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::UnexpectedEof => ProtocolError::UnexpectedEof.into(),
            // std reports an expired SO_RCVTIMEO as WouldBlock on unix
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => ConnectionError::TimedOut.into(),
            _ => ConnectionError::Io(error).into(),
        }
    }
}

/// The server could not be reached, or stopped responding.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("DNS lookup for the host provided failed: {0}")]
    Resolve(#[source] io::Error),
    #[error("the host provided did not resolve to any address")]
    NoAddress,
    #[error("timed out waiting for the server")]
    TimedOut,
    #[error("an I/O error occurred: {0}")]
    Io(#[source] io::Error),
}

/// The server answered, but not with a well-formed status exchange.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("varint too long")]
    VarIntTooLong,
    #[error("stream ended before the declared length was read")]
    UnexpectedEof,
    #[error("expected packet id {expected:#04x}, found {found:#04x}")]
    UnexpectedPacket { expected: i32, found: i32 },
    #[error("packet length {length} exceeds the maximum of {max}")]
    PacketTooLarge { length: u32, max: u32 },
    #[error("packet has no id")]
    EmptyPacket,
    #[error("string is not valid UTF-8")]
    InvalidUtf8(#[from] std::str::Utf8Error),
}

/// The status payload was framed correctly but is not a usable JSON document.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("a JSON error occurred: {0}")]
    Json(#[from] serde_json::Error),
    #[error("status payload is not a JSON object")]
    NotAnObject,
}

/// A `host[:port]` string that could not be turned into a [`Target`](crate::Target).
#[derive(Debug, thiserror::Error)]
#[error("an invalid address was provided: `{0}`")]
pub struct InvalidAddress(pub String);
