//! Blocking client on top of `std::net`.

use std::{
    net::{Shutdown, TcpStream, ToSocketAddrs},
    time::Instant,
};

use crate::{
    ServerStatus, Target,
    error::{ConnectionError, Error},
    protocol,
};

/// Queries a server, reporting every failure as an offline status.
///
/// Blocks for at most the target's timeout while connecting, and again for at
/// most that long on each read or write. The failure itself is logged at
/// `debug` level; use [`get_status`] to handle it.
///
/// Name resolution goes through the system resolver before the timeout
/// starts, so a slow resolver can hold this call past the target's timeout.
/// The async `tokio::ping` bounds resolution too.
///
/// # Examples
///
/// ```no_run
/// let status = slping::ping(&slping::Target::new("mc.example.org", 25565));
/// if status.is_online() {
///     println!("{}/{} players", status.players().online, status.players().max);
/// }
/// ```
#[must_use]
pub fn ping(target: &Target) -> ServerStatus {
    get_status(target).unwrap_or_else(|error| {
        debug!(host = %target.host, port = target.port, %error, "server is offline");
        ServerStatus::offline(target.host.as_str(), target.port)
    })
}

/// Queries a server.
///
/// The connection is closed before this returns, on every path.
///
/// # Errors
/// A [`ConnectionError`] if the server cannot be reached or stops answering
/// in time, a [`ProtocolError`](crate::ProtocolError) if the exchange is
/// malformed, a [`ParseError`](crate::ParseError) if the status is not a JSON
/// object.
pub fn get_status(target: &Target) -> Result<ServerStatus, Error> {
    let mut stream = connect(target)?;
    let (json, latency) = protocol::exchange(&mut stream, target)?;
    if let Err(error) = stream.shutdown(Shutdown::Both) {
        trace!(%error, "shutdown after status exchange failed");
    }
    drop(stream);

    Ok(ServerStatus::parse(target.host.as_str(), target.port, json)?.with_latency(latency))
}

/// Tries each resolved address in turn until one accepts, all within a single
/// timeout budget. Resolving is not covered by that budget.
fn connect(target: &Target) -> Result<TcpStream, Error> {
    let addrs = (target.host.as_str(), target.port)
        .to_socket_addrs()
        .map_err(ConnectionError::Resolve)?;

    let deadline = Instant::now() + target.timeout;
    let mut last_error = None;
    for addr in addrs {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(ConnectionError::TimedOut.into());
        }
        trace!(%addr, "connecting");
        match TcpStream::connect_timeout(&addr, remaining) {
            Ok(stream) => {
                stream.set_read_timeout(Some(target.timeout))?;
                stream.set_write_timeout(Some(target.timeout))?;
                return Ok(stream);
            }
            Err(error) => last_error = Some(error),
        }
    }
    Err(last_error.map_or_else(|| ConnectionError::NoAddress.into(), Error::from))
}
