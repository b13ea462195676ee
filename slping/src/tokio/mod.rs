//! The same client on the tokio runtime.
//!
//! Each step (connect, every write, the response read) is bounded by the
//! target's timeout. Nothing is spawned: the returned future does all of its
//! work when polled by the caller.

use std::{
    future::Future,
    time::{Duration, Instant},
};

use ::tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
    net::{TcpStream, lookup_host},
    time::timeout,
};

use crate::{
    ServerStatus, Target,
    error::{ConnectionError, Error},
    packet::{self, Packet},
    protocol::{Handshake, StatusRequest, StatusResponse},
    varint,
};

/// Queries a server, reporting every failure as an offline status.
///
/// # Examples
///
/// ```no_run
/// # async {
/// let status = slping::tokio::ping(&slping::Target::new("mc.example.org", 25565)).await;
/// println!("{status}");
/// # };
/// ```
pub async fn ping(target: &Target) -> ServerStatus {
    match get_status(target).await {
        Ok(status) => status,
        Err(error) => {
            debug!(host = %target.host, port = target.port, %error, "server is offline");
            ServerStatus::offline(target.host.as_str(), target.port)
        }
    }
}

/// Queries a server.
///
/// # Errors
/// See [`crate::get_status`].
pub async fn get_status(target: &Target) -> Result<ServerStatus, Error> {
    let mut stream = connect(target).await?;
    let (json, latency) = exchange(&mut stream, target).await?;
    if let Err(error) = stream.shutdown().await {
        trace!(%error, "shutdown after status exchange failed");
    }
    drop(stream);

    Ok(ServerStatus::parse(target.host.as_str(), target.port, json)?.with_latency(latency))
}

/// Runs the status exchange over an already connected stream.
///
/// # Errors
/// See [`crate::protocol::exchange`]. Any step outliving the target's
/// timeout fails with [`ConnectionError::TimedOut`].
pub async fn exchange<S>(stream: &mut S, target: &Target) -> Result<(String, Duration), Error>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let handshake = Handshake::status(target.protocol_version, &target.host, target.port);
    bounded(target.timeout, stream.write_all(&handshake.to_bytes())).await?;

    let sent = Instant::now();
    bounded(target.timeout, stream.write_all(&StatusRequest.to_bytes())).await?;
    bounded(target.timeout, stream.flush()).await?;

    let packet = bounded(target.timeout, read_packet(stream)).await?;
    trace!(id = packet.id, len = packet.payload.len(), "received status frame");
    let response = StatusResponse::try_from(packet)?;
    Ok((response.json, sent.elapsed()))
}

/// # Errors
/// [`ProtocolError::VarIntTooLong`](crate::ProtocolError::VarIntTooLong), or
/// a short read.
pub async fn read_varint<R: AsyncRead + Unpin>(reader: &mut R) -> Result<u32, Error> {
    let mut decoder = varint::Decoder::new();
    loop {
        if let Some(value) = decoder.push(reader.read_u8().await?)? {
            return Ok(value);
        }
    }
}

/// Async counterpart of [`packet::read`].
///
/// # Errors
/// See [`packet::read`].
pub async fn read_packet<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Packet, Error> {
    let length = read_varint(reader).await?;
    let mut body = vec![0; packet::checked_length(length)?];
    reader.read_exact(&mut body).await?;
    trace!(length, "read packet frame");

    Ok(Packet::from_body(&body)?)
}

async fn connect(target: &Target) -> Result<TcpStream, Error> {
    bounded(target.timeout, resolve_and_connect(target)).await
}

async fn resolve_and_connect(target: &Target) -> Result<TcpStream, Error> {
    let addrs = lookup_host((target.host.as_str(), target.port))
        .await
        .map_err(ConnectionError::Resolve)?;

    let mut last_error = None;
    for addr in addrs {
        trace!(%addr, "connecting");
        match TcpStream::connect(addr).await {
            Ok(stream) => return Ok(stream),
            Err(error) => last_error = Some(error),
        }
    }
    Err(last_error.map_or_else(|| ConnectionError::NoAddress.into(), Error::from))
}

async fn bounded<T, E, F>(duration: Duration, future: F) -> Result<T, Error>
where
    F: Future<Output = Result<T, E>>,
    E: Into<Error>,
{
    match timeout(duration, future).await {
        Ok(result) => result.map_err(Into::into),
        Err(_) => Err(ConnectionError::TimedOut.into()),
    }
}
