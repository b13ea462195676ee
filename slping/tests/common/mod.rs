#![allow(dead_code)]

use std::{
    io::Write,
    net::{TcpListener, TcpStream},
    thread,
    time::Duration,
};

use slping::packet::{self, Packet};

pub const STATUS_JSON: &str = r#"{"description":"A server","players":{"online":5,"max":20,"sample":[{"name":"Alex","id":"uuid-1"}]},"version":{"name":"1.20.1","protocol":763}}"#;

/// What the mock server does after reading the handshake and the request.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Write these bytes, then close.
    Bytes(Vec<u8>),
    /// Hold the connection open without answering.
    Silent(Duration),
}

/// The two packets the mock server received.
#[derive(Debug)]
pub struct Received {
    pub handshake: Packet,
    pub request: Packet,
}

pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::builder()
        .with_env_var("LOG")
        .from_env_lossy();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

pub fn status_frame(json: &str) -> Vec<u8> {
    let mut payload = Vec::new();
    packet::write_string(&mut payload, json);
    packet::build(0x00, &payload)
}

/// A port nothing is listening on.
pub fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// Accepts a single connection on a background thread.
pub fn serve_once(reply: Reply) -> (u16, thread::JoinHandle<Received>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let received = read_exchange(&mut stream);
        match reply {
            Reply::Bytes(bytes) => stream.write_all(&bytes).unwrap(),
            Reply::Silent(duration) => thread::sleep(duration),
        }
        received
    });
    (port, handle)
}

fn read_exchange(stream: &mut TcpStream) -> Received {
    let handshake = packet::read(stream).unwrap();
    let request = packet::read(stream).unwrap();
    Received { handshake, request }
}

/// Accepts a single connection on a tokio task.
#[cfg(feature = "tokio-runtime")]
pub async fn serve_once_async(reply: Reply) -> (u16, tokio::task::JoinHandle<Received>) {
    use tokio::io::AsyncWriteExt;

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let handle = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let handshake = slping::tokio::read_packet(&mut stream).await.unwrap();
        let request = slping::tokio::read_packet(&mut stream).await.unwrap();
        match reply {
            Reply::Bytes(bytes) => stream.write_all(&bytes).await.unwrap(),
            Reply::Silent(duration) => tokio::time::sleep(duration).await,
        }
        Received { handshake, request }
    });
    (port, handle)
}

/// Checks the handshake a client sent against the target it was given.
pub fn assert_status_handshake(received: &Received, host: &str, port: u16) {
    assert_eq!(
        received.handshake,
        Packet::new(0x00, {
            let mut payload = slping::varint::encode(762);
            packet::write_string(&mut payload, host);
            payload.extend_from_slice(&port.to_be_bytes());
            payload.push(0x01);
            payload
        })
    );
    assert_eq!(received.request, Packet::new(0x00, Vec::new()));
}
