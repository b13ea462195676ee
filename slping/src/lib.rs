#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
//! `slping` queries Minecraft Java edition servers for their public status
//! using the [Server List Ping](https://wiki.vg/Server_List_Ping) exchange:
//! a handshake, a status request, and a single JSON document in reply.
//!
//! The reply is turned into a [`ServerStatus`] snapshot with the MOTD,
//! player counts and sample, version and favicon. Fields the server leaves
//! out or sends in an unexpected shape fall back to defaults one by one.
//!
//! The main API surface is [`ping`], which never fails: an unreachable or
//! misbehaving server is reported as an offline status. [`get_status`] is the
//! same query with the failure kept as an [`Error`]. An async implementation
//! on top of the tokio runtime lives in [`tokio`] (feature `tokio-runtime`,
//! on by default).
//!
//! ```no_run
//! use slping::Target;
//!
//! let status = slping::ping(&Target::new("mc.example.org", 25565));
//! println!("{status}");
//! ```

#[macro_use]
extern crate tracing;

#[cfg(feature = "tokio-runtime")]
pub mod tokio;

pub mod packet;
pub mod protocol;
pub mod varint;

mod client;
mod error;
mod status;
mod target;

pub use client::{get_status, ping};
pub use error::{ConnectionError, Error, InvalidAddress, ParseError, ProtocolError};
pub use status::{Player, Players, ServerStatus, Version};
pub use target::{DEFAULT_PORT, DEFAULT_TIMEOUT, Target};
