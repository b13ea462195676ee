use std::{str::FromStr, time::Duration};

use crate::{error::InvalidAddress, protocol::DEFAULT_PROTOCOL_VERSION};

/// The default port of a Java edition server.
pub const DEFAULT_PORT: u16 = 25565;

/// Used for both the connect and the read timeout unless overridden.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// The server to query and how to query it.
///
/// # Examples
///
/// ```
/// use slping::Target;
/// use std::time::Duration;
///
/// let target = Target::new("mc.example.org", 25565).with_timeout(Duration::from_secs(2));
/// let parsed: Target = "mc.example.org".parse()?;
/// assert_eq!(parsed.port, 25565);
/// # Ok::<(), slping::InvalidAddress>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target {
    /// Hostname or IP literal. Also sent verbatim in the handshake.
    pub host: String,
    pub port: u16,
    /// The version announced in the handshake.
    pub protocol_version: i32,
    /// Bounds the connect, and every read and write after it.
    pub timeout: Duration,
}

impl Default for Target {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_PORT,
            protocol_version: DEFAULT_PROTOCOL_VERSION,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl Target {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub const fn with_protocol_version(mut self, protocol_version: i32) -> Self {
        self.protocol_version = protocol_version;
        self
    }
}

impl FromStr for Target {
    type Err = InvalidAddress;

    /// Accepts `host`, `host:port`, `[v6]`, `[v6]:port` and bare IPv6 literals.
    fn from_str(address: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidAddress(address.to_owned());

        let (host, port) = if let Some(rest) = address.strip_prefix('[') {
            let (host, rest) = rest.split_once(']').ok_or_else(invalid)?;
            match rest {
                "" => (host, None),
                _ => (host, Some(rest.strip_prefix(':').ok_or_else(invalid)?)),
            }
        } else {
            match address.rsplit_once(':') {
                // more than one colon and no brackets: an IPv6 literal
                Some((host, _)) if host.contains(':') => (address, None),
                Some((host, port)) => (host, Some(port)),
                None => (address, None),
            }
        };

        if host.is_empty() {
            return Err(invalid());
        }
        let port = match port {
            Some(port) => port.parse().map_err(|_| invalid())?,
            None => DEFAULT_PORT,
        };
        Ok(Self::new(host, port))
    }
}
