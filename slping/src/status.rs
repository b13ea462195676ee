//! The status snapshot and the JSON extraction behind it.

use std::{fmt, time::Duration};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ParseError;

/// Information about the server's version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Version {
    /// The name of the version the server is running.
    ///
    /// In practice this comes in a large variety of different formats.
    pub name: String,
    /// See [Protocol Version Numbers](https://wiki.vg/Protocol_version_numbers).
    /// `-1` when unknown.
    pub protocol: i32,
}

impl Default for Version {
    fn default() -> Self {
        Self {
            name: String::new(),
            protocol: -1,
        }
    }
}

/// An online player of the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Player {
    pub name: String,
    /// The player's UUID, as the server wrote it. Empty when missing.
    pub id: String,
}

/// The stats for players on the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Players {
    pub online: i32,
    pub max: i32,
    /// A preview of which players are online.
    ///
    /// In practice servers often don't send this or use it for more advertising.
    pub sample: Vec<Player>,
}

/// An immutable snapshot of one status query.
///
/// When [`is_online`](Self::is_online) is false every other field except
/// `host` and `port` holds its default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerStatus {
    online: bool,
    host: String,
    port: u16,
    motd: String,
    players: Players,
    version: Version,
    favicon: String,
    raw_payload: String,
    latency: Option<Duration>,
}

impl ServerStatus {
    pub fn offline(host: impl Into<String>, port: u16) -> Self {
        Self {
            online: false,
            host: host.into(),
            port,
            motd: String::new(),
            players: Players::default(),
            version: Version::default(),
            favicon: String::new(),
            raw_payload: String::new(),
            latency: None,
        }
    }

    /// Builds an online status from the raw status JSON.
    ///
    /// Only the top level is strict. Each field below it falls back to its
    /// default on its own when missing or of the wrong shape.
    ///
    /// # Errors
    /// [`ParseError::Json`] if the payload is not JSON,
    /// [`ParseError::NotAnObject`] if it is JSON but not an object.
    pub fn parse(
        host: impl Into<String>,
        port: u16,
        raw_payload: impl Into<String>,
    ) -> Result<Self, ParseError> {
        let raw_payload = raw_payload.into();
        let value: Value = serde_json::from_str(&raw_payload)?;
        let Value::Object(root) = value else {
            return Err(ParseError::NotAnObject);
        };

        let players = root.get("players");
        let version = root.get("version");
        Ok(Self {
            online: true,
            host: host.into(),
            port,
            motd: root.get("description").map(motd).unwrap_or_default(),
            players: Players {
                online: int_field(players, "online").unwrap_or(0),
                max: int_field(players, "max").unwrap_or(0),
                sample: sample(players),
            },
            version: Version {
                name: str_field(version, "name").unwrap_or_default(),
                protocol: int_field(version, "protocol").unwrap_or(-1),
            },
            favicon: root
                .get("favicon")
                .and_then(Value::as_str)
                .map(ToOwned::to_owned)
                .unwrap_or_default(),
            raw_payload,
            latency: None,
        })
    }

    pub(crate) const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    #[must_use]
    pub const fn is_online(&self) -> bool {
        self.online
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// The message of the day, flattened to plain text.
    #[must_use]
    pub fn motd(&self) -> &str {
        &self.motd
    }

    #[must_use]
    pub const fn players(&self) -> &Players {
        &self.players
    }

    #[must_use]
    pub const fn version(&self) -> &Version {
        &self.version
    }

    /// The server icon as sent, usually a `data:image/png;base64,` URI.
    #[must_use]
    pub fn favicon(&self) -> &str {
        &self.favicon
    }

    /// Decodes the favicon's base64 body, if there is a valid one.
    #[must_use]
    pub fn favicon_bytes(&self) -> Option<Vec<u8>> {
        if self.favicon.is_empty() {
            return None;
        }
        let encoded = self
            .favicon
            .split_once(";base64,")
            .map_or(self.favicon.as_str(), |(_, body)| body);
        // some servers wrap the base64 at 76 columns
        let encoded: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
        STANDARD.decode(encoded).ok()
    }

    /// The undecoded status JSON, for fields not modelled here.
    #[must_use]
    pub fn raw_payload(&self) -> &str {
        &self.raw_payload
    }

    /// Time between sending the status request and receiving the full reply.
    #[must_use]
    pub const fn latency(&self) -> Option<Duration> {
        self.latency
    }

    /// Names from the player sample, in the order the server sent them.
    pub fn player_names(&self) -> impl Iterator<Item = &str> {
        self.players.sample.iter().map(|player| player.name.as_str())
    }

    /// Looks a player up in the sample, ignoring ASCII case.
    ///
    /// Only the sample is searched, so a player that is online but not in the
    /// preview the server chose to send is not found.
    #[must_use]
    pub fn find_player(&self, name: &str) -> Option<&Player> {
        self.players
            .sample
            .iter()
            .find(|player| player.name.eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.online {
            return write!(f, "Server {}:{} is offline", self.host, self.port);
        }
        writeln!(f, "Server: {}:{}", self.host, self.port)?;
        writeln!(f, "Version: {}", self.version.name)?;
        writeln!(f, "Players: {}/{}", self.players.online, self.players.max)?;
        write!(f, "MOTD: {}", self.motd)
    }
}

/// A description is either a plain string or a chat component. Components
/// contribute their `text` followed by their `extra` children; anything else
/// contributes nothing.
fn motd(description: &Value) -> String {
    let mut out = String::new();
    match description {
        Value::String(text) => out.push_str(text),
        Value::Object(component) => flatten_component(component, &mut out),
        _ => {}
    }
    out
}

fn flatten_component(component: &Map<String, Value>, out: &mut String) {
    if let Some(Value::String(text)) = component.get("text") {
        out.push_str(text);
    }
    let Some(Value::Array(extra)) = component.get("extra") else {
        return;
    };
    for child in extra {
        match child {
            Value::String(text) => out.push_str(text),
            Value::Object(child) => flatten_component(child, out),
            _ => {}
        }
    }
}

fn int_field(parent: Option<&Value>, key: &str) -> Option<i32> {
    let value = parent?.get(key)?.as_i64()?;
    i32::try_from(value).ok()
}

fn str_field(parent: Option<&Value>, key: &str) -> Option<String> {
    parent?.get(key)?.as_str().map(ToOwned::to_owned)
}

/// Entries without a string `name` are skipped; the rest of the list is kept.
/// An `id` that is missing or not a string becomes empty.
fn sample(players: Option<&Value>) -> Vec<Player> {
    let Some(entries) = players
        .and_then(|players| players.get("sample"))
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };
    entries
        .iter()
        .filter_map(|entry| {
            let Some(name) = entry.get("name").and_then(Value::as_str) else {
                debug!(%entry, "skipping player sample entry without a name");
                return None;
            };
            Some(Player {
                name: name.to_owned(),
                id: str_field(Some(entry), "id").unwrap_or_default(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> ServerStatus {
        ServerStatus::parse("localhost", 25565, json).unwrap()
    }

    #[test]
    fn full_document() {
        let status = parse(
            r#"{"description":"A server","players":{"online":5,"max":20,"sample":[{"name":"Alex","id":"uuid-1"}]},"version":{"name":"1.20.1","protocol":763},"favicon":"data:image/png;base64,iVBORw0KGgo="}"#,
        );
        assert!(status.is_online());
        assert_eq!(status.motd(), "A server");
        assert_eq!(status.players().online, 5);
        assert_eq!(status.players().max, 20);
        assert_eq!(
            status.players().sample,
            [Player {
                name: "Alex".into(),
                id: "uuid-1".into()
            }]
        );
        assert_eq!(status.version().name, "1.20.1");
        assert_eq!(status.version().protocol, 763);
        assert_eq!(status.favicon(), "data:image/png;base64,iVBORw0KGgo=");
        assert_eq!(status.latency(), None);
    }

    #[test]
    fn motd_shapes() {
        assert_eq!(parse(r#"{"description":"Plain text"}"#).motd(), "Plain text");
        assert_eq!(parse(r#"{"description":{"text":"Rich text"}}"#).motd(), "Rich text");
        assert_eq!(parse(r#"{"description":{}}"#).motd(), "");
        assert_eq!(parse(r#"{"description":42}"#).motd(), "");
        assert_eq!(parse(r#"{"description":["a","b"]}"#).motd(), "");
        assert_eq!(parse(r"{}").motd(), "");
    }

    #[test]
    fn motd_extra_components() {
        let status = parse(
            r#"{"description":{"text":"Hello ","extra":[{"text":"big","extra":[" wide"]}," world",7]}}"#,
        );
        assert_eq!(status.motd(), "Hello big wide world");
    }

    #[test]
    fn missing_text_keeps_other_fields() {
        let status = parse(r#"{"description":{},"players":{"online":3,"max":10}}"#);
        assert_eq!(status.motd(), "");
        assert_eq!(status.players().online, 3);
        assert_eq!(status.players().max, 10);
    }

    #[test]
    fn fields_default_independently() {
        let status = parse(
            r#"{"players":{"online":"lots","max":20},"version":{"name":7,"protocol":763},"favicon":false}"#,
        );
        assert_eq!(status.players().online, 0);
        assert_eq!(status.players().max, 20);
        assert_eq!(status.version().name, "");
        assert_eq!(status.version().protocol, 763);
        assert_eq!(status.favicon(), "");
    }

    #[test]
    fn empty_object_defaults() {
        let status = parse("{}");
        assert!(status.is_online());
        assert_eq!(status.players(), &Players::default());
        assert_eq!(status.version().protocol, -1);
        assert_eq!(status.version().name, "");
        assert_eq!(status.raw_payload(), "{}");
    }

    #[test]
    fn out_of_range_numbers_default() {
        let status = parse(r#"{"players":{"online":1e3,"max":4294967296},"version":{"protocol":-5}}"#);
        assert_eq!(status.players().online, 0);
        assert_eq!(status.players().max, 0);
        assert_eq!(status.version().protocol, -5);
    }

    #[test]
    fn malformed_sample_entries_are_skipped() {
        let status = parse(
            r#"{"players":{"online":3,"max":3,"sample":[{"name":"Alex","id":"1"},{"id":"2"},"Steve",{"name":"Notch"},{"name":5}]}}"#,
        );
        assert_eq!(status.player_names().collect::<Vec<_>>(), ["Alex", "Notch"]);
        assert_eq!(status.players().sample[1].id, "");
    }

    #[test]
    fn sample_id_of_wrong_type_keeps_name() {
        let status = parse(
            r#"{"players":{"sample":[{"name":"Alex","id":123},{"name":"Steve","id":null}]}}"#,
        );
        assert_eq!(
            status.players().sample,
            [
                Player {
                    name: "Alex".into(),
                    id: String::new()
                },
                Player {
                    name: "Steve".into(),
                    id: String::new()
                },
            ]
        );
    }

    #[test]
    fn find_player_ignores_case() {
        let status = parse(
            r#"{"players":{"sample":[{"name":"Alex","id":"1"},{"name":"Notch","id":"2"}]}}"#,
        );
        assert_eq!(status.find_player("notch").map(|p| p.id.as_str()), Some("2"));
        assert_eq!(status.find_player("ALEX").map(|p| p.id.as_str()), Some("1"));
        assert_eq!(status.find_player("Steve"), None);
        assert_eq!(ServerStatus::offline("localhost", 25565).find_player("Alex"), None);
    }

    #[test]
    fn sample_of_wrong_type() {
        let status = parse(r#"{"players":{"sample":{"name":"Alex"}}}"#);
        assert!(status.players().sample.is_empty());
    }

    #[test]
    fn rejects_non_json() {
        let error = ServerStatus::parse("localhost", 25565, "not json").unwrap_err();
        assert!(matches!(error, ParseError::Json(_)));
    }

    #[test]
    fn rejects_non_object() {
        for json in ["[]", "\"text\"", "null", "5"] {
            let error = ServerStatus::parse("localhost", 25565, json).unwrap_err();
            assert!(matches!(error, ParseError::NotAnObject), "{json}");
        }
    }

    #[test]
    fn offline_defaults() {
        let status = ServerStatus::offline("example.com", 25566);
        assert!(!status.is_online());
        assert_eq!(status.host(), "example.com");
        assert_eq!(status.port(), 25566);
        assert_eq!(status.motd(), "");
        assert_eq!(status.players(), &Players::default());
        assert_eq!(status.version(), &Version::default());
        assert_eq!(status.version().protocol, -1);
        assert_eq!(status.favicon(), "");
        assert_eq!(status.raw_payload(), "");
        assert_eq!(status.latency(), None);
        assert_eq!(status.favicon_bytes(), None);
    }

    #[test]
    fn favicon_decoding() {
        let status = parse(r#"{"favicon":"data:image/png;base64,iVBO\nRw0KGgo="}"#);
        assert_eq!(
            status.favicon_bytes().unwrap(),
            [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]
        );

        let status = parse(r#"{"favicon":"data:image/png;base64,!!!"}"#);
        assert_eq!(status.favicon_bytes(), None);
    }

    #[test]
    fn display() {
        assert_eq!(
            ServerStatus::offline("example.com", 25565).to_string(),
            "Server example.com:25565 is offline"
        );
        let status = parse(
            r#"{"description":"Hi","players":{"online":1,"max":2},"version":{"name":"1.20.1"}}"#,
        );
        assert_eq!(
            status.to_string(),
            "Server: localhost:25565\nVersion: 1.20.1\nPlayers: 1/2\nMOTD: Hi"
        );
    }

    #[test]
    fn latency_is_attached() {
        let status = parse("{}").with_latency(Duration::from_millis(12));
        assert_eq!(status.latency(), Some(Duration::from_millis(12)));
    }
}
