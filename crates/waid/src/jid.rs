//! WhatsApp addresses.
//!
//! Parsing and formatting come from `wacore_binary`; this module only adds
//! the server classification the connector dispatches on and a few
//! constructors.

use std::{fmt, str::FromStr};

pub use wacore_binary::jid::{Jid, JidExt};

/// Error returned when a string is not a valid JID.
pub type JidParseError = <Jid as FromStr>::Err;

const STATUS_BROADCAST_USER: &str = "status";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Server {
    #[default]
    DefaultUser,
    Group,
    Broadcast,
    Newsletter,
    HiddenUser,
    Legacy,
    Other(String),
}

impl Server {
    pub fn of(jid: &Jid) -> Self {
        if jid.is_group() {
            return Self::Group;
        }
        Self::from(jid.server.as_str())
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::DefaultUser => "s.whatsapp.net",
            Self::Group => "g.us",
            Self::Broadcast => "broadcast",
            Self::Newsletter => "newsletter",
            Self::HiddenUser => "lid",
            Self::Legacy => "c.us",
            Self::Other(s) => s,
        }
    }
}

impl From<&str> for Server {
    fn from(s: &str) -> Self {
        match s {
            "s.whatsapp.net" => Self::DefaultUser,
            "g.us" => Self::Group,
            "broadcast" => Self::Broadcast,
            "newsletter" => Self::Newsletter,
            "lid" => Self::HiddenUser,
            "c.us" => Self::Legacy,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn new_jid(user: &str, server: &Server) -> Jid {
    Jid::new(user, server.as_str())
}

/// Address of a specific device of a user on the default server.
pub fn device_jid(user: &str, agent: u8, device: u16) -> Jid {
    let mut jid = new_jid(user, &Server::DefaultUser);
    jid.agent = agent;
    jid.device = device;
    jid
}

pub fn status_broadcast_jid() -> Jid {
    new_jid(STATUS_BROADCAST_USER, &Server::Broadcast)
}

pub fn is_status_broadcast(jid: &Jid) -> bool {
    Server::of(jid) == Server::Broadcast && jid.user == STATUS_BROADCAST_USER
}

/// Serde adapter storing a JID in its string form.
pub mod serde_str {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::Jid;

    pub fn serialize<S: Serializer>(jid: &Jid, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(jid)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Jid, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
