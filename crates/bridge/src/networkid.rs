//! Opaque identifiers shared between the bridge and network connectors.
//!
//! Connectors decide what goes inside each id; the bridge only compares,
//! stores and prints them.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! network_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

network_id!(
    /// Remote user (ghost) identifier.
    UserId
);
network_id!(
    /// Remote chat identifier backing a portal room.
    PortalId
);
network_id!(
    /// Identifier of one logged-in remote account.
    UserLoginId
);
network_id!(
    /// Remote message identifier.
    MessageId
);
network_id!(
    /// Stable avatar identifier used to skip redundant re-uploads.
    AvatarId
);
network_id!(
    /// Matrix event id (`$...`).
    EventId
);
