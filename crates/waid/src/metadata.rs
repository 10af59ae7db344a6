//! Connector metadata persisted alongside bridge records.

use {
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
};

use crate::jid::Jid;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserLoginMetadata {
    #[serde(default)]
    pub wa_device_id: u16,
    #[serde(default, with = "chrono::serde::ts_seconds")]
    pub last_history_sync: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalMetadata {
    /// Unix timestamp of the last disappearing-timer change.
    #[serde(default)]
    pub disappearing_timer_set_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupInviteMeta {
    #[serde(with = "crate::jid::serde_str")]
    pub jid: Jid,
    #[serde(with = "crate::jid::serde_str")]
    pub inviter: Jid,
    pub code: String,
    /// Unix timestamp; `0` when the invite carries no expiry.
    #[serde(default)]
    pub expiration: i64,
    #[serde(default)]
    pub group_name: String,
}

impl GroupInviteMeta {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiration > 0 && self.expiration <= now.timestamp()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_invite: Option<GroupInviteMeta>,
}
