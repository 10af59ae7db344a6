//! Remote-side records as returned by the WhatsApp protocol client.

use std::fmt;

use {
    chrono::{DateTime, Utc},
    mxwa_waid::Jid,
    serde::{Deserialize, Serialize},
};

// ── Groups ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupParticipant {
    pub jid: Jid,
    pub is_admin: bool,
    pub is_super_admin: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupInfo {
    pub jid: Jid,
    pub name: String,
    pub topic: String,
    /// Only admins can send messages.
    pub is_announce: bool,
    /// Only admins can edit the group name, topic and picture.
    pub is_locked: bool,
    /// Participant list is partial (large community announcement groups).
    pub is_incognito: bool,
    /// The group is a community parent.
    pub is_parent: bool,
    pub linked_parent_jid: Option<Jid>,
    /// Seconds; zero when disappearing messages are off.
    pub disappearing_timer: u32,
    pub participants: Vec<GroupParticipant>,
}

// ── Newsletters ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewsletterRole {
    Subscriber,
    Guest,
    Admin,
    Owner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewsletterMuteState {
    On,
    Off,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsletterViewerMeta {
    pub role: NewsletterRole,
    pub mute: NewsletterMuteState,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfilePicture {
    pub id: String,
    pub direct_path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewsletterThreadMeta {
    pub name: String,
    pub description: String,
    pub subscriber_count: usize,
    pub picture: Option<ProfilePicture>,
    pub preview: ProfilePicture,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewsletterMetadata {
    pub id: Jid,
    pub thread_meta: NewsletterThreadMeta,
    pub viewer_meta: Option<NewsletterViewerMeta>,
}

// ── Local state ─────────────────────────────────────────────────────────────

/// Per-chat settings stored on the user's own devices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatSettings {
    pub muted_until: Option<DateTime<Utc>>,
    pub pinned: bool,
    pub archived: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactInfo {
    pub push_name: String,
    pub business_name: String,
    pub full_name: String,
    pub first_name: String,
}

// ── History sync ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistorySyncType {
    InitialBootstrap,
    InitialStatusV3,
    Full,
    Recent,
    PushName,
    NonBlockingData,
    OnDemand,
}

/// One chat from a history sync blob.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversation {
    pub id: String,
    pub name: Option<String>,
    /// Unix seconds; zero when not muted.
    pub mute_end_time: u64,
    /// Pin order; zero when not pinned.
    pub pinned: u32,
    pub archived: bool,
    /// Disappearing timer in seconds.
    pub ephemeral_expiration: u32,
    pub ephemeral_setting_timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistorySync {
    pub sync_type: HistorySyncType,
    pub conversations: Vec<Conversation>,
}

// ── Version ─────────────────────────────────────────────────────────────────

/// WhatsApp web client version announced during the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WaVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl WaVersion {
    /// Used until a fresher version is fetched at startup.
    pub const HARDCODED: Self = Self {
        major: 2,
        minor: 3000,
        patch: 1_023_868_176,
    };
}

impl Default for WaVersion {
    fn default() -> Self {
        Self::HARDCODED
    }
}

impl fmt::Display for WaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}
