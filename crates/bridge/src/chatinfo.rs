//! Normalized chat description consumed by the bridge to create or update a
//! portal room.

use std::{collections::HashMap, fmt, sync::Arc, time::Duration};

use {
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
};

use crate::networkid::{AvatarId, PortalId, UserId, UserLoginId};

// ── Room shape ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomType {
    Default,
    Dm,
    GroupDm,
    Space,
}

/// Matrix room tag applied to the user's own view of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomTag {
    #[serde(rename = "m.favourite")]
    Favourite,
    #[serde(rename = "m.lowpriority")]
    LowPriority,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Membership {
    Join,
    Invite,
    Leave,
    Ban,
    Knock,
}

/// Event types whose required power level connectors override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "m.room.name")]
    RoomName,
    #[serde(rename = "m.room.avatar")]
    RoomAvatar,
    #[serde(rename = "m.room.topic")]
    RoomTopic,
    #[serde(rename = "m.reaction")]
    Reaction,
    #[serde(rename = "m.room.redaction")]
    Redaction,
}

// ── Mute / disappearing ─────────────────────────────────────────────────────

/// How long the user's view of a room stays muted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutedUntil {
    Unmuted,
    Forever,
    At(DateTime<Utc>),
}

impl MutedUntil {
    /// Build from a unix timestamp, where `0` means not muted and negative
    /// values mean muted forever.
    pub fn from_unix(ts: i64) -> Self {
        match ts {
            0 => Self::Unmuted,
            t if t < 0 => Self::Forever,
            t => DateTime::from_timestamp(t, 0).map_or(Self::Forever, Self::At),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisappearingType {
    #[default]
    None,
    AfterRead,
    AfterSend,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisappearingSetting {
    #[serde(rename = "type")]
    pub kind: DisappearingType,
    pub timer: Duration,
}

impl DisappearingSetting {
    pub fn after_read(timer: Duration) -> Self {
        Self {
            kind: DisappearingType::AfterRead,
            timer,
        }
    }

    /// A zero timer means disappearing messages are off, whatever the type.
    pub fn normalize(self) -> Self {
        if self.timer.is_zero() {
            Self::default()
        } else {
            self
        }
    }
}

/// Settings that only apply to the logged-in user's view of the room.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserLocalPortalInfo {
    pub muted_until: Option<MutedUntil>,
    pub tag: Option<RoomTag>,
}

// ── Avatar ──────────────────────────────────────────────────────────────────

/// Where the bytes of an avatar come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AvatarSource {
    /// Downloadable right away from a media path.
    Direct { direct_path: String },
    /// Only a preview is known; the full metadata of the chat has to be
    /// refetched to learn the full-resolution path.
    NeedsFullFetch { portal_id: PortalId },
    /// Nothing to download.
    Absent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Avatar {
    pub id: AvatarId,
    pub remove: bool,
    pub source: AvatarSource,
}

impl Avatar {
    pub fn remove() -> Self {
        Self {
            id: AvatarId::from("remove"),
            remove: true,
            source: AvatarSource::Absent,
        }
    }
}

// ── Members ─────────────────────────────────────────────────────────────────

/// Who a member is from the bridge's point of view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventSender {
    pub is_from_me: bool,
    pub sender: UserId,
    pub sender_login: Option<UserLoginId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatMember {
    pub event_sender: EventSender,
    pub membership: Option<Membership>,
    pub power_level: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PowerLevelOverrides {
    pub events_default: Option<i32>,
    pub state_default: Option<i32>,
    pub ban: Option<i32>,
    pub events: HashMap<EventType, i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatMemberList {
    /// Whether `member_map` lists every member of the chat.
    pub is_full: bool,
    pub total_member_count: usize,
    pub other_user_id: Option<UserId>,
    pub member_map: HashMap<UserId, ChatMember>,
    pub power_levels: Option<PowerLevelOverrides>,
}

// ── Extra updaters ──────────────────────────────────────────────────────────

type UpdateFn<M> = dyn Fn(&mut M) -> bool + Send + Sync;

/// Deferred updates to connector-owned portal metadata.
///
/// Each updater returns whether it changed anything so the bridge knows
/// whether the portal needs saving.
pub struct ExtraUpdaters<M>(Vec<Arc<UpdateFn<M>>>);

impl<M> ExtraUpdaters<M> {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, f: impl Fn(&mut M) -> bool + Send + Sync + 'static) {
        self.0.push(Arc::new(f));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Run every updater; returns true if any of them reported a change.
    pub fn apply(&self, meta: &mut M) -> bool {
        self.0
            .iter()
            .fold(false, |changed, update| update(meta) || changed)
    }
}

impl<M> Default for ExtraUpdaters<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> Clone for ExtraUpdaters<M> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<M> fmt::Debug for ExtraUpdaters<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ExtraUpdaters").field(&self.len()).finish()
    }
}

// ── Chat info ───────────────────────────────────────────────────────────────

/// Everything the bridge needs to know to create or sync a portal room.
///
/// `M` is the connector's portal metadata type, touched only through
/// `extra_updates`.
#[derive(Debug, Clone)]
pub struct ChatInfo<M> {
    pub name: Option<String>,
    pub topic: Option<String>,
    pub avatar: Option<Avatar>,
    pub members: Option<ChatMemberList>,
    pub room_type: Option<RoomType>,
    pub disappear: Option<DisappearingSetting>,
    pub parent_id: Option<PortalId>,
    pub user_local: Option<UserLocalPortalInfo>,
    pub can_backfill: bool,
    pub extra_updates: ExtraUpdaters<M>,
}

impl<M> Default for ChatInfo<M> {
    fn default() -> Self {
        Self {
            name: None,
            topic: None,
            avatar: None,
            members: None,
            room_type: None,
            disappear: None,
            parent_id: None,
            user_local: None,
            can_backfill: false,
            extra_updates: ExtraUpdaters::new(),
        }
    }
}
