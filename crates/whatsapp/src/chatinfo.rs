//! Translation of WhatsApp chats into bridge chat info.

use std::{collections::HashMap, time::Duration};

use {
    async_trait::async_trait,
    mxwa_bridge::{
        Avatar, AvatarSource, ChatInfo, ChatMember, ChatMemberList, DisappearingSetting,
        EventSender, EventType, Membership, MutedUntil, NetworkApi, Portal, PowerLevelOverrides,
        RoomTag, RoomType, UserInfo, UserLocalPortalInfo,
        networkid::{AvatarId, UserId},
    },
    mxwa_waid::{
        Jid, PortalMetadata, Server, is_status_broadcast, make_portal_id, make_user_id,
        parse_portal_id, parse_user_id,
    },
    tracing::warn,
};

use crate::{
    client::WhatsAppClient,
    types::{Conversation, GroupInfo, NewsletterMetadata, NewsletterMuteState, NewsletterRole},
};

pub const STATUS_BROADCAST_TOPIC: &str = "WhatsApp status updates from your contacts";
pub const STATUS_BROADCAST_NAME: &str = "WhatsApp Status Broadcast";
pub const PRIVATE_CHAT_TOPIC: &str = "WhatsApp private chat";

pub const NOBODY_PL: i32 = 99;
pub const SUPER_ADMIN_PL: i32 = 75;
pub const ADMIN_PL: i32 = 50;
pub const DEFAULT_PL: i32 = 0;

pub type WaChatInfo = ChatInfo<PortalMetadata>;

#[derive(Debug, thiserror::Error)]
pub enum ChatInfoError {
    #[error("broadcast list bridging is currently not supported")]
    BroadcastListUnsupported,
    #[error("unsupported server {0}")]
    UnsupportedServer(Server),
    #[error("invalid portal id {portal}: {reason}")]
    InvalidPortalId { portal: String, reason: String },
    #[error(transparent)]
    Remote(#[from] anyhow::Error),
}

impl WhatsAppClient {
    /// Build the chat info for a portal, fetching remote metadata as needed.
    pub async fn fetch_chat_info(
        &self,
        portal: &Portal<PortalMetadata>,
    ) -> Result<WaChatInfo, ChatInfoError> {
        let jid = parse_portal_id(&portal.id).map_err(|e| ChatInfoError::InvalidPortalId {
            portal: portal.id.to_string(),
            reason: e.to_string(),
        })?;
        let mut info = match Server::of(&jid) {
            Server::DefaultUser => self.wrap_dm_info(&jid),
            Server::Broadcast if is_status_broadcast(&jid) => self.wrap_status_broadcast_info(),
            Server::Broadcast => return Err(ChatInfoError::BroadcastListUnsupported),
            Server::Group => {
                let group = self.client.get_group_info(&jid).await?;
                self.wrap_group_info(&group)
            },
            Server::Newsletter => {
                let newsletter = self.client.get_newsletter_info(&jid).await?;
                self.wrap_newsletter_info(&newsletter)
            },
            other => return Err(ChatInfoError::UnsupportedServer(other)),
        };
        apply_history_info(&mut info, None);
        self.apply_chat_settings(&jid, &mut info).await;
        Ok(info)
    }

    pub fn wrap_dm_info(&self, jid: &Jid) -> WaChatInfo {
        let peer = make_user_id(jid);
        let member_map = if *jid == self.jid.to_non_ad() {
            // Chat with self: keep the user's own ghost in the room.
            HashMap::from([
                (peer.clone(), ChatMember {
                    event_sender: EventSender {
                        sender: peer.clone(),
                        ..Default::default()
                    },
                    ..Default::default()
                }),
                (UserId::default(), ChatMember {
                    event_sender: EventSender {
                        is_from_me: true,
                        ..Default::default()
                    },
                    ..Default::default()
                }),
            ])
        } else {
            HashMap::from([
                (peer.clone(), self.member(jid)),
                (make_user_id(&self.jid), self.member(&self.jid)),
            ])
        };

        ChatInfo {
            topic: Some(PRIVATE_CHAT_TOPIC.into()),
            members: Some(ChatMemberList {
                is_full: true,
                total_member_count: 2,
                other_user_id: Some(peer),
                member_map,
                power_levels: None,
            }),
            room_type: Some(RoomType::Dm),
            ..Default::default()
        }
    }

    pub fn wrap_status_broadcast_info(&self) -> WaChatInfo {
        ChatInfo {
            name: Some(STATUS_BROADCAST_NAME.into()),
            topic: Some(STATUS_BROADCAST_TOPIC.into()),
            members: Some(ChatMemberList {
                is_full: false,
                member_map: HashMap::from([(make_user_id(&self.jid), self.member(&self.jid))]),
                ..Default::default()
            }),
            room_type: Some(RoomType::Default),
            can_backfill: false,
            ..Default::default()
        }
    }

    pub fn wrap_group_info(&self, group: &GroupInfo) -> WaChatInfo {
        let send_event_pl = if group.is_announce { ADMIN_PL } else { DEFAULT_PL };
        let meta_change_pl = if group.is_locked { ADMIN_PL } else { DEFAULT_PL };

        let member_map = group
            .participants
            .iter()
            .filter(|p| Server::of(&p.jid) == Server::DefaultUser)
            .map(|p| {
                let power_level = if p.is_super_admin {
                    SUPER_ADMIN_PL
                } else if p.is_admin {
                    ADMIN_PL
                } else {
                    DEFAULT_PL
                };
                (make_user_id(&p.jid), ChatMember {
                    event_sender: self.make_event_sender(&p.jid),
                    membership: Some(Membership::Join),
                    power_level: Some(power_level),
                })
            })
            .collect();

        ChatInfo {
            name: Some(group.name.clone()),
            topic: Some(group.topic.clone()),
            members: Some(ChatMemberList {
                is_full: !group.is_incognito,
                total_member_count: group.participants.len(),
                other_user_id: None,
                member_map,
                power_levels: Some(PowerLevelOverrides {
                    events_default: Some(send_event_pl),
                    state_default: Some(NOBODY_PL),
                    ban: Some(NOBODY_PL),
                    events: event_levels(meta_change_pl),
                }),
            }),
            disappear: Some(
                DisappearingSetting::after_read(Duration::from_secs(u64::from(
                    group.disappearing_timer,
                )))
                .normalize(),
            ),
            parent_id: group.linked_parent_jid.as_ref().map(make_portal_id),
            room_type: Some(if group.is_parent {
                RoomType::Space
            } else {
                RoomType::Default
            }),
            ..Default::default()
        }
    }

    pub fn wrap_newsletter_info(&self, newsletter: &NewsletterMetadata) -> WaChatInfo {
        let mut own_power_level = DEFAULT_PL;
        let mut muted_until = None;
        if let Some(viewer) = &newsletter.viewer_meta {
            own_power_level = match viewer.role {
                NewsletterRole::Admin => ADMIN_PL,
                NewsletterRole::Owner => SUPER_ADMIN_PL,
                NewsletterRole::Subscriber | NewsletterRole::Guest => DEFAULT_PL,
            };
            muted_until = Some(match viewer.mute {
                NewsletterMuteState::On => MutedUntil::Forever,
                NewsletterMuteState::Off => MutedUntil::Unmuted,
            });
        }

        let thread = &newsletter.thread_meta;
        let avatar = if let Some(picture) = &thread.picture {
            Avatar {
                id: AvatarId::new(picture.id.as_str()),
                remove: false,
                source: AvatarSource::Direct {
                    direct_path: picture.direct_path.clone(),
                },
            }
        } else if !thread.preview.id.is_empty() {
            Avatar {
                id: AvatarId::new(thread.preview.id.as_str()),
                remove: false,
                source: AvatarSource::NeedsFullFetch {
                    portal_id: make_portal_id(&newsletter.id),
                },
            }
        } else {
            Avatar::remove()
        };

        let mut own = self.member(&self.jid);
        own.power_level = Some(own_power_level);

        ChatInfo {
            name: Some(thread.name.clone()),
            topic: Some(thread.description.clone()),
            avatar: Some(avatar),
            user_local: Some(UserLocalPortalInfo {
                muted_until,
                tag: None,
            }),
            members: Some(ChatMemberList {
                is_full: false,
                total_member_count: thread.subscriber_count,
                other_user_id: None,
                member_map: HashMap::from([(make_user_id(&self.jid), own)]),
                power_levels: Some(PowerLevelOverrides {
                    events_default: Some(ADMIN_PL),
                    state_default: Some(NOBODY_PL),
                    ban: Some(NOBODY_PL),
                    events: event_levels(ADMIN_PL),
                }),
            }),
            room_type: Some(RoomType::Default),
            ..Default::default()
        }
    }

    /// Overlay the user's locally stored settings (mute, pin, archive).
    pub async fn apply_chat_settings(&self, chat: &Jid, info: &mut WaChatInfo) {
        let settings = match self.client.get_chat_settings(chat).await {
            Ok(Some(settings)) => settings,
            Ok(None) => return,
            Err(e) => {
                warn!(chat = %chat, error = %e, "failed to get chat settings");
                return;
            },
        };
        info.user_local = Some(UserLocalPortalInfo {
            muted_until: Some(
                settings
                    .muted_until
                    .map_or(MutedUntil::Unmuted, |t| MutedUntil::from_unix(t.timestamp())),
            ),
            tag: local_tag(settings.pinned, settings.archived),
        });
    }

    fn member(&self, jid: &Jid) -> ChatMember {
        ChatMember {
            event_sender: self.make_event_sender(jid),
            ..Default::default()
        }
    }
}

/// Merge per-conversation state from a history sync into a chat info.
pub fn apply_history_info(info: &mut WaChatInfo, conv: Option<&Conversation>) {
    let Some(conv) = conv else {
        return;
    };
    info.can_backfill = true;
    info.user_local = Some(UserLocalPortalInfo {
        muted_until: Some(MutedUntil::from_unix(
            i64::try_from(conv.mute_end_time).unwrap_or(i64::MAX),
        )),
        tag: local_tag(conv.pinned > 0, conv.archived),
    });
    if conv.ephemeral_expiration > 0 {
        info.disappear = Some(DisappearingSetting::after_read(Duration::from_secs(
            u64::from(conv.ephemeral_expiration),
        )));
        let set_at = conv.ephemeral_setting_timestamp;
        info.extra_updates.push(move |meta: &mut PortalMetadata| {
            if meta.disappearing_timer_set_at != set_at {
                meta.disappearing_timer_set_at = set_at;
                true
            } else {
                false
            }
        });
    }
}

fn local_tag(pinned: bool, archived: bool) -> Option<RoomTag> {
    if pinned {
        Some(RoomTag::Favourite)
    } else if archived {
        Some(RoomTag::LowPriority)
    } else {
        None
    }
}

fn event_levels(meta_change_pl: i32) -> HashMap<EventType, i32> {
    HashMap::from([
        (EventType::RoomName, meta_change_pl),
        (EventType::RoomAvatar, meta_change_pl),
        (EventType::RoomTopic, meta_change_pl),
        (EventType::Reaction, DEFAULT_PL),
        (EventType::Redaction, DEFAULT_PL),
    ])
}

#[async_trait]
impl NetworkApi for WhatsAppClient {
    type PortalMetadata = PortalMetadata;

    fn is_logged_in(&self) -> bool {
        WhatsAppClient::is_logged_in(self)
    }

    async fn get_chat_info(&self, portal: &Portal<PortalMetadata>) -> anyhow::Result<WaChatInfo> {
        Ok(self.fetch_chat_info(portal).await?)
    }

    async fn get_user_info(&self, ghost: &UserId) -> anyhow::Result<UserInfo> {
        self.user_info_for(&parse_user_id(ghost)).await
    }

    async fn download_avatar(&self, avatar: &Avatar) -> anyhow::Result<Option<Vec<u8>>> {
        self.resolve_avatar(avatar).await
    }
}
