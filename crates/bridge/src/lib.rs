//! Bridge framework contracts.
//!
//! Network connectors (WhatsApp, ...) translate remote chats into the shapes
//! defined here: [`ChatInfo`] for rooms, [`UserInfo`] for ghosts, plus the
//! login/message stores and the chat command processor the bridge drives.

pub mod chatinfo;
pub mod commands;
pub mod error;
pub mod login;
pub mod message;
pub mod networkid;
pub mod portal;

pub use {
    chatinfo::{
        Avatar, AvatarSource, ChatInfo, ChatMember, ChatMemberList, DisappearingSetting,
        DisappearingType, EventSender, EventType, ExtraUpdaters, Membership, MutedUntil,
        PowerLevelOverrides, RoomTag, RoomType, UserLocalPortalInfo,
    },
    error::{DbUpgradeError, StoreError},
    login::{LoginRecord, LoginStore, SqliteLoginStore, UserLogin},
    message::{Message, MessageStore, SqliteMessageStore},
    portal::Portal,
};
use std::sync::Arc;

use {anyhow::Result, async_trait::async_trait};

/// Static description of a bridged network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeName {
    pub display_name: &'static str,
    pub network_url: &'static str,
    pub network_icon: &'static str,
    pub network_id: &'static str,
    pub beeper_bridge_type: &'static str,
    pub default_port: u16,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetworkGeneralCapabilities {
    pub disappearing_messages: bool,
    pub aggressive_update_info: bool,
}

/// Ghost profile information.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserInfo {
    pub name: Option<String>,
    pub identifiers: Vec<String>,
    pub is_bot: Option<bool>,
}

/// Process-wide connector lifecycle, driven by the bridge.
#[async_trait]
pub trait NetworkConnector: Send + Sync {
    type LoginMetadata;
    type Client: NetworkApi;

    fn name(&self) -> BridgeName;

    fn capabilities(&self) -> NetworkGeneralCapabilities;

    /// Upgrade storage and prepare the connector. Called once before any
    /// login is loaded.
    async fn start(&self) -> Result<(), DbUpgradeError>;

    /// Build the network client for a persisted login.
    async fn load_user_login(
        &self,
        login: UserLogin<Self::LoginMetadata>,
    ) -> Result<Arc<Self::Client>>;
}

/// Per-login network client.
#[async_trait]
pub trait NetworkApi: Send + Sync {
    type PortalMetadata;

    fn is_logged_in(&self) -> bool;

    async fn get_chat_info(
        &self,
        portal: &Portal<Self::PortalMetadata>,
    ) -> Result<ChatInfo<Self::PortalMetadata>>;

    /// Profile of a remote user, used for their ghost.
    async fn get_user_info(&self, ghost: &networkid::UserId) -> Result<UserInfo>;

    /// Download the bytes behind an avatar; `None` when there is nothing to
    /// download.
    async fn download_avatar(&self, avatar: &Avatar) -> Result<Option<Vec<u8>>>;
}
