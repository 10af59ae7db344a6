//! Contracts of the WhatsApp protocol library the connector drives.

use std::sync::Arc;

use {anyhow::Result, async_trait::async_trait, mxwa_waid::Jid};

use crate::{
    device_store::Device,
    props::DeviceProps,
    types::{ChatSettings, ContactInfo, GroupInfo, NewsletterMetadata, WaVersion},
};

/// One connected WhatsApp multi-device session.
#[async_trait]
pub trait WaClient: Send + Sync {
    async fn connect(&self) -> Result<()>;

    fn is_logged_in(&self) -> bool;

    async fn get_group_info(&self, jid: &Jid) -> Result<GroupInfo>;

    /// All groups the account is currently a member of.
    async fn get_joined_groups(&self) -> Result<Vec<GroupInfo>>;

    async fn get_newsletter_info(&self, jid: &Jid) -> Result<NewsletterMetadata>;

    async fn download_media_with_path(&self, direct_path: &str) -> Result<Vec<u8>>;

    async fn join_group_with_invite(
        &self,
        group: &Jid,
        inviter: &Jid,
        code: &str,
        expiration: i64,
    ) -> Result<()>;

    /// Locally stored chat settings; `None` when nothing is stored for the chat.
    async fn get_chat_settings(&self, chat: &Jid) -> Result<Option<ChatSettings>>;

    async fn get_contact(&self, jid: &Jid) -> Result<Option<ContactInfo>>;
}

/// Process-wide entry point of the protocol library.
#[async_trait]
pub trait ProtocolRuntime: Send + Sync {
    /// Construct a client for a stored device. Does not connect.
    fn new_client(&self, device: &Device, props: &DeviceProps, version: WaVersion)
    -> Arc<dyn WaClient>;

    /// Ask WhatsApp for the current web client version.
    async fn latest_version(&self) -> Result<WaVersion>;
}
