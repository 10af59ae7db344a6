//! WhatsApp network connector.
//!
//! Translates WhatsApp chats, users and invites into the bridge's shapes and
//! implements the WhatsApp chat commands. The multi-device protocol itself is
//! reached through the [`remote::WaClient`] and [`remote::ProtocolRuntime`]
//! contracts; the `runtime` feature provides an implementation backed by
//! `whatsapp-rust`.

mod avatar;
pub mod chatinfo;
pub mod client;
pub mod commands;
pub mod connector;
pub mod device_store;
pub mod export;
pub mod history_sync;
pub mod props;
pub mod remote;
pub mod types;
pub mod version;
#[cfg(feature = "runtime")]
pub mod wa_runtime;

#[cfg(test)]
mod test_support;

pub use {
    chatinfo::{ChatInfoError, WaChatInfo, apply_history_info},
    client::WhatsAppClient,
    commands::register_commands,
    connector::{BridgeStores, InitError, LoadLoginError, WhatsAppConnector},
    device_store::{Device, DeviceStore, DeviceStoreError},
    export::{ExportError, GroupExporter, GroupSummary, HttpGroupExporter},
    history_sync::{HISTORY_SYNC_COOLDOWN, HistorySyncOutcome},
    props::{DeviceProps, PlatformType},
    remote::{ProtocolRuntime, WaClient},
    types::WaVersion,
    version::{VersionError, WEB_VERSION_URL, fetch_latest_version},
};

#[cfg(feature = "runtime")]
pub use wa_runtime::{RuntimeError, WaRustClient, WaRustRuntime};
