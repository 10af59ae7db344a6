//! Config schema types (whatsapp, bridge, database, export).

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MxwaConfig {
    pub whatsapp: WhatsAppConfig,
    pub bridge: BridgeConfig,
    pub database: DatabaseConfig,
    pub export: ExportConfig,
}

/// How the bridge presents itself to WhatsApp as a companion device.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WhatsAppConfig {
    /// Device name shown in the phone's "Linked devices" list.
    pub os_name: String,
    /// Browser/platform name; mapped onto WhatsApp's platform type enum.
    pub browser_name: String,
    /// Directory holding one protocol session database per paired device.
    pub session_dir: String,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            os_name: "mxwa bridge".into(),
            browser_name: "unknown".into(),
            session_dir: "whatsapp_session".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Ghost display name template, e.g. `{{or .BusinessName .PushName .Phone}} (WA)`.
    pub displayname_template: String,
    /// Prefix for chat commands in management and portal rooms.
    pub command_prefix: String,
    pub history_sync: HistorySyncConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            displayname_template: "{{or .BusinessName .PushName .Phone}} (WA)".into(),
            command_prefix: "!wa".into(),
            history_sync: HistorySyncConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HistorySyncConfig {
    /// Ask the phone for a full history sync on login instead of the recent one.
    pub request_full_sync: bool,
    pub full_sync_config: FullSyncConfig,
}

/// Limits for a full history sync. Only sent when all three are non-zero.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FullSyncConfig {
    pub days_limit: u32,
    /// Megabytes.
    pub size_limit: u32,
    /// Megabytes.
    pub storage_quota: u32,
}

impl FullSyncConfig {
    pub fn is_complete(&self) -> bool {
        self.days_limit > 0 && self.size_limit > 0 && self.storage_quota > 0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite connection URL shared by the bridge and the device store.
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://mxwa.db?mode=rwc".into(),
        }
    }
}

/// Where `list-groups` sends the group list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub endpoint: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_secs: 30,
        }
    }
}
