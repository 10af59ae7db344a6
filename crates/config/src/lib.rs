//! Configuration: schema, file discovery with env substitution, and the ghost
//! display name template.

pub mod env_subst;
pub mod loader;
pub mod schema;
pub mod template;

pub use {
    loader::{
        clear_config_dir, config_dir, discover_and_load, find_or_default_config_path, load_config,
        set_config_dir,
    },
    schema::{
        BridgeConfig, DatabaseConfig, ExportConfig, FullSyncConfig, HistorySyncConfig, MxwaConfig,
        WhatsAppConfig,
    },
    template::{DisplaynameParams, DisplaynameTemplate, TemplateError},
};
