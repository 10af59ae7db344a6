use std::sync::Arc;

use {
    anyhow::Result,
    mxwa_bridge::{NetworkConnector, SqliteLoginStore, SqliteMessageStore},
    mxwa_config::MxwaConfig,
    mxwa_waid::{MessageMetadata, UserLoginMetadata},
    mxwa_whatsapp::{BridgeStores, HttpGroupExporter, ProtocolRuntime, WhatsAppConnector},
    tracing::info,
};

use crate::migrate;

/// Build the connector, prepare storage and connect every stored login.
pub async fn start_connector(
    config: &MxwaConfig,
    pool: sqlx::SqlitePool,
    runtime: Arc<dyn ProtocolRuntime>,
) -> Result<WhatsAppConnector> {
    migrate(&pool).await?;
    let stores = BridgeStores {
        logins: Arc::new(SqliteLoginStore::<UserLoginMetadata>::new(pool.clone())),
        messages: Arc::new(SqliteMessageStore::<MessageMetadata>::new(pool.clone())),
    };
    let exporter = Arc::new(HttpGroupExporter::from_config(&config.export));

    let connector = WhatsAppConnector::init(config, pool, runtime, stores, exporter)?;
    connector.start().await?;
    let loaded = connector.load_all_logins().await?;
    info!(loaded, version = %connector.version().await, "whatsapp connector running");
    Ok(connector)
}

#[cfg(feature = "runtime")]
pub fn protocol_runtime(config: &MxwaConfig) -> Result<Arc<dyn ProtocolRuntime>> {
    Ok(Arc::new(mxwa_whatsapp::WaRustRuntime::new(
        &config.whatsapp.session_dir,
    )))
}

#[cfg(not(feature = "runtime"))]
pub fn protocol_runtime(_config: &MxwaConfig) -> Result<Arc<dyn ProtocolRuntime>> {
    anyhow::bail!("this build has no whatsapp protocol runtime, rebuild with --features runtime")
}
