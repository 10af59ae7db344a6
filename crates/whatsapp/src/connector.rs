//! Process-wide WhatsApp connector: owns the device store, the protocol
//! runtime and the registry of loaded clients.

use std::sync::Arc;

use {
    anyhow::Result,
    async_trait::async_trait,
    dashmap::DashMap,
    mxwa_bridge::{
        BridgeName, DbUpgradeError, LoginStore, MessageStore, NetworkConnector,
        NetworkGeneralCapabilities, UserLogin, commands::CommandContext, networkid::UserLoginId,
    },
    mxwa_config::{DisplaynameTemplate, MxwaConfig, TemplateError},
    mxwa_waid::{Jid, MessageMetadata, UserLoginMetadata, parse_user_login_id},
    tokio::sync::RwLock,
    tracing::{debug, error, info},
};

use crate::{
    client::WhatsAppClient,
    device_store::{DeviceStore, DeviceStoreError},
    export::GroupExporter,
    props::DeviceProps,
    remote::ProtocolRuntime,
    types::WaVersion,
};

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("failed to parse displayname template: {0}")]
    Template(#[from] TemplateError),
}

#[derive(Debug, thiserror::Error)]
pub enum LoadLoginError {
    #[error("failed to get device: {0}")]
    Device(#[from] DeviceStoreError),
    #[error("device {0} not found in store")]
    DeviceNotFound(Jid),
}

/// Bridge-side stores the connector reads from.
#[derive(Clone)]
pub struct BridgeStores {
    pub logins: Arc<dyn LoginStore<UserLoginMetadata>>,
    pub messages: Arc<dyn MessageStore<MessageMetadata>>,
}

pub struct WhatsAppConnector {
    displayname: Arc<DisplaynameTemplate>,
    device_store: DeviceStore,
    device_props: DeviceProps,
    runtime: Arc<dyn ProtocolRuntime>,
    exporter: Arc<dyn GroupExporter>,
    stores: BridgeStores,
    version: RwLock<WaVersion>,
    clients: DashMap<UserLoginId, Arc<WhatsAppClient>>,
}

impl WhatsAppConnector {
    pub fn init(
        config: &MxwaConfig,
        pool: sqlx::SqlitePool,
        runtime: Arc<dyn ProtocolRuntime>,
        stores: BridgeStores,
        exporter: Arc<dyn GroupExporter>,
    ) -> Result<Self, InitError> {
        let displayname = DisplaynameTemplate::parse(&config.bridge.displayname_template)?;
        let device_props = DeviceProps::from_config(config);
        debug!(
            os = %device_props.os,
            platform = ?device_props.platform_type,
            require_full_sync = device_props.require_full_sync,
            "whatsapp connector initialized"
        );
        Ok(Self {
            displayname: Arc::new(displayname),
            device_store: DeviceStore::new(pool),
            device_props,
            runtime,
            exporter,
            stores,
            version: RwLock::new(WaVersion::HARDCODED),
            clients: DashMap::new(),
        })
    }

    pub fn device_store(&self) -> &DeviceStore {
        &self.device_store
    }

    pub fn device_props(&self) -> &DeviceProps {
        &self.device_props
    }

    pub fn stores(&self) -> &BridgeStores {
        &self.stores
    }

    /// Web client version announced to WhatsApp by new clients.
    pub async fn version(&self) -> WaVersion {
        *self.version.read().await
    }

    pub fn get_cached_client(&self, id: &UserLoginId) -> Option<Arc<WhatsAppClient>> {
        self.clients.get(id).map(|c| Arc::clone(c.value()))
    }

    /// The first login (by id) belonging to a Matrix user.
    pub fn default_client_for(&self, user_mxid: &str) -> Option<Arc<WhatsAppClient>> {
        self.clients
            .iter()
            .filter(|c| c.login.user_mxid == user_mxid)
            .min_by(|a, b| a.key().cmp(b.key()))
            .map(|c| Arc::clone(c.value()))
    }

    pub fn unload_user_login(&self, id: &UserLoginId) -> Option<Arc<WhatsAppClient>> {
        self.clients.remove(id).map(|(_, c)| c)
    }

    /// Load every persisted login. Failures are logged and skipped.
    pub async fn load_all_logins(&self) -> Result<usize> {
        let records = self.stores.logins.list().await?;
        let mut loaded = 0;
        for record in records {
            let id = record.id.clone();
            let login = UserLogin::new(record, Arc::clone(&self.stores.logins));
            match self.load_user_login(login).await {
                Ok(_) => loaded += 1,
                Err(e) => error!(user_login_id = %id, error = %e, "failed to load user login"),
            }
        }
        info!(loaded, "loaded user logins");
        Ok(loaded)
    }
}

#[async_trait]
impl NetworkConnector for WhatsAppConnector {
    type Client = WhatsAppClient;
    type LoginMetadata = UserLoginMetadata;

    fn name(&self) -> BridgeName {
        BridgeName {
            display_name: "WhatsApp",
            network_url: "https://whatsapp.com",
            network_icon: "mxc://maunium.net/NeDjLkOHdDgAHbNPoZCHQOXn",
            network_id: "whatsapp",
            beeper_bridge_type: "whatsapp",
            default_port: 29318,
        }
    }

    fn capabilities(&self) -> NetworkGeneralCapabilities {
        NetworkGeneralCapabilities {
            disappearing_messages: true,
            aggressive_update_info: false,
        }
    }

    async fn start(&self) -> Result<(), DbUpgradeError> {
        self.device_store.upgrade().await?;
        match self.runtime.latest_version().await {
            Ok(latest) => {
                debug!(
                    hardcoded_version = %WaVersion::HARDCODED,
                    latest_version = %latest,
                    "got latest whatsapp web version number"
                );
                *self.version.write().await = latest;
            },
            Err(e) => error!(error = %e, "failed to get latest whatsapp web version number"),
        }
        Ok(())
    }

    async fn load_user_login(
        &self,
        login: UserLogin<UserLoginMetadata>,
    ) -> Result<Arc<WhatsAppClient>> {
        let meta = login.metadata().await;
        let jid = parse_user_login_id(&login.id, meta.wa_device_id);
        let device = self
            .device_store
            .get_device(&jid)
            .await
            .map_err(LoadLoginError::from)?
            .ok_or_else(|| LoadLoginError::DeviceNotFound(jid.clone()))?;

        let wa = self
            .runtime
            .new_client(&device, &self.device_props, self.version().await);
        let client = Arc::new(WhatsAppClient::new(
            Arc::new(login),
            jid,
            device,
            wa,
            Arc::clone(&self.displayname),
            Arc::clone(&self.exporter),
        ));

        if let Err(e) = client.client.connect().await {
            error!(user_login_id = %client.login.id, error = %e, "failed to connect to whatsapp");
        } else {
            info!(user_login_id = %client.login.id, jid = %client.jid, "connected to whatsapp");
        }
        self.clients
            .insert(client.login.id.clone(), Arc::clone(&client));
        Ok(client)
    }
}

impl CommandContext for WhatsAppConnector {
    fn user_has_login(&self, user_mxid: &str) -> bool {
        self.clients.iter().any(|c| c.login.user_mxid == user_mxid)
    }
}
