//! Protocol runtime backed by `whatsapp-rust`.
//!
//! Each paired device gets its own session database under the configured
//! session directory. Queries the library does not expose yet (group and
//! newsletter metadata, invite joins, path downloads) fail with
//! [`RuntimeError::Unsupported`]; local chat settings and contacts read as
//! absent.

use std::{
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use {
    anyhow::{Context, Result, anyhow},
    async_trait::async_trait,
    mxwa_waid::Jid,
    tokio::sync::Mutex,
    tracing::{debug, info, warn},
    wacore::types::events::Event,
    waproto::whatsapp::device_props::PlatformType as ProtoPlatformType,
    whatsapp_rust::{bot::Bot, client::Client, store::SqliteStore},
    whatsapp_rust_tokio_transport::TokioWebSocketTransportFactory,
    whatsapp_rust_ureq_http_client::UreqHttpClient,
};

use crate::{
    device_store::Device,
    props::DeviceProps,
    remote::{ProtocolRuntime, WaClient},
    types::{ChatSettings, ContactInfo, GroupInfo, NewsletterMetadata, WaVersion},
    version::{WEB_VERSION_URL, fetch_latest_version},
};

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("{0} is not supported by the whatsapp-rust runtime")]
    Unsupported(&'static str),
}

pub struct WaRustRuntime {
    session_dir: PathBuf,
    http: reqwest::Client,
}

impl WaRustRuntime {
    pub fn new(session_dir: impl Into<PathBuf>) -> Self {
        Self {
            session_dir: session_dir.into(),
            http: reqwest::Client::new(),
        }
    }

    fn session_db(&self, device: &Device) -> PathBuf {
        self.session_dir
            .join(format!("{}-{}.db", device.jid.user, device.jid.device))
    }
}

#[async_trait]
impl ProtocolRuntime for WaRustRuntime {
    fn new_client(
        &self,
        device: &Device,
        props: &DeviceProps,
        version: WaVersion,
    ) -> Arc<dyn WaClient> {
        Arc::new(WaRustClient {
            session_db: self.session_db(device),
            props: props.clone(),
            version,
            logged_in: Arc::new(AtomicBool::new(false)),
            client: Arc::new(Mutex::new(None)),
        })
    }

    async fn latest_version(&self) -> Result<WaVersion> {
        Ok(fetch_latest_version(&self.http, WEB_VERSION_URL).await?)
    }
}

pub struct WaRustClient {
    session_db: PathBuf,
    props: DeviceProps,
    version: WaVersion,
    logged_in: Arc<AtomicBool>,
    client: Arc<Mutex<Option<Arc<Client>>>>,
}

fn proto_platform(props: &DeviceProps) -> Option<ProtoPlatformType> {
    props
        .platform_type
        .and_then(|p| ProtoPlatformType::from_str_name(p.proto_name()))
}

#[async_trait]
impl WaClient for WaRustClient {
    async fn connect(&self) -> Result<()> {
        if let Some(dir) = self.session_db.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("failed to create session directory {}", dir.display()))?;
        }
        let db_path = self.session_db.to_string_lossy().into_owned();
        debug!(session = %db_path, version = %self.version, "building whatsapp session");
        if self.props.require_full_sync || self.props.history_sync_config.is_some() {
            debug!("full history sync settings are not forwarded by this runtime");
        }

        let backend = Arc::new(
            SqliteStore::new(&db_path)
                .await
                .map_err(|e| anyhow!("whatsapp session store init failed: {e}"))?,
        );

        let logged_in = Arc::clone(&self.logged_in);
        let client_slot = Arc::clone(&self.client);
        let mut bot = Bot::builder()
            .with_backend(backend)
            .with_transport_factory(TokioWebSocketTransportFactory::new())
            .with_http_client(UreqHttpClient::new())
            .with_device_props(Some(self.props.os.clone()), None, proto_platform(&self.props))
            .on_event(move |event, client| {
                let logged_in = Arc::clone(&logged_in);
                let client_slot = Arc::clone(&client_slot);
                async move {
                    match event {
                        Event::Connected(_) => {
                            logged_in.store(true, Ordering::SeqCst);
                            *client_slot.lock().await = Some(client);
                            info!("whatsapp session connected");
                        },
                        Event::Disconnected(_) => warn!("whatsapp session disconnected"),
                        Event::LoggedOut(_) => {
                            logged_in.store(false, Ordering::SeqCst);
                            *client_slot.lock().await = None;
                            warn!("whatsapp session logged out");
                        },
                        Event::PairingQrCode { .. } => {
                            warn!("whatsapp session asked for pairing, device is not paired");
                        },
                        _ => {},
                    }
                }
            })
            .build()
            .await
            .map_err(|e| anyhow!("whatsapp client build failed: {e}"))?;

        *self.client.lock().await = Some(bot.client());
        let _handle = bot
            .run()
            .await
            .map_err(|e| anyhow!("whatsapp client run failed: {e}"))?;
        Ok(())
    }

    fn is_logged_in(&self) -> bool {
        self.logged_in.load(Ordering::SeqCst)
    }

    async fn get_group_info(&self, _jid: &Jid) -> Result<GroupInfo> {
        Err(RuntimeError::Unsupported("group metadata").into())
    }

    async fn get_joined_groups(&self) -> Result<Vec<GroupInfo>> {
        Err(RuntimeError::Unsupported("listing joined groups").into())
    }

    async fn get_newsletter_info(&self, _jid: &Jid) -> Result<NewsletterMetadata> {
        Err(RuntimeError::Unsupported("newsletter metadata").into())
    }

    async fn download_media_with_path(&self, _direct_path: &str) -> Result<Vec<u8>> {
        Err(RuntimeError::Unsupported("downloading media by path").into())
    }

    async fn join_group_with_invite(
        &self,
        _group: &Jid,
        _inviter: &Jid,
        _code: &str,
        _expiration: i64,
    ) -> Result<()> {
        Err(RuntimeError::Unsupported("joining groups by invite").into())
    }

    async fn get_chat_settings(&self, _chat: &Jid) -> Result<Option<ChatSettings>> {
        Ok(None)
    }

    async fn get_contact(&self, _jid: &Jid) -> Result<Option<ContactInfo>> {
        Ok(None)
    }
}
