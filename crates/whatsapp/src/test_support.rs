//! In-memory doubles for the protocol client, runtime and exporter.

use std::{
    collections::HashMap,
    io,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use {
    anyhow::{Result, anyhow, bail},
    async_trait::async_trait,
    mxwa_bridge::{
        LoginRecord, NetworkConnector, SqliteLoginStore, SqliteMessageStore, UserLogin,
        networkid::UserLoginId,
    },
    mxwa_config::MxwaConfig,
    mxwa_waid::{Jid, MessageMetadata, UserLoginMetadata, device_jid},
};

use crate::{
    client::WhatsAppClient,
    connector::{BridgeStores, WhatsAppConnector},
    device_store::Device,
    export::{ExportError, GroupExporter, GroupSummary},
    props::DeviceProps,
    remote::{ProtocolRuntime, WaClient},
    types::{ChatSettings, ContactInfo, GroupInfo, NewsletterMetadata, WaVersion},
};

pub struct MockWaClient {
    pub logged_in: AtomicBool,
    pub fail_connect: AtomicBool,
    pub connects: AtomicUsize,
    pub groups: Mutex<HashMap<Jid, GroupInfo>>,
    pub newsletters: Mutex<HashMap<Jid, NewsletterMetadata>>,
    pub media: Mutex<HashMap<String, Vec<u8>>>,
    pub chat_settings: Mutex<HashMap<Jid, ChatSettings>>,
    chat_settings_fail: AtomicBool,
    pub contacts: Mutex<HashMap<Jid, ContactInfo>>,
    pub joins: Mutex<Vec<(Jid, Jid, String, i64)>>,
    pub join_error: Mutex<Option<String>>,
}

impl Default for MockWaClient {
    fn default() -> Self {
        Self {
            logged_in: AtomicBool::new(true),
            fail_connect: AtomicBool::new(false),
            connects: AtomicUsize::new(0),
            groups: Mutex::default(),
            newsletters: Mutex::default(),
            media: Mutex::default(),
            chat_settings: Mutex::default(),
            chat_settings_fail: AtomicBool::new(false),
            contacts: Mutex::default(),
            joins: Mutex::default(),
            join_error: Mutex::default(),
        }
    }
}

impl MockWaClient {
    pub fn add_group(&self, group: GroupInfo) {
        self.groups.lock().unwrap().insert(group.jid.clone(), group);
    }

    pub fn add_newsletter(&self, newsletter: NewsletterMetadata) {
        self.newsletters
            .lock()
            .unwrap()
            .insert(newsletter.id.clone(), newsletter);
    }

    pub fn fail_chat_settings(&self) {
        self.chat_settings_fail.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl WaClient for MockWaClient {
    async fn connect(&self) -> Result<()> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.fail_connect.load(Ordering::SeqCst) {
            bail!("websocket handshake failed");
        }
        Ok(())
    }

    fn is_logged_in(&self) -> bool {
        self.logged_in.load(Ordering::SeqCst)
    }

    async fn get_group_info(&self, jid: &Jid) -> Result<GroupInfo> {
        self.groups
            .lock()
            .unwrap()
            .get(jid)
            .cloned()
            .ok_or_else(|| anyhow!("item-not-found"))
    }

    async fn get_joined_groups(&self) -> Result<Vec<GroupInfo>> {
        let mut groups: Vec<_> = self.groups.lock().unwrap().values().cloned().collect();
        groups.sort_by(|a, b| a.jid.user.cmp(&b.jid.user));
        Ok(groups)
    }

    async fn get_newsletter_info(&self, jid: &Jid) -> Result<NewsletterMetadata> {
        self.newsletters
            .lock()
            .unwrap()
            .get(jid)
            .cloned()
            .ok_or_else(|| anyhow!("item-not-found"))
    }

    async fn download_media_with_path(&self, direct_path: &str) -> Result<Vec<u8>> {
        self.media
            .lock()
            .unwrap()
            .get(direct_path)
            .cloned()
            .ok_or_else(|| anyhow!("media not found: {direct_path}"))
    }

    async fn join_group_with_invite(
        &self,
        group: &Jid,
        inviter: &Jid,
        code: &str,
        expiration: i64,
    ) -> Result<()> {
        if let Some(e) = self.join_error.lock().unwrap().clone() {
            bail!(e);
        }
        self.joins.lock().unwrap().push((
            group.clone(),
            inviter.clone(),
            code.to_string(),
            expiration,
        ));
        Ok(())
    }

    async fn get_chat_settings(&self, chat: &Jid) -> Result<Option<ChatSettings>> {
        if self.chat_settings_fail.load(Ordering::SeqCst) {
            bail!("database is locked");
        }
        Ok(self.chat_settings.lock().unwrap().get(chat).cloned())
    }

    async fn get_contact(&self, jid: &Jid) -> Result<Option<ContactInfo>> {
        Ok(self.contacts.lock().unwrap().get(jid).cloned())
    }
}

#[derive(Default)]
pub struct MockRuntime {
    pub client: Arc<MockWaClient>,
    pub latest: Mutex<Option<WaVersion>>,
    pub last_props: Mutex<Option<DeviceProps>>,
}

#[async_trait]
impl ProtocolRuntime for MockRuntime {
    fn new_client(
        &self,
        _device: &Device,
        props: &DeviceProps,
        _version: WaVersion,
    ) -> Arc<dyn WaClient> {
        *self.last_props.lock().unwrap() = Some(props.clone());
        Arc::clone(&self.client) as Arc<dyn WaClient>
    }

    async fn latest_version(&self) -> Result<WaVersion> {
        (*self.latest.lock().unwrap()).ok_or_else(|| anyhow!("version endpoint unreachable"))
    }
}

#[derive(Default)]
pub struct MockExporter {
    pub calls: Mutex<Vec<(UserLoginId, Vec<GroupSummary>)>>,
    pub fail: AtomicBool,
}

#[async_trait]
impl GroupExporter for MockExporter {
    async fn export(&self, login: &UserLoginId, groups: &[GroupSummary]) -> Result<(), ExportError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ExportError::Status(500));
        }
        self.calls
            .lock()
            .unwrap()
            .push((login.clone(), groups.to_vec()));
        Ok(())
    }
}

/// Formatted log output of the current thread.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::TRACE)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    /// The captured line containing `message`.
    pub fn line_with(&self, message: &str) -> Option<String> {
        String::from_utf8_lossy(&self.0.lock().unwrap())
            .lines()
            .find(|l| l.contains(message))
            .map(str::to_string)
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A connector on an in-memory database with one loaded login.
pub struct TestBridge {
    pub connector: WhatsAppConnector,
    pub client: Arc<WhatsAppClient>,
    pub wa: Arc<MockWaClient>,
    pub runtime: Arc<MockRuntime>,
    pub exporter: Arc<MockExporter>,
}

impl TestBridge {
    pub const OWN_USER: &'static str = "15551234567";
    pub const OWN_MXID: &'static str = "@alice:example.com";
    const DEVICE_ID: u16 = 7;

    pub async fn new() -> Self {
        let pool = sqlx::SqlitePool::connect("sqlite::memory:").await.unwrap();
        let stores = Self::stores(&pool).await;
        let runtime = Arc::new(MockRuntime::default());
        let exporter = Arc::new(MockExporter::default());
        let connector = WhatsAppConnector::init(
            &MxwaConfig::default(),
            pool,
            Arc::clone(&runtime) as Arc<dyn ProtocolRuntime>,
            stores,
            Arc::clone(&exporter) as Arc<dyn GroupExporter>,
        )
        .unwrap();
        connector.device_store().upgrade().await.unwrap();

        let client = register_login(&connector, Self::OWN_USER).await;
        Self {
            wa: Arc::clone(&runtime.client),
            connector,
            client,
            runtime,
            exporter,
        }
    }

    pub async fn stores(pool: &sqlx::SqlitePool) -> BridgeStores {
        SqliteLoginStore::<UserLoginMetadata>::init(pool).await.unwrap();
        SqliteMessageStore::<MessageMetadata>::init(pool).await.unwrap();
        BridgeStores {
            logins: Arc::new(SqliteLoginStore::<UserLoginMetadata>::new(pool.clone())),
            messages: Arc::new(SqliteMessageStore::<MessageMetadata>::new(pool.clone())),
        }
    }

    pub fn exporter() -> Arc<dyn GroupExporter> {
        Arc::new(MockExporter::default())
    }

    /// Pair and load another login for the same Matrix user.
    pub async fn add_login(&self, user: &str) -> Arc<WhatsAppClient> {
        register_login(&self.connector, user).await
    }

    pub async fn stored_login(&self) -> LoginRecord<UserLoginMetadata> {
        self.connector
            .stores()
            .logins
            .get(&UserLoginId::new(Self::OWN_USER))
            .await
            .unwrap()
            .unwrap()
    }
}

async fn register_login(connector: &WhatsAppConnector, user: &str) -> Arc<WhatsAppClient> {
    let device = Device {
        jid: device_jid(user, 0, TestBridge::DEVICE_ID),
        registration_id: 1,
        platform: "android".into(),
        push_name: "Me".into(),
        business_name: String::new(),
    };
    connector.device_store().put_device(&device).await.unwrap();

    let record = LoginRecord {
        id: UserLoginId::new(user),
        user_mxid: TestBridge::OWN_MXID.into(),
        remote_name: format!("+{user}"),
        metadata: UserLoginMetadata {
            wa_device_id: TestBridge::DEVICE_ID,
            ..Default::default()
        },
    };
    let logins = Arc::clone(&connector.stores().logins);
    logins.save(&record).await.unwrap();
    connector
        .load_user_login(UserLogin::new(record, logins))
        .await
        .unwrap()
}
