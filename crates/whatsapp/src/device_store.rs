//! Paired device records, stored on the bridge's SQLite pool.

use {
    mxwa_bridge::DbUpgradeError,
    mxwa_waid::Jid,
    tracing::{debug, info},
};

const DB_SECTION: &str = "whatsmeow";

/// Schema steps, applied in order. The index + 1 is the stored version.
const UPGRADES: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS whatsmeow_device (
        jid             TEXT PRIMARY KEY,
        registration_id INTEGER NOT NULL,
        platform        TEXT NOT NULL DEFAULT '',
        push_name       TEXT NOT NULL DEFAULT ''
    )"#,
    "ALTER TABLE whatsmeow_device ADD COLUMN business_name TEXT NOT NULL DEFAULT ''",
];

#[derive(Debug, thiserror::Error)]
pub enum DeviceStoreError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("invalid device jid {jid}: {reason}")]
    InvalidJid { jid: String, reason: String },
}

/// A paired companion device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    /// Our own AD jid (user + device id).
    pub jid: Jid,
    pub registration_id: u32,
    pub platform: String,
    pub push_name: String,
    pub business_name: String,
}

#[derive(sqlx::FromRow)]
struct DeviceRow {
    jid: String,
    registration_id: i64,
    platform: String,
    push_name: String,
    business_name: String,
}

impl TryFrom<DeviceRow> for Device {
    type Error = DeviceStoreError;

    fn try_from(r: DeviceRow) -> Result<Self, Self::Error> {
        Ok(Self {
            jid: r.jid.parse().map_err(|e: mxwa_waid::JidParseError| {
                DeviceStoreError::InvalidJid {
                    reason: e.to_string(),
                    jid: r.jid.clone(),
                }
            })?,
            registration_id: u32::try_from(r.registration_id).unwrap_or_default(),
            platform: r.platform,
            push_name: r.push_name,
            business_name: r.business_name,
        })
    }
}

pub struct DeviceStore {
    pool: sqlx::SqlitePool,
}

impl DeviceStore {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        debug!(db_section = DB_SECTION, "device store created");
        Self { pool }
    }

    /// Bring the schema up to the latest version.
    pub async fn upgrade(&self) -> Result<(), DbUpgradeError> {
        self.run_upgrades().await.map_err(|source| DbUpgradeError {
            section: DB_SECTION,
            source,
        })
    }

    async fn run_upgrades(&self) -> Result<(), sqlx::Error> {
        sqlx::query("CREATE TABLE IF NOT EXISTS whatsmeow_version (version INTEGER NOT NULL)")
            .execute(&self.pool)
            .await?;
        let current: Option<i64> = sqlx::query_scalar("SELECT MAX(version) FROM whatsmeow_version")
            .fetch_one(&self.pool)
            .await?;
        let current = usize::try_from(current.unwrap_or(0)).unwrap_or(0);

        for (idx, step) in UPGRADES.iter().enumerate().skip(current) {
            let version = idx + 1;
            info!(db_section = DB_SECTION, version, "upgrading database");
            let mut tx = self.pool.begin().await?;
            sqlx::query(*step).execute(&mut *tx).await?;
            sqlx::query("DELETE FROM whatsmeow_version")
                .execute(&mut *tx)
                .await?;
            sqlx::query("INSERT INTO whatsmeow_version (version) VALUES (?)")
                .bind(version as i64)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
        }
        Ok(())
    }

    pub async fn get_device(&self, jid: &Jid) -> Result<Option<Device>, DeviceStoreError> {
        let row = sqlx::query_as::<_, DeviceRow>("SELECT * FROM whatsmeow_device WHERE jid = ?")
            .bind(jid.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Device::try_from).transpose()
    }

    pub async fn put_device(&self, device: &Device) -> Result<(), DeviceStoreError> {
        sqlx::query(
            r#"INSERT INTO whatsmeow_device (jid, registration_id, platform, push_name, business_name)
               VALUES (?, ?, ?, ?, ?)
               ON CONFLICT(jid) DO UPDATE SET
                 registration_id = excluded.registration_id,
                 platform = excluded.platform,
                 push_name = excluded.push_name,
                 business_name = excluded.business_name"#,
        )
        .bind(device.jid.to_string())
        .bind(i64::from(device.registration_id))
        .bind(&device.platform)
        .bind(&device.push_name)
        .bind(&device.business_name)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn delete_device(&self, jid: &Jid) -> Result<(), DeviceStoreError> {
        sqlx::query("DELETE FROM whatsmeow_device WHERE jid = ?")
            .bind(jid.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn list_devices(&self) -> Result<Vec<Device>, DeviceStoreError> {
        let rows = sqlx::query_as::<_, DeviceRow>("SELECT * FROM whatsmeow_device ORDER BY jid")
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Device::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use {super::*, mxwa_waid::device_jid};

    async fn store() -> DeviceStore {
        let pool = sqlx::SqlitePool::connect("sqlite::memory:").await.unwrap();
        let store = DeviceStore::new(pool);
        store.upgrade().await.unwrap();
        store
    }

    fn device(user: &str, device_id: u16) -> Device {
        Device {
            jid: device_jid(user, 0, device_id),
            registration_id: 4242,
            platform: "android".into(),
            push_name: "Alice".into(),
            business_name: String::new(),
        }
    }

    #[tokio::test]
    async fn put_and_get_device() {
        let store = store().await;
        let dev = device("15551234567", 7);
        store.put_device(&dev).await.unwrap();

        let loaded = store.get_device(&dev.jid).await.unwrap().unwrap();
        assert_eq!(loaded, dev);
        assert!(
            store
                .get_device(&device_jid("15551234567", 0, 8))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn put_device_overwrites() {
        let store = store().await;
        let mut dev = device("15551234567", 7);
        store.put_device(&dev).await.unwrap();
        dev.push_name = "Alice B".into();
        store.put_device(&dev).await.unwrap();

        let all = store.list_devices().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].push_name, "Alice B");
    }

    #[tokio::test]
    async fn upgrade_is_idempotent() {
        let store = store().await;
        store.upgrade().await.unwrap();
        let version: i64 = sqlx::query_scalar("SELECT version FROM whatsmeow_version")
            .fetch_one(&store.pool)
            .await
            .unwrap();
        assert_eq!(version, UPGRADES.len() as i64);
    }

    #[tokio::test]
    async fn delete_device_removes_row() {
        let store = store().await;
        let dev = device("15551234567", 3);
        store.put_device(&dev).await.unwrap();
        store.delete_device(&dev.jid).await.unwrap();
        assert!(store.get_device(&dev.jid).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn upgrade_failure_reports_section() {
        let pool = sqlx::SqlitePool::connect("sqlite::memory:").await.unwrap();
        pool.close().await;
        let err = DeviceStore::new(pool).upgrade().await.unwrap_err();
        assert_eq!(err.section, "whatsmeow");
        assert_eq!(err.to_string(), "failed to upgrade whatsmeow database");
    }
}
