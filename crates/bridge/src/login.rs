//! User logins and their persistence.
//!
//! A login is one remote account attached to one Matrix user. The bridge
//! persists it together with connector-specific metadata `M`, stored as JSON.

use std::{marker::PhantomData, sync::Arc};

use {
    async_trait::async_trait,
    serde::{Deserialize, Serialize, de::DeserializeOwned},
    tokio::sync::RwLock,
};

use crate::{
    error::{DbUpgradeError, StoreError},
    networkid::UserLoginId,
};

/// Persisted form of a login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginRecord<M> {
    pub id: UserLoginId,
    pub user_mxid: String,
    pub remote_name: String,
    pub metadata: M,
}

#[async_trait]
pub trait LoginStore<M>: Send + Sync {
    async fn save(&self, record: &LoginRecord<M>) -> Result<(), StoreError>;
    async fn get(&self, id: &UserLoginId) -> Result<Option<LoginRecord<M>>, StoreError>;
    async fn list(&self) -> Result<Vec<LoginRecord<M>>, StoreError>;
    async fn delete(&self, id: &UserLoginId) -> Result<(), StoreError>;
}

/// A loaded login with mutable metadata.
pub struct UserLogin<M> {
    pub id: UserLoginId,
    pub user_mxid: String,
    pub remote_name: String,
    metadata: RwLock<M>,
    store: Arc<dyn LoginStore<M>>,
}

impl<M> UserLogin<M>
where
    M: Clone + Send + Sync + 'static,
{
    pub fn new(record: LoginRecord<M>, store: Arc<dyn LoginStore<M>>) -> Self {
        Self {
            id: record.id,
            user_mxid: record.user_mxid,
            remote_name: record.remote_name,
            metadata: RwLock::new(record.metadata),
            store,
        }
    }

    /// Snapshot of the current metadata.
    pub async fn metadata(&self) -> M {
        self.metadata.read().await.clone()
    }

    /// Mutate metadata in place. Changes are not persisted until [`save`].
    ///
    /// [`save`]: Self::save
    pub async fn update_metadata<R>(&self, f: impl FnOnce(&mut M) -> R) -> R {
        f(&mut *self.metadata.write().await)
    }

    pub async fn record(&self) -> LoginRecord<M> {
        LoginRecord {
            id: self.id.clone(),
            user_mxid: self.user_mxid.clone(),
            remote_name: self.remote_name.clone(),
            metadata: self.metadata().await,
        }
    }

    pub async fn save(&self) -> Result<(), StoreError> {
        let record = self.record().await;
        self.store.save(&record).await
    }
}

// ── SQLite-backed login store ───────────────────────────────────────────────

pub struct SqliteLoginStore<M> {
    pool: sqlx::SqlitePool,
    _meta: PhantomData<fn() -> M>,
}

#[derive(sqlx::FromRow)]
struct LoginRow {
    id: String,
    user_mxid: String,
    remote_name: String,
    metadata: String,
}

impl<M: DeserializeOwned> TryFrom<LoginRow> for LoginRecord<M> {
    type Error = StoreError;

    fn try_from(r: LoginRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: UserLoginId(r.id),
            user_mxid: r.user_mxid,
            remote_name: r.remote_name,
            metadata: serde_json::from_str(&r.metadata)?,
        })
    }
}

impl<M> SqliteLoginStore<M> {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self {
            pool,
            _meta: PhantomData,
        }
    }

    /// Create the `user_login` table if it doesn't exist.
    pub async fn init(pool: &sqlx::SqlitePool) -> Result<(), DbUpgradeError> {
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS user_login (
                id          TEXT PRIMARY KEY,
                user_mxid   TEXT NOT NULL,
                remote_name TEXT NOT NULL DEFAULT '',
                metadata    TEXT NOT NULL DEFAULT '{}'
            )"#,
        )
        .execute(pool)
        .await
        .map_err(|source| DbUpgradeError {
            section: "user_login",
            source,
        })?;
        Ok(())
    }
}

#[async_trait]
impl<M> LoginStore<M> for SqliteLoginStore<M>
where
    M: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn save(&self, record: &LoginRecord<M>) -> Result<(), StoreError> {
        let metadata = serde_json::to_string(&record.metadata)?;
        sqlx::query(
            r#"INSERT INTO user_login (id, user_mxid, remote_name, metadata)
               VALUES (?, ?, ?, ?)
               ON CONFLICT(id) DO UPDATE SET
                 user_mxid = excluded.user_mxid,
                 remote_name = excluded.remote_name,
                 metadata = excluded.metadata"#,
        )
        .bind(record.id.as_str())
        .bind(&record.user_mxid)
        .bind(&record.remote_name)
        .bind(metadata)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, id: &UserLoginId) -> Result<Option<LoginRecord<M>>, StoreError> {
        sqlx::query_as::<_, LoginRow>("SELECT * FROM user_login WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?
            .map(LoginRecord::try_from)
            .transpose()
    }

    async fn list(&self) -> Result<Vec<LoginRecord<M>>, StoreError> {
        sqlx::query_as::<_, LoginRow>("SELECT * FROM user_login ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(LoginRecord::try_from)
            .collect()
    }

    async fn delete(&self, id: &UserLoginId) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM user_login WHERE id = ?")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct Meta {
        #[serde(default)]
        device: u16,
    }

    async fn sqlite_store() -> Arc<SqliteLoginStore<Meta>> {
        let pool = sqlx::SqlitePool::connect("sqlite::memory:").await.unwrap();
        SqliteLoginStore::<Meta>::init(&pool).await.unwrap();
        Arc::new(SqliteLoginStore::new(pool))
    }

    fn record(id: &str, device: u16) -> LoginRecord<Meta> {
        LoginRecord {
            id: UserLoginId::from(id),
            user_mxid: "@alice:example.com".into(),
            remote_name: "+1 555".into(),
            metadata: Meta { device },
        }
    }

    #[tokio::test]
    async fn test_save_and_get() {
        let store = sqlite_store().await;
        store.save(&record("111", 3)).await.unwrap();
        let loaded = store.get(&UserLoginId::from("111")).await.unwrap().unwrap();
        assert_eq!(loaded, record("111", 3));
        assert!(store.get(&UserLoginId::from("222")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_overwrites_metadata() {
        let store = sqlite_store().await;
        store.save(&record("111", 3)).await.unwrap();
        store.save(&record("111", 9)).await.unwrap();
        let list = store.list().await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].metadata.device, 9);
    }

    #[tokio::test]
    async fn test_delete() {
        let store = sqlite_store().await;
        store.save(&record("111", 3)).await.unwrap();
        store.delete(&UserLoginId::from("111")).await.unwrap();
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_user_login_save_persists_updated_metadata() {
        let store = sqlite_store().await;
        let login = UserLogin::new(record("111", 1), store.clone());
        login.update_metadata(|m| m.device = 42).await;
        login.save().await.unwrap();
        let loaded = store.get(&login.id).await.unwrap().unwrap();
        assert_eq!(loaded.metadata.device, 42);
    }
}
