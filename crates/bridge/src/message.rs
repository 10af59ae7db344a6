//! Bridged message parts, looked up by their Matrix event id.

use std::marker::PhantomData;

use {
    async_trait::async_trait,
    serde::{Serialize, de::DeserializeOwned},
};

use crate::{
    error::{DbUpgradeError, StoreError},
    networkid::{EventId, MessageId, PortalId, UserId},
};

#[derive(Debug, Clone, PartialEq)]
pub struct Message<M> {
    pub mxid: EventId,
    pub id: MessageId,
    pub portal_id: PortalId,
    pub sender: UserId,
    pub metadata: M,
}

#[async_trait]
pub trait MessageStore<M>: Send + Sync {
    async fn insert(&self, message: &Message<M>) -> Result<(), StoreError>;
    async fn get_part_by_mxid(&self, mxid: &EventId) -> Result<Option<Message<M>>, StoreError>;
}

pub struct SqliteMessageStore<M> {
    pool: sqlx::SqlitePool,
    _meta: PhantomData<fn() -> M>,
}

#[derive(sqlx::FromRow)]
struct MessageRow {
    mxid: String,
    id: String,
    portal_id: String,
    sender: String,
    metadata: String,
}

impl<M> SqliteMessageStore<M> {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self {
            pool,
            _meta: PhantomData,
        }
    }

    /// Create the `message` table if it doesn't exist.
    pub async fn init(pool: &sqlx::SqlitePool) -> Result<(), DbUpgradeError> {
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS message (
                mxid      TEXT PRIMARY KEY,
                id        TEXT NOT NULL,
                portal_id TEXT NOT NULL,
                sender    TEXT NOT NULL,
                metadata  TEXT NOT NULL DEFAULT '{}'
            )"#,
        )
        .execute(pool)
        .await
        .map_err(|source| DbUpgradeError {
            section: "message",
            source,
        })?;
        Ok(())
    }
}

#[async_trait]
impl<M> MessageStore<M> for SqliteMessageStore<M>
where
    M: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn insert(&self, message: &Message<M>) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT OR REPLACE INTO message (mxid, id, portal_id, sender, metadata) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(message.mxid.as_str())
        .bind(message.id.as_str())
        .bind(message.portal_id.as_str())
        .bind(message.sender.as_str())
        .bind(serde_json::to_string(&message.metadata)?)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_part_by_mxid(&self, mxid: &EventId) -> Result<Option<Message<M>>, StoreError> {
        let Some(row) = sqlx::query_as::<_, MessageRow>("SELECT * FROM message WHERE mxid = ?")
            .bind(mxid.as_str())
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };
        Ok(Some(Message {
            mxid: EventId(row.mxid),
            id: MessageId(row.id),
            portal_id: PortalId(row.portal_id),
            sender: UserId(row.sender),
            metadata: serde_json::from_str(&row.metadata)?,
        }))
    }
}
