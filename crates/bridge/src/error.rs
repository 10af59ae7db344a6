/// A database section failed to upgrade its schema during startup.
#[derive(Debug, thiserror::Error)]
#[error("failed to upgrade {section} database")]
pub struct DbUpgradeError {
    pub section: &'static str,
    #[source]
    pub source: sqlx::Error,
}

/// Failure of a login or message store operation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("invalid metadata JSON: {0}")]
    Metadata(#[from] serde_json::Error),
}
