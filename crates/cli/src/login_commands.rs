use {
    anyhow::{Result, bail},
    clap::Subcommand,
    mxwa_bridge::{LoginStore, SqliteLoginStore, networkid::UserLoginId},
    mxwa_waid::{UserLoginMetadata, parse_user_login_id},
    mxwa_whatsapp::DeviceStore,
    tracing::info,
};

#[derive(Subcommand)]
pub enum LoginAction {
    /// List persisted logins.
    List,
    /// Print one login as JSON.
    Show {
        /// Login id (the account's phone number).
        id: String,
    },
    /// Delete a login and its paired device.
    Remove {
        /// Login id (the account's phone number).
        id: String,
    },
}

pub async fn handle_logins(action: &LoginAction, pool: &sqlx::SqlitePool) -> Result<()> {
    let logins = SqliteLoginStore::<UserLoginMetadata>::new(pool.clone());
    match action {
        LoginAction::List => {
            for line in list(&logins).await? {
                println!("{line}");
            }
            Ok(())
        },
        LoginAction::Show { id } => {
            let Some(record) = logins.get(&UserLoginId::new(id.as_str())).await? else {
                bail!("login {id} not found");
            };
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(())
        },
        LoginAction::Remove { id } => {
            remove(&logins, &DeviceStore::new(pool.clone()), &UserLoginId::new(id.as_str())).await
        },
    }
}

async fn list(logins: &SqliteLoginStore<UserLoginMetadata>) -> Result<Vec<String>> {
    let records = logins.list().await?;
    if records.is_empty() {
        return Ok(vec!["no logins".into()]);
    }
    Ok(records
        .iter()
        .map(|r| {
            format!(
                "{}  {}  device={}  last_history_sync={}",
                r.id,
                r.user_mxid,
                r.metadata.wa_device_id,
                r.metadata.last_history_sync.to_rfc3339()
            )
        })
        .collect())
}

async fn remove(
    logins: &SqliteLoginStore<UserLoginMetadata>,
    devices: &DeviceStore,
    id: &UserLoginId,
) -> Result<()> {
    let Some(record) = logins.get(id).await? else {
        bail!("login {id} not found");
    };
    let jid = parse_user_login_id(id, record.metadata.wa_device_id);
    devices.delete_device(&jid).await?;
    logins.delete(id).await?;
    info!(user_login_id = %id, jid = %jid, "removed login");
    Ok(())
}
