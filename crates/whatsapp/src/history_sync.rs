//! History sync handling, throttled to one sync per login per day.

use {
    chrono::{DateTime, TimeDelta, Utc},
    mxwa_bridge::networkid::PortalId,
    mxwa_waid::{Jid, make_portal_id},
    tracing::{error, info, warn},
};

use crate::{
    chatinfo::{WaChatInfo, apply_history_info},
    client::WhatsAppClient,
    types::HistorySync,
};

/// Minimum time between two processed history syncs.
pub const HISTORY_SYNC_COOLDOWN: TimeDelta = TimeDelta::hours(24);

#[derive(Debug)]
pub enum HistorySyncOutcome {
    /// The previous sync was too recent.
    Skipped { since_last: TimeDelta },
    Processed(Vec<(PortalId, WaChatInfo)>),
}

impl HistorySyncOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }
}

impl WhatsAppClient {
    pub async fn handle_history_sync(&self, evt: &HistorySync) -> HistorySyncOutcome {
        self.handle_history_sync_at(evt, Utc::now()).await
    }

    pub async fn handle_history_sync_at(
        &self,
        evt: &HistorySync,
        now: DateTime<Utc>,
    ) -> HistorySyncOutcome {
        // Check and claim the slot under one metadata lock.
        let last_sync = self
            .login
            .update_metadata(|meta| {
                let last = meta.last_history_sync;
                if now - last >= HISTORY_SYNC_COOLDOWN {
                    meta.last_history_sync = now;
                }
                last
            })
            .await;
        let since_last = now - last_sync;
        if since_last < HISTORY_SYNC_COOLDOWN {
            info!(
                user_login_id = %self.login.id,
                sync_type = ?evt.sync_type,
                last_history_sync = %last_sync,
                since_last_secs = since_last.num_seconds(),
                "SYNC SKIPPED: last history sync was less than 24 hours ago"
            );
            return HistorySyncOutcome::Skipped { since_last };
        }

        if let Err(e) = self.login.save().await {
            error!(user_login_id = %self.login.id, error = %e, "failed to save history sync timestamp");
        }

        let mut portals = Vec::with_capacity(evt.conversations.len());
        for conv in &evt.conversations {
            let jid: Jid = match conv.id.parse() {
                Ok(jid) => jid,
                Err(e) => {
                    warn!(chat_id = %conv.id, error = %e, "skipping history sync conversation with invalid jid");
                    continue;
                },
            };
            let mut info = WaChatInfo {
                name: conv.name.clone(),
                ..Default::default()
            };
            apply_history_info(&mut info, Some(conv));
            portals.push((make_portal_id(&jid), info));
        }
        info!(
            user_login_id = %self.login.id,
            sync_type = ?evt.sync_type,
            conversations = portals.len(),
            "processed history sync"
        );
        HistorySyncOutcome::Processed(portals)
    }
}
