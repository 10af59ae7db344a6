//! WhatsApp-specific chat commands.

use std::sync::Arc;

use {
    async_trait::async_trait,
    chrono::{TimeDelta, Utc},
    mxwa_bridge::commands::{
        CommandEvent, CommandHandler, CommandProcessor, HandlerMeta, HelpMeta, HelpSection,
    },
    tracing::{error, info, warn},
};

use crate::{
    client::WhatsAppClient,
    connector::WhatsAppConnector,
    history_sync::HISTORY_SYNC_COOLDOWN,
    types::{HistorySync, HistorySyncType},
};

pub const HELP_SECTION_INVITES: HelpSection = HelpSection {
    name: "Group invites",
    order: 25,
};

pub const HELP_SECTION_GROUPS: HelpSection = HelpSection {
    name: "Groups",
    order: 30,
};

/// Register the WhatsApp command handlers.
pub fn register_commands(processor: &mut CommandProcessor<WhatsAppConnector>) {
    processor.register(Arc::new(AcceptCommand));
    processor.register(Arc::new(ListGroupsCommand));
    processor.register(Arc::new(TestSyncTimerCommand));
}

// ── accept ──────────────────────────────────────────────────────────────────

static ACCEPT_META: HandlerMeta = HandlerMeta {
    name: "accept",
    help: HelpMeta {
        section: HELP_SECTION_INVITES,
        description: "Accept a group invite. This can only be used in reply to a group invite message.",
        args: None,
    },
    requires_login: true,
    requires_portal: true,
};

pub struct AcceptCommand;

#[async_trait]
impl CommandHandler<WhatsAppConnector> for AcceptCommand {
    fn meta(&self) -> &HandlerMeta {
        &ACCEPT_META
    }

    async fn run(&self, ce: &CommandEvent, connector: &WhatsAppConnector) {
        let Some(reply_to) = &ce.reply_to else {
            ce.reply("You must reply to a group invite message when using this command.");
            return;
        };
        let Some(portal) = &ce.portal else {
            ce.reply("This command can only be used in portal rooms.");
            return;
        };
        let message = match connector.stores().messages.get_part_by_mxid(reply_to).await {
            Ok(Some(message)) => message,
            Ok(None) => {
                warn!(reply_to_mxid = %reply_to, "reply target event not found to handle accept command");
                ce.reply("Reply event not found");
                return;
            },
            Err(e) => {
                error!(reply_to_mxid = %reply_to, error = %e, "failed to get reply target event to handle accept command");
                ce.reply("Failed to get reply event");
                return;
            },
        };
        let Some(invite) = message.metadata.group_invite else {
            ce.reply("That doesn't look like a group invite message.");
            return;
        };
        if invite.inviter.user == portal.receiver.as_str() {
            ce.reply("You can't accept your own invites");
            return;
        }
        let Some(client) = connector.get_cached_client(&portal.receiver) else {
            ce.reply("Login not found");
            return;
        };
        if !client.is_logged_in() {
            ce.reply("Not logged in");
            return;
        }
        if invite.is_expired_at(Utc::now()) {
            ce.reply("That group invite has expired.");
            return;
        }
        match client
            .client
            .join_group_with_invite(&invite.jid, &invite.inviter, &invite.code, invite.expiration)
            .await
        {
            Ok(()) => {
                info!(user_login_id = %client.login.id, group = %invite.jid, "accepted group invite");
                ce.reply("Successfully accepted the invite, the portal should be created momentarily");
            },
            Err(e) => {
                error!(user_login_id = %client.login.id, group = %invite.jid, error = %e, "failed to accept group invite");
                ce.reply(format!("Failed to accept group invite: {e}"));
            },
        }
    }
}

// ── list-groups ─────────────────────────────────────────────────────────────

static LIST_GROUPS_META: HandlerMeta = HandlerMeta {
    name: "list-groups",
    help: HelpMeta {
        section: HELP_SECTION_GROUPS,
        description: "List all WhatsApp groups you are a member of.",
        args: None,
    },
    requires_login: true,
    requires_portal: false,
};

pub struct ListGroupsCommand;

#[async_trait]
impl CommandHandler<WhatsAppConnector> for ListGroupsCommand {
    fn meta(&self) -> &HandlerMeta {
        &LIST_GROUPS_META
    }

    async fn run(&self, ce: &CommandEvent, connector: &WhatsAppConnector) {
        let Some(client) = logged_in_client(ce, connector) else {
            return;
        };

        // Push the last sync past the cooldown so the next history sync runs.
        let forced = Utc::now() - HISTORY_SYNC_COOLDOWN - TimeDelta::seconds(1);
        client
            .login
            .update_metadata(|meta| meta.last_history_sync = forced)
            .await;
        info!(
            user_login_id = %client.login.id,
            last_history_sync = %forced,
            "last history sync time updated to force a whatsapp sync"
        );
        if let Err(e) = client.login.save().await {
            error!(user_login_id = %client.login.id, error = %e, "failed to save updated last history sync timestamp");
        }

        match client.export_groups().await {
            Ok(()) => ce.reply("Successfully exported your WhatsApp groups."),
            Err(e) => {
                error!(user_login_id = %client.login.id, error = %e, "failed to export whatsapp groups");
                ce.reply(format!("Failed to export WhatsApp groups: {e}"));
            },
        }
    }
}

// ── test-sync-timer ─────────────────────────────────────────────────────────

static TEST_SYNC_TIMER_META: HandlerMeta = HandlerMeta {
    name: "test-sync-timer",
    help: HelpMeta {
        section: HELP_SECTION_GROUPS,
        description: "Test the 24-hour sync timer restriction. Will attempt to trigger a sync without resetting the timer.",
        args: None,
    },
    requires_login: true,
    requires_portal: false,
};

pub struct TestSyncTimerCommand;

#[async_trait]
impl CommandHandler<WhatsAppConnector> for TestSyncTimerCommand {
    fn meta(&self) -> &HandlerMeta {
        &TEST_SYNC_TIMER_META
    }

    async fn run(&self, ce: &CommandEvent, connector: &WhatsAppConnector) {
        let Some(client) = logged_in_client(ce, connector) else {
            return;
        };

        let last_sync = client.login.metadata().await.last_history_sync;
        let since_last = Utc::now() - last_sync;
        info!(
            user_login_id = %client.login.id,
            last_history_sync = %last_sync,
            since_last_secs = since_last.num_seconds(),
            "testing sync timer without resetting it"
        );

        let evt = HistorySync {
            sync_type: HistorySyncType::InitialBootstrap,
            conversations: Vec::new(),
        };
        client.handle_history_sync(&evt).await;

        let elapsed = format_duration(since_last);
        if since_last < HISTORY_SYNC_COOLDOWN {
            ce.reply(format!(
                "Sync test completed: Last sync was {elapsed} ago, which is less than 24 hours. Check logs for 'SYNC SKIPPED' message."
            ));
        } else {
            ce.reply(format!(
                "Sync test completed: Last sync was {elapsed} ago, which is more than 24 hours. A new sync should have been initiated."
            ));
        }
    }
}

/// The user's default login, replying and returning `None` when it can't be
/// used.
fn logged_in_client(
    ce: &CommandEvent,
    connector: &WhatsAppConnector,
) -> Option<Arc<WhatsAppClient>> {
    let Some(client) = connector.default_client_for(&ce.user_mxid) else {
        ce.reply(
            "No WhatsApp account found. Please use !wa login to connect your WhatsApp account.",
        );
        return None;
    };
    if !client.is_logged_in() {
        ce.reply("Not logged in");
        return None;
    }
    Some(client)
}

/// Render a duration rounded to whole seconds, e.g. `25h0m3s`.
pub fn format_duration(d: TimeDelta) -> String {
    let millis = d.num_milliseconds();
    let negative = millis < 0;
    let secs = (millis.unsigned_abs() + 500) / 1000;
    let (h, m, s) = (secs / 3600, secs / 60 % 60, secs % 60);
    let sign = if negative && secs > 0 { "-" } else { "" };
    if h > 0 {
        format!("{sign}{h}h{m}m{s}s")
    } else if m > 0 {
        format!("{sign}{m}m{s}s")
    } else {
        format!("{sign}{s}s")
    }
}
