//! Chat command dispatch.
//!
//! Connectors register handlers; the processor checks preconditions, routes
//! by name and renders `help`. Handlers report back only through
//! [`CommandEvent::reply`].

use std::{collections::HashMap, sync::Arc};

use {
    async_trait::async_trait,
    tokio::sync::mpsc,
    tracing::{debug, warn},
};

use crate::networkid::{EventId, PortalId, UserLoginId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HelpSection {
    pub name: &'static str,
    pub order: i32,
}

#[derive(Debug, Clone, Copy)]
pub struct HelpMeta {
    pub section: HelpSection,
    pub description: &'static str,
    pub args: Option<&'static str>,
}

#[derive(Debug, Clone, Copy)]
pub struct HandlerMeta {
    pub name: &'static str,
    pub help: HelpMeta,
    pub requires_login: bool,
    pub requires_portal: bool,
}

/// The portal a command was sent in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalRef {
    pub id: PortalId,
    pub receiver: UserLoginId,
}

/// One invocation of a command.
#[derive(Debug)]
pub struct CommandEvent {
    pub command: String,
    pub args: Vec<String>,
    pub user_mxid: String,
    pub portal: Option<PortalRef>,
    pub reply_to: Option<EventId>,
    replies: mpsc::UnboundedSender<String>,
}

impl CommandEvent {
    pub fn new(
        command: impl Into<String>,
        user_mxid: impl Into<String>,
        replies: mpsc::UnboundedSender<String>,
    ) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            user_mxid: user_mxid.into(),
            portal: None,
            reply_to: None,
            replies,
        }
    }

    /// Build an event from a message body such as `!wa accept`.
    ///
    /// Returns `None` when the body doesn't start with `prefix` or names no
    /// command.
    pub fn parse(
        body: &str,
        prefix: &str,
        user_mxid: impl Into<String>,
        replies: mpsc::UnboundedSender<String>,
    ) -> Option<Self> {
        let rest = body.trim().strip_prefix(prefix)?;
        let mut words = rest.split_whitespace();
        let command = words.next()?.to_lowercase();
        let mut ce = Self::new(command, user_mxid, replies);
        ce.args = words.map(str::to_string).collect();
        Some(ce)
    }

    pub fn with_portal(mut self, portal: PortalRef) -> Self {
        self.portal = Some(portal);
        self
    }

    pub fn with_reply_to(mut self, reply_to: EventId) -> Self {
        self.reply_to = Some(reply_to);
        self
    }

    /// Send a reply to the room the command came from.
    pub fn reply(&self, text: impl Into<String>) {
        if self.replies.send(text.into()).is_err() {
            warn!(command = %self.command, "reply channel closed, dropping command reply");
        }
    }
}

/// State a command processor needs from the surrounding bridge.
pub trait CommandContext: Send + Sync {
    fn user_has_login(&self, user_mxid: &str) -> bool;
}

#[async_trait]
pub trait CommandHandler<C: ?Sized>: Send + Sync {
    fn meta(&self) -> &HandlerMeta;
    async fn run(&self, ce: &CommandEvent, ctx: &C);
}

/// Registry of command handlers keyed by name.
pub struct CommandProcessor<C: ?Sized> {
    handlers: HashMap<&'static str, Arc<dyn CommandHandler<C>>>,
}

impl<C: ?Sized> Default for CommandProcessor<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ?Sized> CommandProcessor<C> {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn register(&mut self, handler: Arc<dyn CommandHandler<C>>) {
        self.handlers.insert(handler.meta().name, handler);
    }

    /// Render the help listing, grouped by section order then command name.
    pub fn help_text(&self) -> String {
        let mut metas: Vec<&HandlerMeta> = self.handlers.values().map(|h| h.meta()).collect();
        metas.sort_by(|a, b| {
            (a.help.section.order, a.help.section.name, a.name).cmp(&(
                b.help.section.order,
                b.help.section.name,
                b.name,
            ))
        });

        let mut out = String::new();
        let mut current: Option<HelpSection> = None;
        for meta in metas {
            if current != Some(meta.help.section) {
                if current.is_some() {
                    out.push('\n');
                }
                out.push_str(&format!("#### {}\n", meta.help.section.name));
                current = Some(meta.help.section);
            }
            match meta.help.args {
                Some(args) => out.push_str(&format!(
                    "**{}** {} - {}\n",
                    meta.name, args, meta.help.description
                )),
                None => out.push_str(&format!("**{}** - {}\n", meta.name, meta.help.description)),
            }
        }
        out
    }
}

impl<C: CommandContext + ?Sized> CommandProcessor<C> {
    /// Route a command to its handler after checking preconditions.
    pub async fn handle(&self, ce: &CommandEvent, ctx: &C) {
        if ce.command == "help" {
            ce.reply(self.help_text());
            return;
        }
        let Some(handler) = self.handlers.get(ce.command.as_str()) else {
            ce.reply("Unknown command, use the `help` command for help.");
            return;
        };
        let meta = handler.meta();
        if meta.requires_portal && ce.portal.is_none() {
            ce.reply("This command can only be used in portal rooms.");
            return;
        }
        if meta.requires_login && !ctx.user_has_login(&ce.user_mxid) {
            ce.reply("You're not logged in.");
            return;
        }
        debug!(command = meta.name, user = %ce.user_mxid, "running command");
        handler.run(ce, ctx).await;
    }
}
