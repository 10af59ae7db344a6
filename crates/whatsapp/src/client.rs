//! Per-login WhatsApp client wrapper.

use std::sync::Arc;

use {
    anyhow::Result,
    mxwa_bridge::{EventSender, UserInfo, UserLogin},
    mxwa_config::{DisplaynameParams, DisplaynameTemplate},
    mxwa_waid::{Jid, Server, UserLoginMetadata, make_user_id, make_user_login_id},
    tracing::{debug, info},
};

use crate::{
    device_store::Device,
    export::{ExportError, GroupExporter, GroupSummary},
    remote::WaClient,
};

/// One loaded login together with its protocol client.
pub struct WhatsAppClient {
    pub login: Arc<UserLogin<UserLoginMetadata>>,
    /// Our own AD jid.
    pub jid: Jid,
    pub device: Device,
    pub client: Arc<dyn WaClient>,
    displayname: Arc<DisplaynameTemplate>,
    exporter: Arc<dyn GroupExporter>,
}

impl WhatsAppClient {
    pub fn new(
        login: Arc<UserLogin<UserLoginMetadata>>,
        jid: Jid,
        device: Device,
        client: Arc<dyn WaClient>,
        displayname: Arc<DisplaynameTemplate>,
        exporter: Arc<dyn GroupExporter>,
    ) -> Self {
        Self {
            login,
            jid,
            device,
            client,
            displayname,
            exporter,
        }
    }

    pub fn make_event_sender(&self, jid: &Jid) -> EventSender {
        let sender_login = make_user_login_id(jid);
        EventSender {
            is_from_me: sender_login == self.login.id,
            sender: make_user_id(jid),
            sender_login: Some(sender_login),
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.client.is_logged_in()
    }

    /// Ghost profile for a WhatsApp user.
    pub async fn user_info_for(&self, jid: &Jid) -> Result<UserInfo> {
        let contact = self.client.get_contact(jid).await?.unwrap_or_default();
        let phone = if Server::of(jid) == Server::DefaultUser {
            format!("+{}", jid.user)
        } else {
            String::new()
        };
        let name = self.displayname.render(&DisplaynameParams {
            push_name: contact.push_name,
            business_name: contact.business_name,
            full_name: contact.full_name,
            first_name: contact.first_name,
            phone: phone.clone(),
            jid: jid.to_non_ad().to_string(),
        });
        debug!(user_login_id = %self.login.id, user = %jid, "fetched user info");

        Ok(UserInfo {
            name: Some(name),
            identifiers: if phone.is_empty() {
                Vec::new()
            } else {
                vec![format!("tel:{phone}")]
            },
            is_bot: Some(false),
        })
    }

    /// Send the list of joined groups to the configured exporter.
    pub async fn export_groups(&self) -> Result<(), ExportError> {
        let groups = self.client.get_joined_groups().await?;
        let summaries: Vec<GroupSummary> = groups.iter().map(GroupSummary::from).collect();
        self.exporter.export(&self.login.id, &summaries).await?;
        info!(
            user_login_id = %self.login.id,
            count = summaries.len(),
            "exported joined groups"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            test_support::TestBridge,
            types::{ContactInfo, GroupInfo},
        },
        mxwa_waid::new_jid,
    };

    #[tokio::test]
    async fn user_info_renders_displayname_template() {
        let bridge = TestBridge::new().await;
        let peer = new_jid("15557654321", &Server::DefaultUser);
        bridge.wa.contacts.lock().unwrap().insert(peer.clone(), ContactInfo {
            push_name: "Bob".into(),
            ..Default::default()
        });

        let info = bridge.client.user_info_for(&peer).await.unwrap();
        assert_eq!(info.name.as_deref(), Some("Bob (WA)"));
        assert_eq!(info.identifiers, vec!["tel:+15557654321".to_string()]);
        assert_eq!(info.is_bot, Some(false));
    }

    #[tokio::test]
    async fn user_info_falls_back_to_phone() {
        let bridge = TestBridge::new().await;
        let peer = new_jid("15557654321", &Server::DefaultUser);

        let info = bridge.client.user_info_for(&peer).await.unwrap();
        assert_eq!(info.name.as_deref(), Some("+15557654321 (WA)"));
    }

    #[tokio::test]
    async fn hidden_users_have_no_phone_identifier() {
        let bridge = TestBridge::new().await;
        let peer = new_jid("9876543210", &Server::HiddenUser);
        bridge.wa.contacts.lock().unwrap().insert(peer.clone(), ContactInfo {
            business_name: "Shop".into(),
            ..Default::default()
        });

        let info = bridge.client.user_info_for(&peer).await.unwrap();
        assert_eq!(info.name.as_deref(), Some("Shop (WA)"));
        assert!(info.identifiers.is_empty());
    }

    #[tokio::test]
    async fn event_sender_marks_own_messages() {
        let bridge = TestBridge::new().await;
        let own = bridge.client.make_event_sender(&bridge.client.jid);
        assert!(own.is_from_me);
        assert_eq!(own.sender.as_str(), TestBridge::OWN_USER);

        let other = bridge
            .client
            .make_event_sender(&new_jid("15557654321", &Server::DefaultUser));
        assert!(!other.is_from_me);
        assert_eq!(
            other.sender_login.as_ref().map(|l| l.as_str()),
            Some("15557654321")
        );
    }

    #[tokio::test]
    async fn export_sends_joined_groups() {
        let bridge = TestBridge::new().await;
        bridge.wa.add_group(GroupInfo {
            jid: new_jid("120363000000000001", &Server::Group),
            name: "Family".into(),
            ..Default::default()
        });

        bridge.client.export_groups().await.unwrap();
        let calls = bridge.exporter.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0.as_str(), TestBridge::OWN_USER);
        assert_eq!(calls[0].1[0].name, "Family");
    }
}
