//! Group list export, triggered by the `list-groups` command.

use std::time::Duration;

use {
    async_trait::async_trait,
    mxwa_bridge::networkid::UserLoginId,
    mxwa_config::ExportConfig,
    serde::Serialize,
    tracing::debug,
};

use crate::types::GroupInfo;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("no export endpoint configured")]
    NotConfigured,
    #[error("export request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("export endpoint returned status {0}")]
    Status(u16),
    #[error(transparent)]
    Remote(#[from] anyhow::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupSummary {
    pub jid: String,
    pub name: String,
    pub topic: String,
    pub participant_count: usize,
    pub is_parent: bool,
}

impl From<&GroupInfo> for GroupSummary {
    fn from(g: &GroupInfo) -> Self {
        Self {
            jid: g.jid.to_string(),
            name: g.name.clone(),
            topic: g.topic.clone(),
            participant_count: g.participants.len(),
            is_parent: g.is_parent,
        }
    }
}

/// Destination for a login's group list.
#[async_trait]
pub trait GroupExporter: Send + Sync {
    async fn export(&self, login: &UserLoginId, groups: &[GroupSummary]) -> Result<(), ExportError>;
}

#[derive(Serialize)]
struct ExportRequest<'a> {
    login_id: &'a str,
    groups: &'a [GroupSummary],
}

/// Posts the group list as JSON to a configured endpoint.
pub struct HttpGroupExporter {
    client: reqwest::Client,
    endpoint: Option<String>,
    timeout: Duration,
}

impl HttpGroupExporter {
    pub fn from_config(config: &ExportConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.clone().filter(|e| !e.is_empty()),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

#[async_trait]
impl GroupExporter for HttpGroupExporter {
    async fn export(&self, login: &UserLoginId, groups: &[GroupSummary]) -> Result<(), ExportError> {
        let endpoint = self.endpoint.as_deref().ok_or(ExportError::NotConfigured)?;
        debug!(user_login_id = %login, count = groups.len(), endpoint, "exporting groups");

        let resp = self
            .client
            .post(endpoint)
            .timeout(self.timeout)
            .json(&ExportRequest {
                login_id: login.as_str(),
                groups,
            })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ExportError::Status(status.as_u16()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use {super::*, mockito::Matcher, mxwa_waid::{Server, new_jid}};

    fn summaries() -> Vec<GroupSummary> {
        vec![GroupSummary::from(&GroupInfo {
            jid: new_jid("120363000000000001", &Server::Group),
            name: "Family".into(),
            topic: "Weekend plans".into(),
            ..Default::default()
        })]
    }

    fn exporter(endpoint: Option<String>) -> HttpGroupExporter {
        HttpGroupExporter::from_config(&ExportConfig {
            endpoint,
            timeout_secs: 5,
        })
    }

    #[tokio::test]
    async fn posts_group_list_as_json() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/groups")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(serde_json::json!({
                "login_id": "15551234567",
                "groups": [{
                    "jid": "120363000000000001@g.us",
                    "name": "Family",
                    "topic": "Weekend plans",
                    "participant_count": 0,
                    "is_parent": false,
                }],
            })))
            .with_status(204)
            .create_async()
            .await;

        exporter(Some(format!("{}/groups", server.url())))
            .export(&UserLoginId::new("15551234567"), &summaries())
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/groups")
            .with_status(502)
            .create_async()
            .await;

        let err = exporter(Some(format!("{}/groups", server.url())))
            .export(&UserLoginId::new("15551234567"), &summaries())
            .await
            .unwrap_err();
        assert!(matches!(err, ExportError::Status(502)));
    }

    #[tokio::test]
    async fn missing_endpoint_is_not_configured() {
        for endpoint in [None, Some(String::new())] {
            let err = exporter(endpoint)
                .export(&UserLoginId::new("1"), &[])
                .await
                .unwrap_err();
            assert!(matches!(err, ExportError::NotConfigured));
        }
    }
}
