use {
    anyhow::{Context, Result, bail},
    mxwa_bridge::{Avatar, AvatarSource},
    mxwa_waid::parse_portal_id,
    tracing::debug,
};

use crate::client::WhatsAppClient;

impl WhatsAppClient {
    /// Download the bytes behind an avatar.
    pub async fn resolve_avatar(&self, avatar: &Avatar) -> Result<Option<Vec<u8>>> {
        match &avatar.source {
            AvatarSource::Absent => Ok(None),
            AvatarSource::Direct { direct_path } => {
                let bytes = self.client.download_media_with_path(direct_path).await?;
                Ok(Some(bytes))
            },
            AvatarSource::NeedsFullFetch { portal_id } => {
                debug!(portal_id = %portal_id, avatar_id = %avatar.id, "fetching full res avatar");
                let jid = parse_portal_id(portal_id)?;
                let meta = self
                    .client
                    .get_newsletter_info(&jid)
                    .await
                    .context("failed to fetch full res avatar info")?;
                let Some(picture) = meta.thread_meta.picture else {
                    bail!("full res avatar info is missing");
                };
                let bytes = self
                    .client
                    .download_media_with_path(&picture.direct_path)
                    .await?;
                Ok(Some(bytes))
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            test_support::TestBridge,
            types::{NewsletterMetadata, NewsletterThreadMeta, ProfilePicture},
        },
        mxwa_bridge::networkid::{AvatarId, PortalId},
        mxwa_waid::{Jid, Server, new_jid},
    };

    fn newsletter_jid() -> Jid {
        new_jid("120363111111111111", &Server::Newsletter)
    }

    #[tokio::test]
    async fn absent_avatar_has_no_bytes() {
        let bridge = TestBridge::new().await;
        let bytes = bridge.client.resolve_avatar(&Avatar::remove()).await.unwrap();
        assert!(bytes.is_none());
    }

    #[tokio::test]
    async fn direct_avatar_downloads_path() {
        let bridge = TestBridge::new().await;
        bridge
            .wa
            .media
            .lock()
            .unwrap()
            .insert("/v/pic".into(), b"jpeg".to_vec());

        let bytes = bridge
            .client
            .resolve_avatar(&Avatar {
                id: AvatarId::from("pic"),
                remove: false,
                source: AvatarSource::Direct {
                    direct_path: "/v/pic".into(),
                },
            })
            .await
            .unwrap();
        assert_eq!(bytes.as_deref(), Some(&b"jpeg"[..]));
    }

    #[tokio::test]
    async fn preview_avatar_refetches_full_picture() {
        let bridge = TestBridge::new().await;
        bridge.wa.add_newsletter(NewsletterMetadata {
            id: newsletter_jid(),
            thread_meta: NewsletterThreadMeta {
                picture: Some(ProfilePicture {
                    id: "full".into(),
                    direct_path: "/v/full".into(),
                }),
                ..Default::default()
            },
            viewer_meta: None,
        });
        bridge
            .wa
            .media
            .lock()
            .unwrap()
            .insert("/v/full".into(), b"full".to_vec());

        let bytes = bridge
            .client
            .resolve_avatar(&Avatar {
                id: AvatarId::from("preview"),
                remove: false,
                source: AvatarSource::NeedsFullFetch {
                    portal_id: PortalId::new(newsletter_jid().to_string()),
                },
            })
            .await
            .unwrap();
        assert_eq!(bytes.as_deref(), Some(&b"full"[..]));
    }

    #[tokio::test]
    async fn preview_avatar_errors() {
        let bridge = TestBridge::new().await;
        let avatar = Avatar {
            id: AvatarId::from("preview"),
            remove: false,
            source: AvatarSource::NeedsFullFetch {
                portal_id: PortalId::new(newsletter_jid().to_string()),
            },
        };

        let err = bridge.client.resolve_avatar(&avatar).await.unwrap_err();
        assert_eq!(err.to_string(), "failed to fetch full res avatar info");

        bridge.wa.add_newsletter(NewsletterMetadata {
            id: newsletter_jid(),
            ..Default::default()
        });
        let err = bridge.client.resolve_avatar(&avatar).await.unwrap_err();
        assert_eq!(err.to_string(), "full res avatar info is missing");
    }
}
