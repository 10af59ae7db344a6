//! Lookup of the current WhatsApp web client version.

use tracing::debug;

use crate::types::WaVersion;

pub const WEB_VERSION_URL: &str = "https://web.whatsapp.com/sw.js";

#[derive(Debug, thiserror::Error)]
pub enum VersionError {
    #[error("version request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("version endpoint returned status {0}")]
    Status(u16),
    #[error("client revision not found in response")]
    RevisionNotFound,
}

/// Extract the `client_revision` number from the web client's service worker.
/// The key may appear with escaped quotes.
pub fn parse_client_revision(body: &str) -> Option<u32> {
    body.match_indices("client_revision").find_map(|(i, key)| {
        let rest = body[i + key.len()..].trim_start_matches(['\\', '"']);
        let rest = rest.strip_prefix(':')?.trim_start();
        let end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        rest[..end].parse().ok()
    })
}

pub async fn fetch_latest_version(
    http: &reqwest::Client,
    url: &str,
) -> Result<WaVersion, VersionError> {
    let resp = http.get(url).send().await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(VersionError::Status(status.as_u16()));
    }
    let body = resp.text().await?;
    let patch = parse_client_revision(&body).ok_or(VersionError::RevisionNotFound)?;
    let version = WaVersion {
        patch,
        ..WaVersion::HARDCODED
    };
    debug!(%version, "fetched whatsapp web version");
    Ok(version)
}
