//! Latest-version resolver.
//!
//! Scrapes the vendor downloads page for the first link to a `.dmg` installer.

use anyhow::{Context, Result};
use regex::bytes::Regex;
use std::sync::OnceLock;
use tracing::{debug, info};
use url::Url;

use crate::http::HttpSource;

const INSTALLER_LINK_PATTERN: &str = r"(http|ftp|https)://([\w_-]+(?:(?:\.[\w_-]+)+))([\w.,@?^=%&:/~+#-]*[\w@?^=%&/~+#-])?.dmg";

fn installer_link_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(INSTALLER_LINK_PATTERN).expect("installer link pattern is valid"))
}

/// Returns the first installer link found in `body`, exactly as it appears.
pub fn find_installer_url(body: &[u8]) -> Option<String> {
    installer_link_regex()
        .find(body)
        .map(|m| String::from_utf8_lossy(m.as_bytes()).into_owned())
}

/// Fetches `page_url` and returns the installer link it advertises.
///
/// # Errors
///
/// Returns an error if the page cannot be fetched or drained, or if it
/// contains no installer link.
pub async fn resolve_latest(http: &dyn HttpSource, page_url: &str) -> Result<String> {
    info!("Fetching downloads page {}", page_url);

    let body = http
        .get_bytes(page_url)
        .await
        .with_context(|| format!("Error getting downloads page {}", page_url))?;
    debug!("Downloads page is {} bytes", body.len());

    let link = find_installer_url(&body)
        .with_context(|| format!("No installer link found on {}", page_url))?;

    let parsed = Url::parse(&link).with_context(|| format!("Invalid installer link: {}", link))?;
    debug!(host = ?parsed.host_str(), "Installer link resolved");

    Ok(link)
}
