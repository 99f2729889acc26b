//! Session token scraping from the authenticated HTML app page.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::WebChatError;

/// Used when the page names no backend build at all.
pub const DEFAULT_BACKEND_VERSION: &str = "boq_assistant-bard-web-server_20240519.16_p0";

/// Nonce and backend version scraped from the bootstrap page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapTokens {
    pub nonce: String,
    pub backend_version: String,
}

fn nonce_regex() -> &'static Regex {
    static CACHED: OnceLock<Regex> = OnceLock::new();
    CACHED.get_or_init(|| Regex::new(r#""SNlM0e":"([^"]+)""#).expect("nonce regex must compile"))
}

fn backend_version_regex() -> &'static Regex {
    static CACHED: OnceLock<Regex> = OnceLock::new();
    CACHED.get_or_init(|| {
        Regex::new(r#""cfb2h":"([^"]+)""#).expect("backend version regex must compile")
    })
}

fn loose_backend_version_regex() -> &'static Regex {
    static CACHED: OnceLock<Regex> = OnceLock::new();
    CACHED.get_or_init(|| {
        Regex::new(r"boq_assistant-bard-web-server_[0-9A-Za-z._-]+")
            .expect("loose backend version regex must compile")
    })
}

/// Scrape the nonce and backend version from the bootstrap HTML.
///
/// A missing nonce means the cookies were not accepted.
pub fn scrape_tokens(html: &str) -> Result<BootstrapTokens, WebChatError> {
    let nonce = nonce_regex()
        .captures(html)
        .and_then(|captures| captures.get(1))
        .map(|value| value.as_str().to_owned())
        .ok_or(WebChatError::NonceNotFound)?;

    Ok(BootstrapTokens {
        nonce,
        backend_version: scrape_backend_version(html),
    })
}

pub fn scrape_backend_version(html: &str) -> String {
    if let Some(version) = backend_version_regex()
        .captures(html)
        .and_then(|captures| captures.get(1))
    {
        return version.as_str().to_owned();
    }

    if let Some(version) = loose_backend_version_regex().find(html) {
        return version.as_str().to_owned();
    }

    tracing::debug!("backend version not found in bootstrap page; using default");
    DEFAULT_BACKEND_VERSION.to_owned()
}
