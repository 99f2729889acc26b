use std::collections::BTreeMap;

use crate::config::WebChatConfig;
use crate::url::normalize_base_url;

pub const HEADER_ORIGIN: &str = "origin";
pub const HEADER_REFERER: &str = "referer";
pub const HEADER_SAME_DOMAIN: &str = "x-same-domain";
pub const HEADER_USER_AGENT: &str = "user-agent";

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded;charset=UTF-8";

/// The service only answers browser-looking clients.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Headers sent on every request, before per-call additions such as `Cookie`.
pub fn default_headers(config: &WebChatConfig) -> BTreeMap<String, String> {
    let base = normalize_base_url(&config.base_url);
    let mut headers = BTreeMap::new();

    headers.insert(HEADER_ORIGIN.to_owned(), base.clone());
    headers.insert(HEADER_REFERER.to_owned(), format!("{base}/"));
    headers.insert(HEADER_SAME_DOMAIN.to_owned(), "1".to_owned());

    let ua = config
        .user_agent
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_USER_AGENT);
    headers.insert(HEADER_USER_AGENT.to_owned(), ua.to_owned());

    for (key, value) in &config.extra_headers {
        headers.insert(key.trim().to_ascii_lowercase(), value.trim().to_owned());
    }

    headers
}
