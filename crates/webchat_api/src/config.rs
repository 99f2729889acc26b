use std::collections::BTreeMap;
use std::time::Duration;

use crate::error::WebChatError;
use crate::url::{normalize_base_url, DEFAULT_BASE_URL};

/// Default `hl` query parameter.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Transport configuration for the chat web RPC.
#[derive(Debug, Clone)]
pub struct WebChatConfig {
    /// Origin of the web app, e.g. `https://gemini.google.com`.
    pub base_url: String,
    /// Language sent as `hl` when a turn does not carry its own.
    pub language: String,
    /// Optional `User-Agent` override.
    pub user_agent: Option<String>,
    /// Additional headers merged into request headers.
    pub extra_headers: BTreeMap<String, String>,
    /// Optional request timeout.
    pub timeout: Option<Duration>,
}

impl Default for WebChatConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            user_agent: None,
            extra_headers: BTreeMap::new(),
            timeout: None,
        }
    }
}

impl WebChatConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn insert_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.insert(key.into(), value.into());
        self
    }

    /// Language for a turn: the turn's own when set, else the configured one, else `"en"`.
    pub fn language_for<'a>(&'a self, requested: Option<&'a str>) -> &'a str {
        requested
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .or_else(|| Some(self.language.trim()).filter(|value| !value.is_empty()))
            .unwrap_or(DEFAULT_LANGUAGE)
    }

    /// Reject settings no request could be built from.
    pub fn validate(&self) -> Result<(), WebChatError> {
        let base = normalize_base_url(&self.base_url);
        if !(base.starts_with("https://") || base.starts_with("http://")) {
            return Err(WebChatError::InvalidConfig(format!(
                "base URL must start with http:// or https://, got {base}"
            )));
        }
        if self.timeout.is_some_and(|timeout| timeout.is_zero()) {
            return Err(WebChatError::InvalidConfig(
                "timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
