//! Environment configuration.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const BASE_URL_ENV: &str = "CHATSHELL_BASE_URL";
pub const LANGUAGE_ENV: &str = "CHATSHELL_LANGUAGE";
pub const CREDENTIALS_PATH_ENV: &str = "CHATSHELL_CREDENTIALS_PATH";
pub const TIMEOUT_SECS_ENV: &str = "CHATSHELL_TIMEOUT_SECS";
pub const LOG_ENV: &str = "CHATSHELL_LOG";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvConfig {
    pub base_url: Option<String>,
    pub language: Option<String>,
    pub credentials_path: Option<PathBuf>,
    pub timeout: Option<Duration>,
    pub log_filter: Option<String>,
}

impl EnvConfig {
    pub fn from_env() -> Self {
        Self {
            base_url: env_string_opt(BASE_URL_ENV),
            language: env_string_opt(LANGUAGE_ENV),
            credentials_path: env_string_opt(CREDENTIALS_PATH_ENV).map(PathBuf::from),
            timeout: env_string_opt(TIMEOUT_SECS_ENV).and_then(|value| parse_timeout(&value)),
            log_filter: env_string_opt(LOG_ENV),
        }
    }
}

/// Whole seconds; zero or unparsable means no timeout.
fn parse_timeout(value: &str) -> Option<Duration> {
    value
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        if value.trim().is_empty() {
            None
        } else {
            Some(value)
        }
    })
}
