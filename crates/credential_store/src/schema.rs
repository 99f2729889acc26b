use serde::{Deserialize, Serialize};
use webchat_api::CookieJar;

pub const CREDENTIAL_FILE_VERSION: u32 = 1;

/// On-disk credential file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CredentialFile {
    pub version: u32,
    pub updated_at: String,
    pub cookies: CookieJar,
}

impl CredentialFile {
    #[must_use]
    pub fn v1(updated_at: impl Into<String>, cookies: CookieJar) -> Self {
        Self {
            version: CREDENTIAL_FILE_VERSION,
            updated_at: updated_at.into(),
            cookies,
        }
    }
}
