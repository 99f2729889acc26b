use reqwest::StatusCode;
use thiserror::Error;

/// Boxed error returned by credential-store collaborators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Coarse error category surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Credentials or settings are missing or invalid; the user must reconfigure.
    Configuration,
    /// The service rejected the session (no nonce in the bootstrap page).
    Authentication,
    /// The service could not be reached.
    Transport,
    /// The chat call returned a non-success HTTP status.
    ProtocolStatus,
}

#[derive(Debug, Error)]
pub enum WebChatError {
    #[error("missing credentials: {}", .missing.join(", "))]
    MissingCredentials { missing: Vec<&'static str> },

    #[error(
        "stored cookie {} contains characters that cannot be sent in a request header",
        .names.join(", ")
    )]
    InvalidCredentials { names: Vec<String> },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("session nonce not found in bootstrap page; cookies are likely invalid or expired")]
    NonceNotFound,

    #[error("request error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),

    #[error("invalid header: {0}")]
    InvalidHeader(String),

    #[error("HTTP {} {message}", .status.as_u16())]
    Status { status: StatusCode, message: String },

    #[error("credential store failed: {0}")]
    CredentialStore(#[source] BoxError),
}

impl WebChatError {
    #[must_use]
    pub fn status(status: StatusCode) -> Self {
        Self::Status {
            status,
            message: status_text(status),
        }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingCredentials { .. }
            | Self::InvalidCredentials { .. }
            | Self::InvalidConfig(_)
            | Self::CredentialStore(_) => ErrorKind::Configuration,
            Self::NonceNotFound => ErrorKind::Authentication,
            Self::Transport(_) | Self::HttpClientBuild(_) | Self::InvalidHeader(_) => {
                ErrorKind::Transport
            }
            Self::Status { .. } => ErrorKind::ProtocolStatus,
        }
    }

    /// Actionable text for errors the user can fix by reconfiguring.
    #[must_use]
    pub fn remediation(&self) -> Option<&'static str> {
        match self.kind() {
            ErrorKind::Configuration => Some(
                "Run `chatshell credentials set --psid <value> --psidts <value>` with cookies copied from a signed-in browser session.",
            ),
            ErrorKind::Authentication => Some(
                "Your session cookies were rejected. Copy fresh __Secure-1PSID and __Secure-1PSIDTS values from the browser and run `chatshell credentials set` again.",
            ),
            ErrorKind::Transport | ErrorKind::ProtocolStatus => None,
        }
    }
}

/// Status line text, e.g. `"Too Many Requests"`.
#[must_use]
pub fn status_text(status: StatusCode) -> String {
    status
        .canonical_reason()
        .unwrap_or("request failed")
        .to_string()
}
