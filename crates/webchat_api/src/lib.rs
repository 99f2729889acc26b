//! Client for a browser-only chat backend's web RPC.
//!
//! The crate scrapes a per-session nonce and backend version from the
//! authenticated app page, encodes chat turns into the doubly JSON-encoded
//! `f.req` form field, and decodes the XSSI-guarded, length-prefixed frame
//! stream back into reply text and continuation ids.
//!
//! Auth cookies come from a [`CredentialStore`]; cookies rotated by the
//! service are written back through it. Decoding never fails: unexpected
//! frames degrade to the raw response text.

pub mod bootstrap;
pub mod client;
pub mod codec;
pub mod config;
pub mod cookies;
pub mod credentials;
pub mod error;
pub mod headers;
pub mod payload;
pub mod retry;
pub mod session;
pub mod transport;
pub mod url;

pub use bootstrap::BootstrapTokens;
pub use client::WebChatClient;
pub use codec::{decode_response, encode_request, DecodedResponse};
pub use config::WebChatConfig;
pub use cookies::CookieJar;
pub use credentials::{CredentialStore, MemoryCredentialStore};
pub use error::{BoxError, ErrorKind, WebChatError};
pub use payload::{ChatTurnRequest, ChatTurnResult, ConversationContext};
pub use session::Session;
pub use transport::{HttpReply, ReqwestTransport, Transport};
