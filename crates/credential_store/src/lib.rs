//! File-backed [`webchat_api::CredentialStore`].

mod error;
mod paths;
mod schema;
mod store;

pub use error::CredentialStoreError;
pub use paths::{credentials_path_in, default_credentials_path};
pub use schema::{CredentialFile, CREDENTIAL_FILE_VERSION};
pub use store::FileCredentialStore;
