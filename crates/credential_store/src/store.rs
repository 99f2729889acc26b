use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use webchat_api::{BoxError, CookieJar, CredentialStore};

use crate::error::CredentialStoreError;
use crate::paths::{default_credentials_path, staging_path};
use crate::schema::{CredentialFile, CREDENTIAL_FILE_VERSION};

/// Auth cookies kept in a versioned JSON file, rewritten atomically.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn at_default_location() -> Result<Self, CredentialStoreError> {
        default_credentials_path()
            .map(Self::new)
            .ok_or(CredentialStoreError::NoConfigDir)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and validate the file; `None` when it does not exist yet.
    pub fn load_file(&self) -> Result<Option<CredentialFile>, CredentialStoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(source) if source.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(CredentialStoreError::io(
                    "reading credential file",
                    &self.path,
                    source,
                ))
            }
        };

        let file = serde_json::from_str::<CredentialFile>(&raw)
            .map_err(|source| CredentialStoreError::json_parse(&self.path, source))?;
        validate_file(&self.path, &file)?;
        Ok(Some(file))
    }

    /// Stored cookies; an empty jar when the file does not exist.
    pub fn load(&self) -> Result<CookieJar, CredentialStoreError> {
        Ok(self
            .load_file()?
            .map(|file| file.cookies)
            .unwrap_or_default())
    }

    /// Replace the file with `cookies`, stamped with the current time.
    pub fn save(&self, cookies: &CookieJar) -> Result<(), CredentialStoreError> {
        let file = CredentialFile::v1(now_rfc3339()?, cookies.clone());
        let mut encoded = serde_json::to_vec_pretty(&file)
            .map_err(|source| CredentialStoreError::json_serialize(&self.path, source))?;
        encoded.push(b'\n');

        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| {
                CredentialStoreError::io("creating credential directory", parent, source)
            })?;
        }

        let staging = staging_path(&self.path);
        write_private(&staging, &encoded)
            .map_err(|source| CredentialStoreError::io("writing credential file", &staging, source))?;
        if let Err(source) = fs::rename(&staging, &self.path) {
            let _ = fs::remove_file(&staging);
            return Err(CredentialStoreError::io(
                "replacing credential file",
                &self.path,
                source,
            ));
        }

        tracing::debug!(path = %self.path.display(), cookies = cookies.len(), "saved credentials");
        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn credentials(&self) -> Result<CookieJar, BoxError> {
        Ok(self.load()?)
    }

    fn persist(&self, cookies: &CookieJar) -> Result<(), BoxError> {
        Ok(self.save(cookies)?)
    }
}

fn validate_file(path: &Path, file: &CredentialFile) -> Result<(), CredentialStoreError> {
    if file.version != CREDENTIAL_FILE_VERSION {
        return Err(CredentialStoreError::UnsupportedVersion {
            path: path.to_path_buf(),
            found: file.version,
        });
    }

    if OffsetDateTime::parse(&file.updated_at, &Rfc3339).is_err() {
        return Err(CredentialStoreError::InvalidTimestamp {
            path: path.to_path_buf(),
            value: file.updated_at.clone(),
        });
    }

    Ok(())
}

fn now_rfc3339() -> Result<String, CredentialStoreError> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .map_err(CredentialStoreError::ClockFormat)
}

#[cfg(unix)]
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(contents)?;
    file.sync_all()
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(contents)?;
    file.sync_all()
}
