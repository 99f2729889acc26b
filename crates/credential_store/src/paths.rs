use std::path::{Path, PathBuf};

pub const CREDENTIALS_DIR: &str = "chatshell";
pub const CREDENTIALS_FILE: &str = "credentials.json";

/// `<config_dir>/chatshell/credentials.json`, when the platform has a config dir.
#[must_use]
pub fn default_credentials_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| credentials_path_in(&dir))
}

#[must_use]
pub fn credentials_path_in(config_dir: &Path) -> PathBuf {
    config_dir.join(CREDENTIALS_DIR).join(CREDENTIALS_FILE)
}

/// Sibling path the next version is written to before it replaces `path`.
#[must_use]
pub(crate) fn staging_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| CREDENTIALS_FILE.to_owned());
    path.with_file_name(format!(".{name}.tmp-{}", std::process::id()))
}
