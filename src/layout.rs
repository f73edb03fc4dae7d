//! Remote path resolution
//!
//! Staged files live at `<tmp-root>/<prefix>-<user>/<sha256-hex>/<basename>`.
//! The per-user segment keeps users on a shared host from tripping over each
//! other's permissions; the per-hash segment makes identical content from any
//! path or invocation resolve to the same directory.

use crate::config::StageConfig;
use crate::hash::ContentHash;
use std::path::Path;

/// Name of the invoking local user
///
/// `$USER` wins when set and non-empty, otherwise the OS account name.
pub fn current_user() -> String {
    match std::env::var("USER") {
        Ok(user) if !user.is_empty() => user,
        _ => whoami::username(),
    }
}

/// Resolves content-addressed staging directories
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingLayout {
    root: String,
    prefix: String,
    user: String,
}

impl StagingLayout {
    pub fn new(root: impl Into<String>, prefix: impl Into<String>, user: impl Into<String>) -> Self {
        let mut root = root.into();
        while root.len() > 1 && root.ends_with('/') {
            root.pop();
        }
        Self {
            root,
            prefix: prefix.into(),
            user: user.into(),
        }
    }

    /// Layout for `config`, resolving the user if none is configured
    pub fn from_config(config: &StageConfig) -> Self {
        let user = config.user.clone().unwrap_or_else(current_user);
        Self::new(config.tmp_root.to_string_lossy(), config.prefix.clone(), user)
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    /// Per-user directory, with trailing slash
    pub fn user_dir(&self) -> String {
        let sep = if self.root.ends_with('/') { "" } else { "/" };
        format!("{}{sep}{}-{}/", self.root, self.prefix, self.user)
    }

    /// Staging directory for `hash`, with trailing slash
    pub fn staging_dir(&self, hash: &ContentHash) -> String {
        format!("{}{}/", self.user_dir(), hash.to_hex())
    }
}

/// Directory containing `path`, as a string with trailing slash
pub fn parent_dir(path: &Path) -> String {
    let parent = path
        .parent()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default();
    if parent.ends_with('/') {
        parent
    } else {
        format!("{parent}/")
    }
}

/// Final name of `path`
pub fn basename(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Join a slash-terminated directory and a file name
pub fn join_remote(dir: &str, name: &str) -> String {
    if dir.ends_with('/') {
        format!("{dir}{name}")
    } else {
        format!("{dir}/{name}")
    }
}
