//! Staging configuration

use crate::error::{Result, StageError};
use std::path::PathBuf;

/// Where staged files go and how remote hosts are reached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageConfig {
    /// Root of the staging tree on the remote host
    pub tmp_root: PathBuf,
    /// Tool prefix of the per-user directory (`<prefix>-<user>`)
    pub prefix: String,
    /// User name for the per-user directory; `None` asks the OS
    pub user: Option<String>,
    /// Program used to run remote commands
    pub remote_shell: String,
    /// Program used to upload files
    pub copy_program: String,
    /// Extra `-o` options passed to both programs
    pub ssh_options: Vec<String>,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            tmp_root: PathBuf::from("/tmp"),
            prefix: "labgrid".to_string(),
            user: None,
            remote_shell: "ssh".to_string(),
            copy_program: "scp".to_string(),
            ssh_options: Vec::new(),
        }
    }
}

impl StageConfig {
    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns [`StageError::InvalidConfig`] if:
    /// - the staging root is not absolute
    /// - the prefix is empty or contains `/`
    /// - an explicit user is empty or contains `/`
    /// - the remote shell or copy program is empty
    pub fn validate(&self) -> Result<()> {
        if !self.tmp_root.is_absolute() {
            return Err(StageError::InvalidConfig(format!(
                "staging root must be absolute: {}",
                self.tmp_root.display()
            )));
        }

        if self.prefix.is_empty() || self.prefix.contains('/') {
            return Err(StageError::InvalidConfig(format!(
                "invalid staging prefix: {:?}",
                self.prefix
            )));
        }

        if let Some(user) = &self.user {
            if user.is_empty() || user.contains('/') {
                return Err(StageError::InvalidConfig(format!(
                    "invalid user name: {user:?}"
                )));
            }
        }

        if self.remote_shell.is_empty() || self.copy_program.is_empty() {
            return Err(StageError::InvalidConfig(
                "remote shell and copy program must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}
