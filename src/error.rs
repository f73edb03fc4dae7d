//! Error handling and types

use std::path::PathBuf;
use thiserror::Error;

/// Which side of a status comparison a probe ran on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeSide {
    Local,
    Remote,
}

impl std::fmt::Display for ProbeSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local => f.write_str("local"),
            Self::Remote => f.write_str("remote"),
        }
    }
}

/// Failures raised by a [`Session`](crate::session::Session)
#[derive(Error, Debug)]
pub enum TransportError {
    /// The helper process (ssh, scp, sh) could not be started
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// A checked command exited non-zero
    #[error("command `{command}` exited with code {code}: {stderr}")]
    CommandFailed {
        command: String,
        code: i32,
        stderr: String,
    },

    /// File upload exited non-zero
    #[error("upload of {} to {remote} failed with code {code}: {stderr}", .local.display())]
    Upload {
        local: PathBuf,
        remote: String,
        code: i32,
        stderr: String,
    },
}

/// Staging errors
#[derive(Error, Debug)]
pub enum StageError {
    /// Local file missing at construction
    #[error("local file {} not found", .path.display())]
    NotFound { path: PathBuf },

    /// Local path exists but is not a regular file
    #[error("local path {} is not a regular file", .path.display())]
    NotAFile { path: PathBuf },

    /// A status probe exited non-zero; callers downgrade this to "different"
    #[error("{side} stat probe exited with code {code}")]
    ProbeFailure { side: ProbeSide, code: i32 },

    /// Session open, remote mkdir or upload failed
    #[error("transfer to {host} failed: {source}")]
    Transfer {
        host: String,
        #[source]
        source: TransportError,
    },

    /// Remote path requested before it was resolved
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// Standard I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration error
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl StageError {
    /// Wrap a transport failure with the host it happened on
    pub fn transfer(host: impl Into<String>, source: TransportError) -> Self {
        Self::Transfer {
            host: host.into(),
            source,
        }
    }

    /// Check if this is the fail-safe probe condition
    pub fn is_probe_failure(&self) -> bool {
        matches!(self, Self::ProbeFailure { .. })
    }
}

pub type Result<T> = std::result::Result<T, StageError>;
