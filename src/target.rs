//! Staging targets

use std::fmt;

/// Where a file should become reachable
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Same host as the caller; nothing to transfer
    Local,
    /// Host reached through a remote session (`host` or `user@host`)
    Network { host: String },
}

impl Target {
    pub fn network(host: impl Into<String>) -> Self {
        Self::Network { host: host.into() }
    }

    /// Parse a target string; empty, `localhost` and `local` mean [`Target::Local`]
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "" | "local" | "localhost" => Self::Local,
            host => Self::network(host),
        }
    }

    /// Host to open a session to, if any
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        match self {
            Self::Local => None,
            Self::Network { host } => Some(host),
        }
    }

    #[must_use]
    pub const fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. })
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => f.write_str("local"),
            Self::Network { host } => f.write_str(host),
        }
    }
}
