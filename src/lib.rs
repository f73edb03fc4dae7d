//! filestage: make a local file reachable on a remote host
//!
//! This library stages single files onto remote targets. When the target
//! already sees the file under the same path (a shared mount), nothing is
//! copied; otherwise the file is uploaded into a per-user, content-addressed
//! directory so identical content always lands in the same place.

pub mod cli;
pub mod config;
pub mod detect;
pub mod error;
pub mod hash;
pub mod layout;
pub mod probe;
pub mod session;
pub mod ssh;
pub mod staged;
pub mod target;

// Re-export commonly used types
pub use config::StageConfig;
pub use detect::SameStorage;
pub use error::{Result, StageError, TransportError};
pub use hash::ContentHash;
pub use layout::StagingLayout;
pub use session::{CommandOutput, Session, SessionProvider};
pub use ssh::{SshSession, SshSessionProvider};
pub use staged::StagedFile;
pub use target::Target;
