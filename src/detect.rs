//! Same-storage detection
//!
//! When a path is reachable under the same name on both hosts (typically an
//! NFS mount), the inode/size/birth/mtime tuple matches on both sides and no
//! transfer is needed. Any doubt resolves to "different": a needless upload is
//! cheap, a missed one is a wrong file.

use crate::probe::StatusProbe;
use std::path::Path;
use tracing::debug;

/// Memoized outcome of same-storage detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameStorage {
    /// Not probed yet
    #[default]
    Unknown,
    /// Local and remote path denote the same file
    Same,
    /// Storage differs, or could not be shown to be the same
    Different,
}

impl SameStorage {
    #[must_use]
    pub const fn is_known(self) -> bool {
        !matches!(self, Self::Unknown)
    }

    #[must_use]
    pub const fn is_same(self) -> bool {
        matches!(self, Self::Same)
    }
}

impl From<bool> for SameStorage {
    fn from(same: bool) -> Self {
        if same {
            Self::Same
        } else {
            Self::Different
        }
    }
}

/// Probe `path` locally and remotely and compare the records
///
/// Never returns [`SameStorage::Unknown`]. A failing probe on either side
/// yields [`SameStorage::Different`]; the remote probe is skipped when the
/// local one already failed.
pub fn probe_same_storage(
    path: &Path,
    local: &dyn StatusProbe,
    remote: &dyn StatusProbe,
) -> SameStorage {
    let local_record = match local.stat(path) {
        Ok(record) => record,
        Err(e) => {
            debug!("local: stat of {} unsuccessful: {e}", path.display());
            return SameStorage::Different;
        }
    };

    let remote_record = match remote.stat(path) {
        Ok(record) => record,
        Err(e) => {
            debug!("remote: stat of {} unsuccessful: {e}", path.display());
            return SameStorage::Different;
        }
    };

    if local_record != remote_record {
        debug!(
            "stat: local ({:?}) and remote ({:?}) output don't match",
            local_record.lines(),
            remote_record.lines()
        );
        return SameStorage::Different;
    }

    SameStorage::Same
}
