//! Staged files and the stage operation
//!
//! A [`StagedFile`] ties one local file to one [`Target`] and makes sure the
//! file is reachable there:
//!
//! 1. **Local target**: nothing to do, the remote path is the local path.
//! 2. **Same storage**: the path already names the same file on the target
//!    (shared mount), so only the remote directory is recorded.
//! 3. **Otherwise**: the file is hashed and uploaded into
//!    `<tmp-root>/<prefix>-<user>/<sha256>/`.
//!
//! # Usage
//!
//! ```rust,no_run
//! use filestage::{SshSessionProvider, StageConfig, StagedFile, Target};
//!
//! # fn example() -> filestage::Result<()> {
//! let provider = SshSessionProvider::new(StageConfig::default());
//! let mut file = StagedFile::new("/srv/images/rootfs.ext4", Target::network("exporter-1"))?;
//! file.stage(&provider)?;
//! println!("{}", file.remote_path()?);
//! # Ok(())
//! # }
//! ```
//!
//! # Thread safety
//!
//! Every memoizing operation takes `&mut self`, so an instance has a single
//! owner at a time. Share one across threads only behind a `Mutex`. Distinct
//! instances are independent, even for the same local path.

use crate::config::StageConfig;
use crate::detect::{probe_same_storage, SameStorage};
use crate::error::{Result, StageError};
use crate::hash::ContentHash;
use crate::layout::{basename, join_remote, parent_dir, StagingLayout};
use crate::probe::{LocalStatProbe, RemoteStatProbe, StatusProbe};
use crate::session::{shell_quote, Session, SessionProvider};
use crate::target::Target;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

/// A local file to be made available on a target
pub struct StagedFile {
    local_path: PathBuf,
    target: Target,
    detect_same_storage: bool,
    layout: StagingLayout,
    local_probe: Box<dyn StatusProbe + Send + Sync>,
    content_hash: Option<ContentHash>,
    same_storage: SameStorage,
    remote_dir: Option<String>,
}

impl StagedFile {
    /// Create a staged file for `path`
    ///
    /// A relative `path` is made absolute against the current directory, and
    /// `.`/`..` components are collapsed without resolving symlinks.
    ///
    /// # Errors
    ///
    /// - [`StageError::NotFound`] if nothing exists at `path`
    /// - [`StageError::NotAFile`] if it exists but is not a regular file
    pub fn new(path: impl AsRef<Path>, target: Target) -> Result<Self> {
        let local_path = normalize_lexically(&std::path::absolute(path.as_ref())?);

        match std::fs::metadata(&local_path) {
            Ok(metadata) if metadata.is_file() => {}
            Ok(_) => return Err(StageError::NotAFile { path: local_path }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StageError::NotFound { path: local_path })
            }
            Err(e) => return Err(e.into()),
        }

        Ok(Self {
            local_path,
            target,
            detect_same_storage: true,
            layout: StagingLayout::from_config(&StageConfig::default()),
            local_probe: Box::new(LocalStatProbe),
            content_hash: None,
            same_storage: SameStorage::Unknown,
            remote_dir: None,
        })
    }

    /// Enable or disable the same-storage shortcut (enabled by default)
    pub fn with_detect_same_storage(mut self, detect: bool) -> Self {
        self.detect_same_storage = detect;
        self
    }

    /// Use `layout` for content-addressed staging paths
    pub fn with_layout(mut self, layout: StagingLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Replace the local half of the same-storage probe
    pub fn with_local_probe(mut self, probe: impl StatusProbe + Send + Sync + 'static) -> Self {
        self.local_probe = Box::new(probe);
        self
    }

    pub fn local_path(&self) -> &Path {
        &self.local_path
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn detect_same_storage(&self) -> bool {
        self.detect_same_storage
    }

    /// Current same-storage state, without probing
    pub fn same_storage(&self) -> SameStorage {
        self.same_storage
    }

    /// Remote directory, once resolved (slash-terminated)
    pub fn remote_dir(&self) -> Option<&str> {
        self.remote_dir.as_deref()
    }

    /// SHA-256 of the file contents, computed on first use
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file can no longer be read. Failures are
    /// not memoized, so a later call reads the file again.
    pub fn hash(&mut self) -> Result<ContentHash> {
        if let Some(hash) = self.content_hash {
            return Ok(hash);
        }

        let hash = ContentHash::from_file(&self.local_path)?;
        debug!("{}: sha256 {hash}", self.local_path.display());
        self.content_hash = Some(hash);
        Ok(hash)
    }

    /// Whether the target sees this exact file under the same path
    ///
    /// The answer is probed once per instance. With detection disabled this
    /// is always `false` and no probe runs. A confirmed match records the
    /// file's own directory as the remote directory.
    pub fn is_same_storage(&mut self, session: &dyn Session) -> bool {
        if self.same_storage.is_known() {
            return self.same_storage.is_same();
        }

        if !self.detect_same_storage {
            return false;
        }

        let remote = RemoteStatProbe::new(session);
        self.same_storage =
            probe_same_storage(&self.local_path, self.local_probe.as_ref(), &remote);

        if self.same_storage.is_same() {
            let dir = parent_dir(&self.local_path);
            self.remote_dir.get_or_insert(dir);
        }

        self.same_storage.is_same()
    }

    /// Make the file available on the target
    ///
    /// No-op for a local target. Otherwise opens (or reuses) a session
    /// through `provider` and continues as [`stage_with_session`].
    ///
    /// # Errors
    ///
    /// [`StageError::Transfer`] if the session cannot be opened, plus
    /// everything [`stage_with_session`] returns.
    ///
    /// [`stage_with_session`]: Self::stage_with_session
    pub fn stage(&mut self, provider: &dyn SessionProvider) -> Result<()> {
        let Some(host) = self.target.host() else {
            debug!("{}: local target, nothing to stage", self.local_path.display());
            return Ok(());
        };

        let session = provider
            .open(host)
            .map_err(|e| StageError::transfer(host, e))?;
        self.stage_with_session(session.as_ref())
    }

    /// Make the file available through an already open `session`
    ///
    /// No-op for a local target; `session` is not touched.
    ///
    /// # Errors
    ///
    /// - [`StageError::Io`] if hashing fails
    /// - [`StageError::Transfer`] if the remote mkdir or upload fails
    pub fn stage_with_session(&mut self, session: &dyn Session) -> Result<()> {
        if !self.target.is_network() {
            debug!("{}: local target, nothing to stage", self.local_path.display());
            return Ok(());
        }

        if self.is_same_storage(session) {
            info!(
                "{}: same storage on {}, skipping upload",
                self.local_path.display(),
                session.host()
            );
            return Ok(());
        }

        let hash = self.hash()?;
        let dir = self.layout.staging_dir(&hash);
        let dir = self.remote_dir.get_or_insert(dir).clone();
        let remote = join_remote(&dir, &basename(&self.local_path));

        session
            .run_checked(&format!("mkdir -p {}", shell_quote(&dir)))
            .map_err(|e| StageError::transfer(session.host(), e))?;

        info!(
            "Uploading {} to {}:{remote}",
            self.local_path.display(),
            session.host()
        );
        session
            .put_file(&self.local_path, &remote)
            .map_err(|e| StageError::transfer(session.host(), e))?;

        Ok(())
    }

    /// Path of the file on the target
    ///
    /// For a local target this is the local path and needs no staging.
    ///
    /// # Errors
    ///
    /// [`StageError::Precondition`] for a network target whose remote
    /// directory has not been resolved yet.
    pub fn remote_path(&self) -> Result<String> {
        if !self.target.is_network() {
            return Ok(self.local_path.to_string_lossy().into_owned());
        }

        let dir = self.remote_dir.as_deref().ok_or_else(|| {
            StageError::Precondition(format!(
                "remote path of {} requested before it was staged to {}",
                self.local_path.display(),
                self.target
            ))
        })?;
        Ok(join_remote(dir, &basename(&self.local_path)))
    }
}

/// Drop `.` and fold `..` into its parent, purely on the path text
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

impl fmt::Debug for StagedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StagedFile")
            .field("local_path", &self.local_path)
            .field("target", &self.target)
            .field("detect_same_storage", &self.detect_same_storage)
            .field("content_hash", &self.content_hash)
            .field("same_storage", &self.same_storage)
            .field("remote_dir", &self.remote_dir)
            .finish_non_exhaustive()
    }
}
