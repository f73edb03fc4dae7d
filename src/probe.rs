//! File status probes
//!
//! Both sides of the same-storage comparison are produced by the same
//! `stat --format` invocation, once as a local process and once through the
//! remote session, so the two records can be compared as opaque text.

use crate::error::{ProbeSide, Result, StageError};
use crate::session::{decode_lines, shell_quote, Session};
use std::path::Path;
use std::process::Command;

/// inode, size, birth time, modification time
pub const STAT_FORMAT: &str = "inode=%i,size=%s,birth=%W,modified=%Y";

/// Output of one status probe, trailing blank lines removed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRecord(Vec<String>);

impl StatusRecord {
    pub fn new(mut lines: Vec<String>) -> Self {
        while lines.last().is_some_and(String::is_empty) {
            lines.pop();
        }
        Self(lines)
    }

    pub fn lines(&self) -> &[String] {
        &self.0
    }
}

/// Something that can report the status record of a path
pub trait StatusProbe {
    /// Probe `path`
    ///
    /// # Errors
    ///
    /// A probe that runs but exits non-zero returns
    /// [`StageError::ProbeFailure`]; failure to run it at all returns the
    /// underlying I/O or transport error.
    fn stat(&self, path: &Path) -> Result<StatusRecord>;
}

/// Runs `stat` as a local process
#[derive(Debug, Clone, Default)]
pub struct LocalStatProbe;

impl StatusProbe for LocalStatProbe {
    fn stat(&self, path: &Path) -> Result<StatusRecord> {
        let output = Command::new("stat")
            .arg("--format")
            .arg(STAT_FORMAT)
            .arg(path)
            .output()?;

        if !output.status.success() {
            return Err(StageError::ProbeFailure {
                side: ProbeSide::Local,
                code: output.status.code().unwrap_or(-1),
            });
        }

        Ok(StatusRecord::new(decode_lines(&output.stdout)))
    }
}

/// Runs `stat` through a borrowed remote session
pub struct RemoteStatProbe<'a> {
    session: &'a dyn Session,
}

impl<'a> RemoteStatProbe<'a> {
    pub fn new(session: &'a dyn Session) -> Self {
        Self { session }
    }
}

/// Remote command for probing `path`
pub fn stat_command(path: &Path) -> String {
    format!(
        "stat --format {} {}",
        shell_quote(STAT_FORMAT),
        shell_quote(&path.to_string_lossy())
    )
}

impl StatusProbe for RemoteStatProbe<'_> {
    fn stat(&self, path: &Path) -> Result<StatusRecord> {
        let output = self
            .session
            .run(&stat_command(path))
            .map_err(|e| StageError::transfer(self.session.host(), e))?;

        if !output.success() {
            return Err(StageError::ProbeFailure {
                side: ProbeSide::Remote,
                code: output.exit_code,
            });
        }

        Ok(StatusRecord::new(output.lines))
    }
}
