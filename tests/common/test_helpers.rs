//! Fake sessions and probes for staging tests

use filestage::error::{ProbeSide, StageError, TransportError};
use filestage::probe::{StatusProbe, StatusRecord};
use filestage::{CommandOutput, Session, SessionProvider};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// How the fake host answers `stat` commands
#[derive(Debug, Clone)]
pub enum StatReply {
    /// Run the probe on this machine, as if the path were on a shared mount
    SharedMount,
    /// Fixed stdout and exit code
    Fixed { stdout: String, exit_code: i32 },
    /// The command cannot be run at all (connection dropped)
    Broken,
}

/// A recorded upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub local: PathBuf,
    pub remote: String,
}

/// In-memory session that records every command and upload
#[derive(Debug)]
pub struct FakeSession {
    host: String,
    stat: StatReply,
    mkdir_exit: i32,
    upload_fails: bool,
    commands: Mutex<Vec<String>>,
    uploads: Mutex<Vec<Upload>>,
}

impl FakeSession {
    pub fn new(host: &str, stat: StatReply) -> Self {
        Self {
            host: host.to_string(),
            stat,
            mkdir_exit: 0,
            upload_fails: false,
            commands: Mutex::new(Vec::new()),
            uploads: Mutex::new(Vec::new()),
        }
    }

    /// Host that shares the local filesystem
    pub fn shared(host: &str) -> Self {
        Self::new(host, StatReply::SharedMount)
    }

    /// Host whose `stat` prints `stdout` and exits with `exit_code`
    pub fn fixed(host: &str, stdout: &str, exit_code: i32) -> Self {
        Self::new(
            host,
            StatReply::Fixed {
                stdout: stdout.to_string(),
                exit_code,
            },
        )
    }

    pub fn with_mkdir_exit(mut self, code: i32) -> Self {
        self.mkdir_exit = code;
        self
    }

    pub fn with_failing_upload(mut self) -> Self {
        self.upload_fails = true;
        self
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    pub fn stat_count(&self) -> usize {
        self.commands()
            .iter()
            .filter(|c| c.starts_with("stat "))
            .count()
    }

    pub fn mkdirs(&self) -> Vec<String> {
        self.commands()
            .into_iter()
            .filter(|c| c.starts_with("mkdir "))
            .collect()
    }

    pub fn uploads(&self) -> Vec<Upload> {
        self.uploads.lock().unwrap().clone()
    }
}

impl Session for FakeSession {
    fn host(&self) -> &str {
        &self.host
    }

    fn run(&self, command: &str) -> Result<CommandOutput, TransportError> {
        self.commands.lock().unwrap().push(command.to_string());

        if command.starts_with("stat ") {
            return Ok(match &self.stat {
                StatReply::SharedMount => {
                    let output = Command::new("sh")
                        .arg("-c")
                        .arg(command)
                        .output()
                        .map_err(|source| TransportError::Spawn {
                            command: command.to_string(),
                            source,
                        })?;
                    CommandOutput::from_raw(
                        &output.stdout,
                        &output.stderr,
                        output.status.code().unwrap_or(-1),
                    )
                }
                StatReply::Fixed { stdout, exit_code } => {
                    CommandOutput::from_raw(stdout.as_bytes(), b"", *exit_code)
                }
                StatReply::Broken => {
                    return Err(TransportError::Spawn {
                        command: command.to_string(),
                        source: std::io::Error::new(
                            std::io::ErrorKind::ConnectionReset,
                            "connection reset by peer",
                        ),
                    })
                }
            });
        }

        if command.starts_with("mkdir ") {
            return Ok(CommandOutput::from_raw(
                b"",
                b"mkdir: cannot create directory: Permission denied\n",
                self.mkdir_exit,
            ));
        }

        Ok(CommandOutput::from_raw(b"", b"", 0))
    }

    fn put_file(&self, local: &Path, remote: &str) -> Result<(), TransportError> {
        if self.upload_fails {
            return Err(TransportError::Upload {
                local: local.to_path_buf(),
                remote: format!("{}:{remote}", self.host),
                code: 1,
                stderr: "scp: connection lost".to_string(),
            });
        }
        self.uploads.lock().unwrap().push(Upload {
            local: local.to_path_buf(),
            remote: remote.to_string(),
        });
        Ok(())
    }
}

/// Provider handing out one shared [`FakeSession`]
#[derive(Debug)]
pub struct FakeProvider {
    pub session: Arc<FakeSession>,
    opens: AtomicUsize,
    fail_open: bool,
}

impl FakeProvider {
    pub fn new(session: FakeSession) -> Self {
        Self {
            session: Arc::new(session),
            opens: AtomicUsize::new(0),
            fail_open: false,
        }
    }

    /// Provider whose every `open` fails like an unreachable host
    pub fn unreachable(host: &str) -> Self {
        let mut provider = Self::new(FakeSession::shared(host));
        provider.fail_open = true;
        provider
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

impl SessionProvider for FakeProvider {
    fn open(&self, host: &str) -> Result<Arc<dyn Session>, TransportError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        if self.fail_open {
            return Err(TransportError::CommandFailed {
                command: format!("ssh {host} true"),
                code: 255,
                stderr: format!("ssh: Could not resolve hostname {host}"),
            });
        }
        Ok(Arc::clone(&self.session) as Arc<dyn Session>)
    }
}

/// Local probe that always fails, counting its calls
#[derive(Debug, Default)]
pub struct FailingProbe {
    pub calls: Arc<AtomicUsize>,
}

impl StatusProbe for FailingProbe {
    fn stat(&self, _path: &Path) -> filestage::Result<StatusRecord> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(StageError::ProbeFailure {
            side: ProbeSide::Local,
            code: 1,
        })
    }
}

/// Local probe returning a fixed record
#[derive(Debug)]
pub struct FixedProbe(pub &'static str);

impl StatusProbe for FixedProbe {
    fn stat(&self, _path: &Path) -> filestage::Result<StatusRecord> {
        Ok(StatusRecord::new(vec![self.0.to_string()]))
    }
}

/// Write `data` to `dir/name` and return the path
pub fn write_file(dir: &TempDir, name: &str, data: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, data).unwrap();
    path
}
