//! SSH sessions backed by the system `ssh` and `scp` binaries
//!
//! Uses the user's own SSH configuration. Connections are multiplexed through
//! an OpenSSH control master so that the probe, mkdir and upload of one stage
//! share a single authenticated connection.

use crate::config::StageConfig;
use crate::error::TransportError;
use crate::session::{CommandOutput, Session, SessionProvider};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

/// Seconds an idle control master stays alive
const CONTROL_PERSIST_SECS: u32 = 300;

/// Session to one host via the configured remote shell
#[derive(Debug)]
pub struct SshSession {
    host: String,
    remote_shell: String,
    copy_program: String,
    options: Vec<String>,
}

impl SshSession {
    /// Create a session and verify the host is reachable
    ///
    /// # Errors
    ///
    /// Returns an error if the remote shell cannot be started or the trivial
    /// `true` command fails on the host.
    pub fn connect(host: &str, config: &StageConfig) -> Result<Self, TransportError> {
        info!("Connecting to {host}");

        let control_path = control_dir().join("filestage-%C");
        let mut options = vec![
            "BatchMode=yes".to_string(),
            "ControlMaster=auto".to_string(),
            format!("ControlPath={}", control_path.display()),
            format!("ControlPersist={CONTROL_PERSIST_SECS}"),
        ];
        options.extend(config.ssh_options.iter().cloned());

        let session = Self {
            host: host.to_string(),
            remote_shell: config.remote_shell.clone(),
            copy_program: config.copy_program.clone(),
            options,
        };
        session.run_checked("true")?;
        Ok(session)
    }

    fn with_options(&self, program: &str) -> Command {
        let mut cmd = Command::new(program);
        for option in &self.options {
            cmd.arg("-o").arg(option);
        }
        cmd
    }
}

fn control_dir() -> PathBuf {
    std::env::temp_dir()
}

fn exit_code(output: &Output) -> i32 {
    output.status.code().unwrap_or(-1)
}

impl Session for SshSession {
    fn host(&self) -> &str {
        &self.host
    }

    fn run(&self, command: &str) -> Result<CommandOutput, TransportError> {
        debug!("{}: running `{command}`", self.host);
        let output = self
            .with_options(&self.remote_shell)
            .arg("--")
            .arg(&self.host)
            .arg(command)
            .output()
            .map_err(|source| TransportError::Spawn {
                command: format!("{} {} {command}", self.remote_shell, self.host),
                source,
            })?;

        Ok(CommandOutput::from_raw(
            &output.stdout,
            &output.stderr,
            exit_code(&output),
        ))
    }

    fn put_file(&self, local: &Path, remote: &str) -> Result<(), TransportError> {
        debug!("{}: uploading {} to {remote}", self.host, local.display());
        let destination = format!("{}:{remote}", self.host);
        let output = self
            .with_options(&self.copy_program)
            .arg("--")
            .arg(local)
            .arg(&destination)
            .output()
            .map_err(|source| TransportError::Spawn {
                command: format!("{} {} {destination}", self.copy_program, local.display()),
                source,
            })?;

        if !output.status.success() {
            return Err(TransportError::Upload {
                local: local.to_path_buf(),
                remote: destination,
                code: exit_code(&output),
                stderr: String::from_utf8_lossy(&output.stderr).trim_end().to_string(),
            });
        }
        Ok(())
    }
}

/// Process-owned cache of one [`SshSession`] per host
///
/// Sessions are shared out as `Arc`s and live as long as the provider;
/// staged files only borrow them.
#[derive(Debug, Default)]
pub struct SshSessionProvider {
    config: StageConfig,
    sessions: Mutex<HashMap<String, Arc<SshSession>>>,
}

impl SshSessionProvider {
    pub fn new(config: StageConfig) -> Self {
        Self {
            config,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<String, Arc<SshSession>>> {
        self.sessions
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Number of hosts with an open session
    pub fn len(&self) -> usize {
        self.sessions().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionProvider for SshSessionProvider {
    fn open(&self, host: &str) -> Result<Arc<dyn Session>, TransportError> {
        if let Some(session) = self.sessions().get(host) {
            return Ok(Arc::clone(session) as Arc<dyn Session>);
        }

        // connect unlocked so a slow host does not stall the others
        let connected = Arc::new(SshSession::connect(host, &self.config)?);
        let session = Arc::clone(
            self.sessions()
                .entry(host.to_string())
                .or_insert(connected),
        );
        Ok(session as Arc<dyn Session>)
    }
}
