//! Command-line interface definitions

use crate::config::StageConfig;
use crate::target::Target;
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

/// Stage a file on a remote host, skipping the copy on shared storage
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Local file to stage
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Target host (`host` or `user@host`); omit to stage locally
    ///
    /// `local` and `localhost` also mean the local host, in which case the
    /// file is used in place.
    #[arg(long, short = 'H', value_name = "HOST")]
    pub host: Option<String>,

    /// Always upload, even if the host sees the same file under the same path
    #[arg(long)]
    pub no_detect_same_storage: bool,

    /// Print the SHA-256 of FILE and exit without staging
    #[arg(long)]
    pub hash: bool,

    // ========== Staging layout ==========
    /// Root of the staging tree on the remote host
    #[arg(long, default_value = "/tmp")]
    pub tmp_root: PathBuf,

    /// Tool prefix of the per-user staging directory
    #[arg(long, default_value = "labgrid")]
    pub prefix: String,

    /// User name for the staging directory (default: $USER, then the OS account)
    #[arg(long)]
    pub user: Option<String>,

    // ========== Remote shell ==========
    /// Remote shell to use (default: ssh)
    #[arg(short = 'e', long = "rsh", default_value = "ssh")]
    pub remote_shell: String,

    /// Program used to upload files (default: scp)
    #[arg(long = "copy-program", default_value = "scp")]
    pub copy_program: String,

    /// Extra `-o` option for ssh and scp (repeatable)
    #[arg(short = 'o', long = "ssh-option", value_name = "OPTION")]
    pub ssh_options: Vec<String>,

    // ========== Other flags ==========
    /// Verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress all output except errors)
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Target selected by `--host`
    #[must_use]
    pub fn target(&self) -> Target {
        self.host.as_deref().map_or(Target::Local, Target::parse)
    }

    /// Staging configuration assembled from the flags
    #[must_use]
    pub fn stage_config(&self) -> StageConfig {
        StageConfig {
            tmp_root: self.tmp_root.clone(),
            prefix: self.prefix.clone(),
            user: self.user.clone(),
            remote_shell: self.remote_shell.clone(),
            copy_program: self.copy_program.clone(),
            ssh_options: self.ssh_options.clone(),
        }
    }

    /// Validate command-line arguments
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// - Both --quiet and --verbose options are used
    /// - The staging configuration is invalid
    pub fn validate(&self) -> Result<()> {
        if self.quiet && self.verbose > 0 {
            anyhow::bail!("Cannot use both --quiet and --verbose options");
        }

        self.stage_config().validate()?;
        Ok(())
    }
}
