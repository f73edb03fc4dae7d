//! filestage: stage a local file on a remote host
//!
//! Prints the path under which the file is reachable on the target.

use anyhow::{Context, Result};
use clap::Parser;
use filestage::cli::Args;
use filestage::{SshSessionProvider, StagedFile};
use tracing::{info, Level};

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Logs go to stderr; stdout carries only the result
    let level = if args.quiet {
        Level::ERROR
    } else {
        match args.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    args.validate().context("Invalid arguments")?;

    let config = args.stage_config();
    let target = args.target();
    info!("Starting filestage v{}", env!("CARGO_PKG_VERSION"));
    info!("File: {}", args.file.display());
    info!("Target: {target}");

    let mut file = StagedFile::new(&args.file, target)?
        .with_detect_same_storage(!args.no_detect_same_storage)
        .with_layout(filestage::StagingLayout::from_config(&config));

    if args.hash {
        println!("{}", file.hash()?);
        return Ok(());
    }

    let provider = SshSessionProvider::new(config);
    file.stage(&provider)
        .with_context(|| format!("Failed to stage {}", file.local_path().display()))?;

    println!("{}", file.remote_path()?);
    Ok(())
}
