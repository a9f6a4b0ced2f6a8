//! Main entry point for the zipbuild CLI application.
//!
//! Parses the command line, sets up logging on stderr and runs the build.
//! Any error ends the process with a nonzero exit code; a partially
//! written archive is left for the caller to discard.

use anyhow::{Context, Result};
use clap::Parser;

use zipbuild::build_archive;
use zipbuild::cli::{BuildArgs, Cli, Command};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG overrides the level picked from --verbose
    let default_level = if cli.is_verbose() { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .init();

    match &cli.command {
        Command::Build(args) => run_build(args),
    }
}

fn run_build(args: &BuildArgs) -> Result<()> {
    let options = args.to_build_options();
    let summary = build_archive(&options)
        .with_context(|| format!("failed to build {}", options.archive.display()))?;

    if args.verbose {
        eprintln!(
            "{}: {} entries ({} added){}",
            options.archive.display(),
            summary.entries,
            summary.entries_added,
            if summary.zip64 { ", ZIP64" } else { "" }
        );
    }
    Ok(())
}
