use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::build::BuildOptions;
use crate::zip::{CompressionMethod, OpenMode, Zip64Policy};

#[derive(Parser, Debug)]
#[command(name = "zipbuild")]
#[command(version)]
#[command(about = "Build ZIP archives, optionally forcing ZIP64", long_about = None)]
#[command(after_help = "Examples:\n  \
  zipbuild build out.zip src/ README.md              archive a tree and a file\n  \
  zipbuild build --force-zip64 out.zip a.txt         always write ZIP64 records\n  \
  zipbuild build --mode append out.zip more/         add entries to out.zip\n  \
  zipbuild build --preamble '#!/bin/sh' out.zip app/ write bytes before the archive")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create or extend an archive from files and directories
    Build(BuildArgs),
}

#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Archive to write
    #[arg(value_name = "ZIPFILE")]
    pub zipfile: PathBuf,

    /// Files and directories to add
    #[arg(value_name = "FILES", required = true)]
    pub files: Vec<PathBuf>,

    /// Print files being added
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Start a new archive or add to an existing one
    #[arg(long, value_enum, default_value_t = Mode::Create)]
    pub mode: Mode,

    /// Bytes written verbatim before the archive
    #[arg(long, value_name = "STR", default_value = "")]
    pub preamble: String,

    /// Use ZIP64 records even when nothing overflows
    #[arg(long, conflicts_with = "no_zip64")]
    pub force_zip64: bool,

    /// Fail instead of falling back to ZIP64 on overflow
    #[arg(long)]
    pub no_zip64: bool,

    /// Store entries without compression
    #[arg(long)]
    pub store: bool,

    /// Deflate compression level
    #[arg(long, value_name = "0-9", default_value_t = 6,
          value_parser = clap::value_parser!(u32).range(0..=9))]
    pub level: u32,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Create,
    Append,
}

impl From<Mode> for OpenMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Create => OpenMode::Create,
            Mode::Append => OpenMode::Append,
        }
    }
}

impl Cli {
    pub fn is_verbose(&self) -> bool {
        match &self.command {
            Command::Build(args) => args.verbose,
        }
    }
}

impl BuildArgs {
    pub fn zip64_policy(&self) -> Zip64Policy {
        if self.force_zip64 {
            Zip64Policy::Force
        } else if self.no_zip64 {
            Zip64Policy::Never
        } else {
            Zip64Policy::Auto
        }
    }

    pub fn to_build_options(&self) -> BuildOptions {
        BuildOptions {
            archive: self.zipfile.clone(),
            inputs: self.files.clone(),
            mode: self.mode.into(),
            preamble: self.preamble.as_bytes().to_vec(),
            zip64: self.zip64_policy(),
            method: if self.store {
                CompressionMethod::Stored
            } else {
                CompressionMethod::Deflate
            },
            level: self.level,
        }
    }
}
