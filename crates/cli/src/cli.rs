//! CLI definitions and command dispatch.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use lectura_core::{build, clean};

#[derive(Parser)]
#[command(name = "lectura-fonts")]
#[command(about = "Build the Lectura variable font from UFO drawing sources")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, clap::Args)]
pub struct BuildArgs {
    /// Directory holding the drawn master UFOs and the glyph order file
    #[arg(long, default_value = "sources")]
    pub source_dir: PathBuf,
    #[arg(long, default_value = "build")]
    pub build_dir: PathBuf,
    #[arg(long, default_value = "dist")]
    pub dist_dir: PathBuf,
    /// Skip accented composite construction
    #[arg(long)]
    pub no_composites: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full pipeline: sources to variable font
    Build {
        #[command(flatten)]
        args: BuildArgs,
    },
    /// Remove the build and dist directories
    Clean {
        #[arg(long, default_value = "build")]
        build_dir: PathBuf,
        #[arg(long, default_value = "dist")]
        dist_dir: PathBuf,
    },
}

impl Commands {
    pub fn run(self) -> Result<()> {
        match self {
            Commands::Build { args } => {
                build(&args.source_dir, &args.build_dir, &args.dist_dir, !args.no_composites)?;
            }
            Commands::Clean { build_dir, dist_dir } => {
                clean(&build_dir, &dist_dir)?;
            }
        }
        Ok(())
    }
}
