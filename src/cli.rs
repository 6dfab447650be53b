// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines the stage and deploy subcommands and their arguments.

use charmhand::repository::DEFAULT_SERIES;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "charmhand")]
#[command(about = "Stage and deploy local Juju charms")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Stage a charm source tree into a local repository and print its path
    Stage {
        /// Charm source directory
        source: PathBuf,

        /// Target series for the repository layout
        #[arg(long, default_value = DEFAULT_SERIES)]
        series: String,
    },

    /// Deploy a charm from a local repository, expose it and wait for its unit
    Deploy {
        /// Charm name (deployed as local:<charm>)
        charm: String,

        /// Charm option as KEY=VALUE; repeatable
        #[arg(long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,

        /// Deploy the unit to a specific machine
        #[arg(long)]
        force_machine: Option<u32>,

        /// Charm source directory (defaults to the installation parent)
        #[arg(long)]
        source: Option<PathBuf>,

        /// Target series
        #[arg(long)]
        series: Option<String>,
    },
}
