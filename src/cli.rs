// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "stelno")]
#[command(about = "Deploys pre-built artifacts to remote hosts and site repositories")]
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
    /// Initialize a new stelno.yml configuration file
    Init {
        /// Service name to seed the template with
        #[arg(short, long)]
        service: Option<String>,

        /// Overwrite an existing configuration file
        #[arg(short, long)]
        force: bool,
    },

    /// Deploy a built artifact
    Deploy {
        /// Path to the built artifact directory
        artifact: PathBuf,

        /// Artifact kind: "web" or "service"
        #[arg(short, long)]
        kind: String,

        /// Target environment; defaults to branch-based detection
        #[arg(short, long)]
        environment: Option<String>,
    },
}
