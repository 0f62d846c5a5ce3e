// ABOUTME: Entry point for the stelno CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use stelno::artifact::{ArtifactDescriptor, ArtifactKind};
use stelno::config::{self, Config};
use stelno::deploy::{self, DeploymentRequest};
use stelno::environment::EnvironmentName;
use stelno::error::{Error, Result};
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let result = run(cli).await;

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init { service, force } => {
            let cwd = env::current_dir().expect("Failed to get current directory");
            config::init_config(&cwd, service.as_deref(), force)
        }
        Commands::Deploy {
            artifact,
            kind,
            environment,
        } => {
            let cwd = env::current_dir().expect("Failed to get current directory");
            let config = Config::discover(&cwd)?;

            let kind: ArtifactKind = kind.parse().map_err(Error::InvalidConfig)?;
            let environment: Option<EnvironmentName> = match environment {
                Some(name) => Some(name.parse().map_err(Error::InvalidConfig)?),
                None => None,
            };

            let request = DeploymentRequest {
                artifact: ArtifactDescriptor::new(kind, artifact),
                environment,
            };

            deploy::run(&config, request).await.map(|_| ())
        }
    }
}
