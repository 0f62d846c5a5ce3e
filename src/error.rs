// ABOUTME: Application-wide error types for stelno.
// ABOUTME: Uses thiserror for ergonomic error handling.

use crate::activate::ActivationReport;
use crate::artifact::ValidationError;
use crate::environment::EnvironmentName;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("configuration file not found in {0}")]
    ConfigNotFound(PathBuf),

    #[error("no {0} environment is configured")]
    MissingEnvironment(EnvironmentName),

    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid artifact: {0}")]
    Validation(#[from] ValidationError),

    #[error("SSH error: {0}")]
    Ssh(#[from] crate::ssh::Error),

    #[error("publish failed: {0}")]
    Publish(#[from] crate::publish::PublishError),

    #[error(
        "activation failed: {} of {} steps failed",
        .report.failed_count(),
        .report.total()
    )]
    ActivationFailed { report: ActivationReport },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
