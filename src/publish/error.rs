// ABOUTME: Publish error types with SNAFU pattern.
// ABOUTME: Every failure names the protocol step so callers can diagnose without captures.

use snafu::Snafu;
use std::fmt;
use std::path::PathBuf;

/// The five protocol steps of an atomic publish, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishStep {
    GetRef,
    CreateBlob,
    CreateTree,
    CreateCommit,
    UpdateRef,
}

impl fmt::Display for PublishStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PublishStep::GetRef => "get-ref",
            PublishStep::CreateBlob => "create-blob",
            PublishStep::CreateTree => "create-tree",
            PublishStep::CreateCommit => "create-commit",
            PublishStep::UpdateRef => "update-ref",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum PublishError {
    #[snafu(display("{step} returned HTTP {status}: {message}"))]
    Api {
        step: PublishStep,
        status: u16,
        message: String,
    },

    #[snafu(display("{step} request failed: {source}"))]
    Transport {
        step: PublishStep,
        source: reqwest::Error,
    },

    #[snafu(display("failed to read {}: {source}", path.display()))]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl PublishError {
    /// The protocol step that failed, when one was reached.
    pub fn step(&self) -> Option<PublishStep> {
        match self {
            PublishError::Api { step, .. } | PublishError::Transport { step, .. } => Some(*step),
            PublishError::ReadFile { .. } => None,
        }
    }

    /// The HTTP status code, for API-level rejections.
    pub fn status(&self) -> Option<u16> {
        match self {
            PublishError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
