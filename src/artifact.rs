// ABOUTME: Artifact kinds and pre-deployment shape validation.
// ABOUTME: Validation is purely local filesystem inspection, no remote calls.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Entry point a web content artifact must carry at its root.
pub const WEB_ENTRY_POINT: &str = "index.html";

/// The two deployable artifact kinds. Fixed at invocation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// A static web bundle, published to a site repository.
    WebContent,
    /// A service binary tree, installed on a remote Linux host.
    LinuxService,
}

impl FromStr for ArtifactKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "web" => Ok(ArtifactKind::WebContent),
            "service" => Ok(ArtifactKind::LinuxService),
            other => Err(format!(
                "unknown artifact kind: {other} (expected \"web\" or \"service\")"
            )),
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::WebContent => write!(f, "web content"),
            ArtifactKind::LinuxService => write!(f, "linux service"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("artifact path is empty")]
    EmptyPath,

    #[error("artifact path does not exist: {0}")]
    Missing(PathBuf),

    #[error("artifact path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("web content artifact has no {WEB_ENTRY_POINT} at its root: {0}")]
    MissingEntryPoint(PathBuf),
}

/// A pre-built artifact directory together with its declared kind.
#[derive(Debug, Clone)]
pub struct ArtifactDescriptor {
    pub kind: ArtifactKind,
    pub source: PathBuf,
}

impl ArtifactDescriptor {
    pub fn new(kind: ArtifactKind, source: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            source: source.into(),
        }
    }

    /// Check that the artifact directory matches the shape its kind requires.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.source.as_os_str().is_empty() {
            return Err(ValidationError::EmptyPath);
        }

        if !self.source.exists() {
            return Err(ValidationError::Missing(self.source.clone()));
        }

        if !self.source.is_dir() {
            return Err(ValidationError::NotADirectory(self.source.clone()));
        }

        if self.kind == ArtifactKind::WebContent && !self.source.join(WEB_ENTRY_POINT).is_file() {
            return Err(ValidationError::MissingEntryPoint(self.source.clone()));
        }

        Ok(())
    }
}
