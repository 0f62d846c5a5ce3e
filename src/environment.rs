// ABOUTME: Resolves the target environment and its remote-host credentials.
// ABOUTME: Branch "staging" selects staging; everything else falls back to production.

use crate::config::Config;
use crate::error::{Error, Result};
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::process::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvironmentName {
    Staging,
    Production,
}

impl FromStr for EnvironmentName {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "staging" => Ok(EnvironmentName::Staging),
            "production" => Ok(EnvironmentName::Production),
            other => Err(format!(
                "unknown environment: {other} (expected \"staging\" or \"production\")"
            )),
        }
    }
}

impl fmt::Display for EnvironmentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvironmentName::Staging => write!(f, "staging"),
            EnvironmentName::Production => write!(f, "production"),
        }
    }
}

/// Remote-host coordinates and credentials for one environment.
/// Resolved once per deployment; immutable afterward.
#[derive(Debug)]
pub struct EnvironmentProfile {
    pub name: EnvironmentName,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub known_hosts: Option<PathBuf>,
    pub trust_first_connection: bool,
    pub key: KeyMaterial,
}

/// Resolve the target environment.
///
/// With no explicit override the current git branch decides: `staging`
/// maps to the staging profile, every other branch maps to production.
/// Branch detection failure also maps to production; the fallback is
/// logged, never escalated.
pub async fn resolve(
    config: &Config,
    requested: Option<EnvironmentName>,
) -> Result<EnvironmentProfile> {
    let name = match requested {
        Some(name) => name,
        None => environment_for_branch(current_branch().await.as_deref()),
    };

    let remote = config
        .environment(name)
        .ok_or(Error::MissingEnvironment(name))?;

    let key = KeyMaterial::from_config(&remote.key)?;

    Ok(EnvironmentProfile {
        name,
        host: remote.host.clone(),
        port: remote.port,
        user: remote.user.clone(),
        known_hosts: remote.known_hosts.clone(),
        trust_first_connection: remote.trust_first_connection,
        key,
    })
}

/// Map a detected branch to an environment. Only `staging` selects
/// staging; any other branch, or no branch at all, selects production.
pub fn environment_for_branch(branch: Option<&str>) -> EnvironmentName {
    match branch {
        Some("staging") => EnvironmentName::Staging,
        Some(branch) => {
            tracing::debug!(%branch, "branch is not staging, deploying to production");
            EnvironmentName::Production
        }
        None => {
            tracing::warn!("could not determine the current branch, assuming production");
            EnvironmentName::Production
        }
    }
}

/// Current git branch of the working directory, or None when it cannot
/// be determined (no git on PATH, not a repository, resolution failure).
pub async fn current_branch() -> Option<String> {
    current_branch_in(Path::new(".")).await
}

/// Current git branch of `dir`.
pub async fn current_branch_in(dir: &Path) -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--abbrev-ref", "HEAD"])
        .current_dir(dir)
        .output()
        .await
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let branch = String::from_utf8(output.stdout).ok()?;
    let branch = branch.trim();
    if branch.is_empty() {
        None
    } else {
        Some(branch.to_string())
    }
}

static KEY_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A usable private-key file reference.
///
/// Configured key material is either a path to an existing key (passed
/// through, never deleted) or inline PEM content, which is materialized
/// into a restrictively-permissioned temporary file. The guard records
/// which case it is in and removes only files it created itself.
#[derive(Debug)]
pub struct KeyMaterial {
    path: PathBuf,
    owned: bool,
}

impl KeyMaterial {
    pub fn from_config(value: &str) -> Result<Self> {
        if value.trim_start().starts_with("-----BEGIN") {
            Self::materialize(value)
        } else {
            Ok(Self {
                path: PathBuf::from(value),
                owned: false,
            })
        }
    }

    fn materialize(content: &str) -> Result<Self> {
        let n = KEY_COUNTER.fetch_add(1, Ordering::Relaxed);
        let path = std::env::temp_dir().join(format!("stelno-key-{}-{}", std::process::id(), n));

        let mut options = std::fs::OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(&path)?;
        file.write_all(content.as_bytes())?;
        // Key parsers expect a trailing newline; YAML block scalars may drop it.
        if !content.ends_with('\n') {
            file.write_all(b"\n")?;
        }

        tracing::debug!(path = %path.display(), "materialized inline key");

        Ok(Self { path, owned: true })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether this guard created (and will delete) the file.
    pub fn is_materialized(&self) -> bool {
        self.owned
    }
}

impl Drop for KeyMaterial {
    fn drop(&mut self) {
        if self.owned {
            if let Err(e) = std::fs::remove_file(&self.path) {
                tracing::warn!(path = %self.path.display(), "failed to remove key file: {e}");
            }
        }
    }
}
