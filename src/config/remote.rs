// ABOUTME: Per-environment remote host configuration.
// ABOUTME: Key material may be a filesystem path or inline PEM content.

use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteConfig {
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    pub user: String,

    /// Path to a private key, or the raw PEM content itself.
    pub key: String,

    #[serde(default)]
    pub known_hosts: Option<PathBuf>,

    #[serde(default = "default_trust_first_connection")]
    pub trust_first_connection: bool,
}

fn default_port() -> u16 {
    22
}

fn default_trust_first_connection() -> bool {
    true
}
