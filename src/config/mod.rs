// ABOUTME: Configuration types and parsing for stelno.yml.
// ABOUTME: Handles YAML parsing, discovery, and template generation.

mod remote;
mod repository;

pub use remote::RemoteConfig;
pub use repository::RepositoryConfig;

use crate::error::{Error, Result};
use crate::environment::EnvironmentName;
use crate::types::ServiceName;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "stelno.yml";
pub const CONFIG_FILENAME_ALT: &str = "stelno.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".stelno/config.yml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(deserialize_with = "deserialize_service_name")]
    pub service: ServiceName,

    /// Executable inside the artifact tree, relative to its root.
    pub binary: String,

    /// Remote directory the service is unpacked into.
    pub deploy_dir: String,

    /// Remote paths (certificates etc.) relocated into the fresh tree
    /// on every activation.
    #[serde(default)]
    pub preserve: Vec<String>,

    #[serde(default)]
    pub environments: Environments,

    #[serde(default)]
    pub repository: Option<RepositoryConfig>,

    #[serde(default = "default_command_timeout", with = "humantime_serde")]
    pub command_timeout: Duration,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Environments {
    #[serde(default)]
    pub staging: Option<RemoteConfig>,

    #[serde(default)]
    pub production: Option<RemoteConfig>,
}

fn default_command_timeout() -> Duration {
    Duration::from_secs(300)
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    /// The remote block for an environment, if one is configured.
    pub fn environment(&self, name: EnvironmentName) -> Option<&RemoteConfig> {
        match name {
            EnvironmentName::Staging => self.environments.staging.as_ref(),
            EnvironmentName::Production => self.environments.production.as_ref(),
        }
    }
}

pub fn init_config(dir: &Path, service: Option<&str>, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let service = match service {
        Some(s) => {
            ServiceName::new(s).map_err(|e| Error::InvalidConfig(e.to_string()))?
        }
        None => ServiceName::new("my-service").map_err(|e| Error::InvalidConfig(e.to_string()))?,
    };

    std::fs::write(&config_path, template_yaml(&service))?;

    Ok(())
}

fn template_yaml(service: &ServiceName) -> String {
    format!(
        r#"service: {service}
binary: {service}
deploy_dir: /home/deploy/{service}

environments:
  production:
    host: server.example.com
    user: deploy
    key: ~/.ssh/id_ed25519

repository:
  owner: example
  name: example.github.io
"#
    )
}

// Custom deserializers

fn deserialize_service_name<'de, D>(deserializer: D) -> std::result::Result<ServiceName, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    ServiceName::new(&s).map_err(serde::de::Error::custom)
}
