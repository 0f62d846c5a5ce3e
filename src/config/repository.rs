// ABOUTME: Site repository configuration for web content publishing.
// ABOUTME: The access token is read from the environment at publish time, never from the file.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryConfig {
    pub owner: String,

    pub name: String,

    #[serde(default = "default_branch")]
    pub branch: String,

    /// Repository-relative directory published files land under.
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Environment variable holding the API token.
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// Override of the repository API base URL. Tests point this at a
    /// local mock server.
    #[serde(default)]
    pub api_url: Option<String>,
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_prefix() -> String {
    "site".to_string()
}

fn default_token_env() -> String {
    "GITHUB_TOKEN".to_string()
}
