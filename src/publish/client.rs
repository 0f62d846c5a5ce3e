// ABOUTME: Repository API client implementing the content-addressed commit protocol.
// ABOUTME: get-ref, create-blob, create-tree, create-commit, update-ref; each sha feeds the next call.

use super::error::{ApiSnafu, PublishError, PublishStep, ReadFileSnafu, TransportSnafu};
use crate::archive;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use futures::future;
use serde::Deserialize;
use serde_json::json;
use snafu::ResultExt;
use std::io;
use std::path::{Path, PathBuf};

pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// One local file and the repository-relative path it is published at.
#[derive(Debug, Clone)]
pub struct PublishFile {
    pub local_path: PathBuf,
    pub repo_path: String,
}

impl PublishFile {
    /// Collect every file of a web artifact, placing each under
    /// `prefix/<path relative to the artifact root>`.
    pub fn from_artifact(source: &Path, prefix: &str) -> io::Result<Vec<Self>> {
        let manifest = archive::file_manifest(source)?;
        Ok(manifest
            .into_iter()
            .map(|(local_path, relative)| {
                let mut repo_path = String::new();
                if !prefix.is_empty() {
                    repo_path.push_str(prefix.trim_matches('/'));
                    repo_path.push('/');
                }
                repo_path.push_str(&relative.to_string_lossy().replace('\\', "/"));
                PublishFile {
                    local_path,
                    repo_path,
                }
            })
            .collect())
    }
}

/// The staged objects of one publish. Nothing here is visible on the
/// branch until the ref is patched to `commit_sha`.
#[derive(Debug, Clone)]
pub struct CommitPlan {
    pub base_sha: String,
    /// (repository path, content sha) per published file.
    pub blobs: Vec<(String, String)>,
    pub tree_sha: String,
    pub commit_sha: String,
}

#[derive(Deserialize)]
struct RefResponse {
    object: RefObject,
}

#[derive(Deserialize)]
struct RefObject {
    sha: String,
}

#[derive(Deserialize)]
struct ShaResponse {
    sha: String,
}

/// Client for one repository on a GitHub-compatible API.
#[derive(Debug, Clone)]
pub struct RepoClient {
    http: reqwest::Client,
    base_url: String,
    owner: String,
    repo: String,
    token: String,
}

impl RepoClient {
    pub fn new(
        owner: impl Into<String>,
        repo: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: DEFAULT_API_URL.to_string(),
            owner: owner.into(),
            repo: repo.into(),
            token: token.into(),
        }
    }

    /// Point the client at a different API endpoint. Tests use this to
    /// target a local mock server.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    fn url(&self, suffix: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.base_url, self.owner, self.repo, suffix
        )
    }

    fn request(&self, method: reqwest::Method, url: String) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .bearer_auth(&self.token)
            .header(reqwest::header::USER_AGENT, "stelno")
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
    }

    /// Publish `files` as one commit on `branch`.
    ///
    /// All earlier steps stage unreferenced objects; the branch is only
    /// moved by the final ref patch, so a failure at any step leaves it
    /// exactly where [`Self::get_ref`] found it.
    pub async fn publish(
        &self,
        files: &[PublishFile],
        message: &str,
        branch: &str,
    ) -> Result<CommitPlan, PublishError> {
        let base_sha = self.get_ref(branch).await?;

        // Blob creation is order-independent and idempotent: identical
        // content yields the same sha.
        let blobs = future::try_join_all(files.iter().map(|file| self.blob_for(file))).await?;

        let tree_sha = self.create_tree(&base_sha, &blobs).await?;
        let commit_sha = self.create_commit(message, &tree_sha, &base_sha).await?;
        self.update_ref(branch, &commit_sha).await?;

        Ok(CommitPlan {
            base_sha,
            blobs,
            tree_sha,
            commit_sha,
        })
    }

    async fn blob_for(&self, file: &PublishFile) -> Result<(String, String), PublishError> {
        let content = tokio::fs::read(&file.local_path)
            .await
            .context(ReadFileSnafu {
                path: file.local_path.clone(),
            })?;
        let sha = self.create_blob(&content).await?;
        Ok((file.repo_path.clone(), sha))
    }

    /// Current tip commit sha of `branch`.
    pub async fn get_ref(&self, branch: &str) -> Result<String, PublishError> {
        let step = PublishStep::GetRef;
        let response = self
            .request(
                reqwest::Method::GET,
                self.url(&format!("git/ref/heads/{}", encode_ref(branch))),
            )
            .send()
            .await
            .context(TransportSnafu { step })?;

        let parsed: RefResponse = expect_success(step, response)
            .await?
            .json()
            .await
            .context(TransportSnafu { step })?;
        Ok(parsed.object.sha)
    }

    async fn create_blob(&self, content: &[u8]) -> Result<String, PublishError> {
        let step = PublishStep::CreateBlob;
        let response = self
            .request(reqwest::Method::POST, self.url("git/blobs"))
            .json(&json!({
                "content": BASE64.encode(content),
                "encoding": "base64",
            }))
            .send()
            .await
            .context(TransportSnafu { step })?;

        let parsed: ShaResponse = expect_success(step, response)
            .await?
            .json()
            .await
            .context(TransportSnafu { step })?;
        Ok(parsed.sha)
    }

    async fn create_tree(
        &self,
        base_sha: &str,
        blobs: &[(String, String)],
    ) -> Result<String, PublishError> {
        let step = PublishStep::CreateTree;
        let entries: Vec<_> = blobs
            .iter()
            .map(|(path, sha)| {
                json!({
                    "path": path,
                    "mode": "100644",
                    "type": "blob",
                    "sha": sha,
                })
            })
            .collect();

        let response = self
            .request(reqwest::Method::POST, self.url("git/trees"))
            .json(&json!({
                "base_tree": base_sha,
                "tree": entries,
            }))
            .send()
            .await
            .context(TransportSnafu { step })?;

        let parsed: ShaResponse = expect_success(step, response)
            .await?
            .json()
            .await
            .context(TransportSnafu { step })?;
        Ok(parsed.sha)
    }

    async fn create_commit(
        &self,
        message: &str,
        tree_sha: &str,
        parent_sha: &str,
    ) -> Result<String, PublishError> {
        let step = PublishStep::CreateCommit;
        let response = self
            .request(reqwest::Method::POST, self.url("git/commits"))
            .json(&json!({
                "message": message,
                "tree": tree_sha,
                "parents": [parent_sha],
            }))
            .send()
            .await
            .context(TransportSnafu { step })?;

        let parsed: ShaResponse = expect_success(step, response)
            .await?
            .json()
            .await
            .context(TransportSnafu { step })?;
        Ok(parsed.sha)
    }

    async fn update_ref(&self, branch: &str, sha: &str) -> Result<(), PublishError> {
        let step = PublishStep::UpdateRef;
        let response = self
            .request(
                reqwest::Method::PATCH,
                self.url(&format!("git/refs/heads/{}", encode_ref(branch))),
            )
            .json(&json!({
                "sha": sha,
                "force": false,
            }))
            .send()
            .await
            .context(TransportSnafu { step })?;

        expect_success(step, response).await?;
        Ok(())
    }
}

/// Percent-encode each branch path segment, keeping the separators.
fn encode_ref(branch: &str) -> String {
    branch
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

async fn expect_success(
    step: PublishStep,
    response: reqwest::Response,
) -> Result<reqwest::Response, PublishError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response.text().await.unwrap_or_default();
    ApiSnafu {
        step,
        status: status.as_u16(),
        message,
    }
    .fail()
}
