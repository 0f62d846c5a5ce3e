// ABOUTME: Deployment orchestrator: resolves, validates, then dispatches per artifact kind.
// ABOUTME: Local failures abort before any remote contact; the session is closed on every path.

use crate::activate::{self, ActivationReport};
use crate::archive;
use crate::artifact::{ArtifactDescriptor, ArtifactKind};
use crate::config::Config;
use crate::environment::{self, EnvironmentName, EnvironmentProfile};
use crate::error::{Error, Result};
use crate::publish::{CommitPlan, PublishFile, RepoClient};
use crate::ssh::{Session, SessionConfig};

/// Everything one deployment invocation needs, passed in explicitly.
#[derive(Debug, Clone)]
pub struct DeploymentRequest {
    pub artifact: ArtifactDescriptor,
    /// Explicit environment; None means branch-based detection.
    pub environment: Option<EnvironmentName>,
}

/// What a successful deployment produced.
#[derive(Debug)]
pub enum DeploymentOutcome {
    /// Web content was committed to the site repository.
    Published { plan: CommitPlan },
    /// A service was installed and restarted on the remote host.
    Activated { report: ActivationReport },
}

/// Run one deployment to completion or failure.
pub async fn run(config: &Config, request: DeploymentRequest) -> Result<DeploymentOutcome> {
    let profile = environment::resolve(config, request.environment).await?;
    println!("  → Deploying to {} ({})", profile.name, profile.host);

    request.artifact.validate()?;

    match request.artifact.kind {
        ArtifactKind::LinuxService => deploy_service(config, &profile, &request.artifact).await,
        ArtifactKind::WebContent => deploy_web(config, &request.artifact).await,
    }
    // `profile` drops here: materialized key files are removed only
    // after the session is long closed.
}

/// Package, upload, and activate a service artifact on the remote host.
async fn deploy_service(
    config: &Config,
    profile: &EnvironmentProfile,
    artifact: &ArtifactDescriptor,
) -> Result<DeploymentOutcome> {
    let archive = archive::package(&artifact.source)?;
    println!(
        "  → Packaged {} file(s) into {}",
        archive.entries.len(),
        archive.local_path.display()
    );

    let mut ssh_config = SessionConfig::new(&profile.host, &profile.user, profile.key.path())
        .port(profile.port)
        .trust_on_first_use(profile.trust_first_connection)
        .command_timeout(config.command_timeout);
    if let Some(ref known_hosts) = profile.known_hosts {
        ssh_config = ssh_config.known_hosts_path(known_hosts);
    }

    println!("  → Connecting to {}...", profile.host);
    let session = Session::connect(ssh_config).await?;

    let remote_name = activate::remote_archive_name();
    println!("  → Uploading archive...");
    if let Err(e) = session.upload(&archive.local_path, remote_name).await {
        // No activation was attempted; close the channel and surface the
        // transfer error as-is.
        if let Err(disconnect_err) = session.disconnect().await {
            tracing::warn!("failed to cleanly disconnect: {disconnect_err}");
        }
        return Err(e.into());
    }

    println!("  → Activating...");
    let plan = activate::activation_plan(config, remote_name);
    let report = activate::activate(&session, &plan).await;

    if let Err(e) = session.disconnect().await {
        tracing::warn!("failed to cleanly disconnect: {e}");
    }

    for outcome in report.failed_steps() {
        eprintln!("  ✗ step {} failed", outcome.step.name);
    }

    if report.succeeded() {
        println!("  ✓ Service activated ({} steps)", report.total());
        Ok(DeploymentOutcome::Activated { report })
    } else {
        Err(Error::ActivationFailed { report })
    }
}

/// Publish a web artifact as one atomic commit.
async fn deploy_web(config: &Config, artifact: &ArtifactDescriptor) -> Result<DeploymentOutcome> {
    let repo = config.repository.as_ref().ok_or_else(|| {
        Error::InvalidConfig("web content deployment requires a repository section".to_string())
    })?;

    let token = std::env::var(&repo.token_env)
        .map_err(|_| Error::MissingEnvVar(repo.token_env.clone()))?;

    let files = PublishFile::from_artifact(&artifact.source, &repo.prefix)?;
    println!(
        "  → Publishing {} file(s) to {}/{} ({})",
        files.len(),
        repo.owner,
        repo.name,
        repo.branch
    );

    let mut client = RepoClient::new(&repo.owner, &repo.name, token);
    if let Some(ref api_url) = repo.api_url {
        client = client.with_base_url(api_url);
    }

    let message = format!("Deploy {} ({} files)", config.service, files.len());
    let plan = client.publish(&files, &message, &repo.branch).await?;

    println!("  ✓ Published commit {}", plan.commit_sha);
    Ok(DeploymentOutcome::Published { plan })
}
