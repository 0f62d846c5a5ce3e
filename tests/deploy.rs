// ABOUTME: Integration tests for the deployment orchestrator's failure containment.
// ABOUTME: Local errors must abort before any packaging or remote contact happens.

use std::fs;
use stelno::artifact::{ArtifactDescriptor, ArtifactKind};
use stelno::config::Config;
use stelno::deploy::{self, DeploymentRequest};
use stelno::environment::EnvironmentName;
use stelno::error::Error;
use tempfile::TempDir;

fn config_yaml(extra: &str) -> Config {
    Config::from_yaml(&format!(
        r#"
service: myservice
binary: server
deploy_dir: /srv/myservice
environments:
  staging:
    host: staging.example.com
    user: deploy
    key: /tmp/staging-key
{extra}
"#
    ))
    .unwrap()
}

/// Test: web artifact without index.html, deployed as web content.
/// Expected: a validation error naming the entry point; the deployment
/// never reaches packaging or the network.
#[tokio::test]
async fn invalid_web_artifact_aborts_before_packaging() {
    let artifact_dir = TempDir::new().unwrap();
    fs::write(artifact_dir.path().join("style.css"), "body {}").unwrap();

    let config = config_yaml("");
    let request = DeploymentRequest {
        artifact: ArtifactDescriptor::new(ArtifactKind::WebContent, artifact_dir.path()),
        environment: Some(EnvironmentName::Staging),
    };

    let err = deploy::run(&config, request).await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert!(err.to_string().contains("index.html"));
}

/// Test: deploying to an environment that is not configured.
/// Expected: resolution fails before the artifact is even validated.
#[tokio::test]
async fn unconfigured_environment_aborts_first() {
    let config = config_yaml("");
    let request = DeploymentRequest {
        artifact: ArtifactDescriptor::new(ArtifactKind::LinuxService, "/nonexistent"),
        environment: Some(EnvironmentName::Production),
    };

    let err = deploy::run(&config, request).await.unwrap_err();
    assert!(matches!(
        err,
        Error::MissingEnvironment(EnvironmentName::Production)
    ));
}

/// Test: web content deployment without a repository section.
/// Expected: a configuration error, no publish attempt.
#[tokio::test]
async fn web_deploy_requires_repository_section() {
    let artifact_dir = TempDir::new().unwrap();
    fs::write(artifact_dir.path().join("index.html"), "<html></html>").unwrap();

    let config = config_yaml("");
    let request = DeploymentRequest {
        artifact: ArtifactDescriptor::new(ArtifactKind::WebContent, artifact_dir.path()),
        environment: Some(EnvironmentName::Staging),
    };

    let err = deploy::run(&config, request).await.unwrap_err();
    assert!(matches!(err, Error::InvalidConfig(_)));
    assert!(err.to_string().contains("repository"));
}

/// Test: web content deployment with the token variable unset.
/// Expected: a missing-env-var error naming the variable, before any
/// API call is made.
#[tokio::test]
async fn web_deploy_requires_token_variable() {
    let artifact_dir = TempDir::new().unwrap();
    fs::write(artifact_dir.path().join("index.html"), "<html></html>").unwrap();

    let config = config_yaml(
        r#"
repository:
  owner: example
  name: site
  token_env: STELNO_TEST_TOKEN_THAT_IS_NOT_SET
"#,
    );
    let request = DeploymentRequest {
        artifact: ArtifactDescriptor::new(ArtifactKind::WebContent, artifact_dir.path()),
        environment: Some(EnvironmentName::Staging),
    };

    let err = deploy::run(&config, request).await.unwrap_err();
    assert!(matches!(err, Error::MissingEnvVar(_)));
    assert!(err.to_string().contains("STELNO_TEST_TOKEN_THAT_IS_NOT_SET"));
}
