// ABOUTME: Integration tests for the activation sequencer.
// ABOUTME: A scripted runner stands in for the SSH session to exercise the full-sweep policy.

use async_trait::async_trait;
use std::sync::Mutex;
use stelno::activate::{self, RemoteExec, StepStatus};
use stelno::config::Config;
use stelno::ssh::{self, CommandOutput};

fn test_config() -> Config {
    Config::from_yaml(
        r#"
service: myservice
binary: server.x86_64
deploy_dir: /home/deploy/myservice
preserve:
  - /home/deploy/certs
environments: {}
"#,
    )
    .unwrap()
}

/// Runs every command locally in memory, failing the ones whose command
/// string contains a configured marker.
struct ScriptedRunner {
    fail_containing: Vec<&'static str>,
    error_containing: Vec<&'static str>,
    commands: Mutex<Vec<String>>,
}

impl ScriptedRunner {
    fn new() -> Self {
        Self {
            fail_containing: Vec::new(),
            error_containing: Vec::new(),
            commands: Mutex::new(Vec::new()),
        }
    }

    fn failing_on(mut self, marker: &'static str) -> Self {
        self.fail_containing.push(marker);
        self
    }

    fn erroring_on(mut self, marker: &'static str) -> Self {
        self.error_containing.push(marker);
        self
    }

    fn executed(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteExec for ScriptedRunner {
    async fn run(&self, command: &str) -> ssh::Result<CommandOutput> {
        self.commands.lock().unwrap().push(command.to_string());

        if self.error_containing.iter().any(|m| command.contains(m)) {
            return Err(ssh::Error::ChannelClosed);
        }

        let fail = self.fail_containing.iter().any(|m| command.contains(m));
        Ok(CommandOutput {
            exit_code: if fail { 1 } else { 0 },
            stdout: String::new(),
            stderr: if fail { "boom".to_string() } else { String::new() },
        })
    }
}

/// Test: the plan is a fixed ordered sequence.
/// Expected: stop, clear, create, extract, restore, chmod, launch.
#[test]
fn plan_has_fixed_step_order() {
    let config = test_config();
    let plan = activate::activation_plan(&config, "stelno-artifact.tar.gz");

    let names: Vec<_> = plan.iter().map(|s| s.name).collect();
    assert_eq!(
        names,
        vec![
            "stop-service",
            "clear-previous",
            "create-deploy-dir",
            "extract-archive",
            "restore-preserved",
            "mark-executable",
            "launch-service",
        ]
    );

    // Only the stop step tolerates a non-zero exit.
    for step in plan.iter() {
        assert_eq!(step.must_succeed, step.name != "stop-service", "{}", step.name);
    }
}

/// Test: plan commands reference the configured paths.
/// Expected: deploy dir, binary, archive name, and preserve paths appear.
#[test]
fn plan_commands_use_configured_paths() {
    let config = test_config();
    let plan = activate::activation_plan(&config, "stelno-artifact.tar.gz");

    let commands: Vec<_> = plan.iter().map(|s| s.command.as_str()).collect();
    assert!(commands[0].contains("/home/deploy/myservice/server.x86_64"));
    assert!(commands[3].contains("tar -xzf 'stelno-artifact.tar.gz'"));
    assert!(commands[4].contains("/home/deploy/certs"));
    assert!(commands[6].contains("nohup"));
    assert!(commands[6].contains("&"));
}

/// Test: a clean sweep.
/// Expected: every step runs, the report is a success.
#[tokio::test]
async fn all_steps_succeeding_reports_success() {
    let config = test_config();
    let plan = activate::activation_plan(&config, "a.tar.gz");
    let runner = ScriptedRunner::new();

    let report = activate::activate(&runner, &plan).await;

    assert_eq!(runner.executed().len(), plan.len());
    assert!(report.succeeded());
    assert_eq!(report.failed_count(), 0);
    assert_eq!(report.total(), plan.len());
}

/// Test: a mid-sequence failure (preserved file relocation).
/// Expected: the remaining steps still run; the report is a failure
/// naming exactly the failed step.
#[tokio::test]
async fn mid_sequence_failure_does_not_abort_sweep() {
    let config = test_config();
    let plan = activate::activation_plan(&config, "a.tar.gz");
    let runner = ScriptedRunner::new().failing_on("cp -r");

    let report = activate::activate(&runner, &plan).await;

    // All steps executed, including the ones after the failure.
    assert_eq!(runner.executed().len(), plan.len());
    assert!(runner.executed().last().unwrap().contains("nohup"));

    assert!(!report.succeeded());
    let failed: Vec<_> = report.failed_steps().map(|o| o.step.name).collect();
    assert_eq!(failed, vec!["restore-preserved"]);

    // The outcome carries the captured stderr.
    let outcome = report.failed_steps().next().unwrap();
    match &outcome.status {
        StepStatus::Exited { exit_code, stderr } => {
            assert_eq!(*exit_code, 1);
            assert_eq!(stderr, "boom");
        }
        other => panic!("unexpected status: {other:?}"),
    }
}

/// Test: nothing to kill.
/// Expected: a non-zero exit from the stop step alone still reports
/// overall success.
#[tokio::test]
async fn stop_step_tolerates_nothing_to_kill() {
    let config = test_config();
    let plan = activate::activation_plan(&config, "a.tar.gz");
    let runner = ScriptedRunner::new().failing_on("pkill");

    let report = activate::activate(&runner, &plan).await;

    assert_eq!(runner.executed().len(), plan.len());
    assert!(report.succeeded());
}

/// Test: a transport failure on one step.
/// Expected: contained to that step; the sweep continues and the report
/// fails.
#[tokio::test]
async fn transport_failure_is_contained_per_step() {
    let config = test_config();
    let plan = activate::activation_plan(&config, "a.tar.gz");
    let runner = ScriptedRunner::new().erroring_on("chmod");

    let report = activate::activate(&runner, &plan).await;

    assert_eq!(runner.executed().len(), plan.len());
    assert!(!report.succeeded());

    let failed: Vec<_> = report.failed_steps().map(|o| o.step.name).collect();
    assert_eq!(failed, vec!["mark-executable"]);
    assert!(matches!(
        report.failed_steps().next().unwrap().status,
        StepStatus::TransportFailed { .. }
    ));
}

/// Test: a config without preserve paths.
/// Expected: the restore step is simply absent; order is otherwise fixed.
#[test]
fn preserve_steps_are_optional() {
    let config = Config::from_yaml(
        r#"
service: myservice
binary: server
deploy_dir: /srv/app
environments: {}
"#,
    )
    .unwrap();

    let plan = activate::activation_plan(&config, "a.tar.gz");
    let names: Vec<_> = plan.iter().map(|s| s.name).collect();
    assert!(!names.contains(&"restore-preserved"));
    assert_eq!(names.len(), 6);
}
