// ABOUTME: Remote activation sequencer: stop, unpack, relocate, restart.
// ABOUTME: Runs every step of the fixed sweep regardless of individual failures.

use crate::archive;
use crate::config::Config;
use crate::ssh::{self, CommandOutput, Session};
use async_trait::async_trait;
use nonempty::NonEmpty;

/// Command execution seam between the sequencer and the SSH session.
/// Tests substitute a scripted runner here.
#[async_trait]
pub trait RemoteExec {
    async fn run(&self, command: &str) -> ssh::Result<CommandOutput>;
}

#[async_trait]
impl RemoteExec for Session {
    async fn run(&self, command: &str) -> ssh::Result<CommandOutput> {
        self.exec(command).await
    }
}

/// One step of the activation sweep.
#[derive(Debug, Clone)]
pub struct ActivationStep {
    pub name: &'static str,
    pub command: String,
    /// Steps that tolerate a non-zero exit (stopping a service that is
    /// not running) set this to false.
    pub must_succeed: bool,
}

/// What happened when one step ran.
#[derive(Debug)]
pub enum StepStatus {
    /// The command ran to completion on the remote host.
    Exited { exit_code: u32, stderr: String },
    /// The command could not be executed at all (channel failure,
    /// timeout). Always counts as a failure.
    TransportFailed { reason: String },
}

#[derive(Debug)]
pub struct StepOutcome {
    pub step: ActivationStep,
    pub status: StepStatus,
}

impl StepOutcome {
    pub fn failed(&self) -> bool {
        match &self.status {
            StepStatus::Exited { exit_code, .. } => self.step.must_succeed && *exit_code != 0,
            StepStatus::TransportFailed { .. } => true,
        }
    }
}

/// Collected per-step outcomes of one activation sweep.
#[derive(Debug)]
pub struct ActivationReport {
    pub outcomes: Vec<StepOutcome>,
}

impl ActivationReport {
    /// Overall success: no step failed.
    pub fn succeeded(&self) -> bool {
        self.outcomes.iter().all(|o| !o.failed())
    }

    pub fn failed_steps(&self) -> impl Iterator<Item = &StepOutcome> {
        self.outcomes.iter().filter(|o| o.failed())
    }

    pub fn failed_count(&self) -> usize {
        self.failed_steps().count()
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }
}

/// Build the fixed, ordered activation sweep for a service deployment.
///
/// `archive_name` is the uploaded archive's filename in the remote user's
/// home directory. Command strings are fixed apart from configured paths;
/// all of those are single-quoted.
pub fn activation_plan(config: &Config, archive_name: &str) -> NonEmpty<ActivationStep> {
    let dir = &config.deploy_dir;
    let binary = &config.binary;
    let service = config.service.as_str();

    // Stopping a service that is not running is fine; pkill exits 1 when
    // nothing matched.
    let mut plan = NonEmpty::new(ActivationStep {
        name: "stop-service",
        command: format!("pkill -f '{dir}/{binary}'"),
        must_succeed: false,
    });

    plan.push(ActivationStep {
        name: "clear-previous",
        command: format!("rm -rf '{dir}'"),
        must_succeed: true,
    });

    plan.push(ActivationStep {
        name: "create-deploy-dir",
        command: format!("mkdir -p '{dir}'"),
        must_succeed: true,
    });

    plan.push(ActivationStep {
        name: "extract-archive",
        command: format!("tar -xzf '{archive_name}' -C '{dir}'"),
        must_succeed: true,
    });

    for path in &config.preserve {
        plan.push(ActivationStep {
            name: "restore-preserved",
            command: format!("cp -r '{path}' '{dir}/'"),
            must_succeed: true,
        });
    }

    plan.push(ActivationStep {
        name: "mark-executable",
        command: format!("chmod +x '{dir}/{binary}'"),
        must_succeed: true,
    });

    // nohup plus full stdio redirection detaches the service from the
    // session so it survives the disconnect.
    plan.push(ActivationStep {
        name: "launch-service",
        command: format!(
            "cd '{dir}' && nohup './{binary}' >> '{service}.log' 2>&1 < /dev/null &"
        ),
        must_succeed: true,
    });

    plan
}

/// Run every step of the sweep, in order, regardless of failures.
///
/// A failing mid-sequence step must not skip the steps after it; the
/// remote host is left in the most consistent state reachable, and the
/// report carries one outcome per step for the caller to act on.
pub async fn activate<R>(runner: &R, plan: &NonEmpty<ActivationStep>) -> ActivationReport
where
    R: RemoteExec + ?Sized,
{
    let mut outcomes = Vec::with_capacity(plan.len());

    for step in plan.iter() {
        tracing::debug!(step = step.name, command = %step.command, "running activation step");

        let status = match runner.run(&step.command).await {
            Ok(output) => {
                if !output.success() {
                    tracing::warn!(
                        step = step.name,
                        exit_code = output.exit_code,
                        "activation step exited non-zero"
                    );
                }
                StepStatus::Exited {
                    exit_code: output.exit_code,
                    stderr: output.stderr,
                }
            }
            Err(e) => {
                tracing::warn!(step = step.name, "activation step could not run: {e}");
                StepStatus::TransportFailed {
                    reason: e.to_string(),
                }
            }
        };

        outcomes.push(StepOutcome {
            step: step.clone(),
            status,
        });
    }

    ActivationReport { outcomes }
}

/// Remote filename the uploaded archive lands under, relative to the
/// remote user's home directory.
pub fn remote_archive_name() -> &'static str {
    archive::ARCHIVE_FILENAME
}
