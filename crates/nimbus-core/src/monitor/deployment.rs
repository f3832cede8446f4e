//! Drives a remote deployment to a terminal state.
//!
//! ```text
//! pending ──▶ running ──▶ finished | failed        (server decides)
//!    └──────────┴──▶ cancelling ──▶ cancelled      (operator asks)
//! ```
//!
//! The monitor only ever originates `cancelling`. Every other transition is
//! observed by re-reading the deployment; nothing is cached between polls.

use std::thread;
use std::time::{Duration, Instant};

use super::cancel::CancellationToken;
use super::policy::PollPolicy;
use crate::error::{DeployError, Result};
use crate::remote::{Deployment, DeploymentStep, RemoteApi};
use crate::types::{DeploymentStatus, StepStatus};

/// Receives deployment progress.
pub trait MonitorObserver {
    fn deployment_started(&self, _deployment_id: u64) {}
    fn step_started(&self, _index: usize, _total: usize, _step: &DeploymentStep) {}
    fn step_finished(&self, _index: usize, _total: usize, _step: &DeploymentStep) {}
    fn cancelling(&self, _deployment_id: u64) {}
    fn cancelled(&self, _deployment: &Deployment) {}
}

/// Observer that ignores every event
#[derive(Debug, Default)]
pub struct NoopMonitorObserver;

impl MonitorObserver for NoopMonitorObserver {}

#[derive(Debug, Clone)]
pub struct MonitorReport {
    /// Final authoritative record
    pub deployment: Deployment,
    pub elapsed: Duration,
}

pub struct DeploymentMonitor<'a> {
    remote: &'a dyn RemoteApi,
    policy: PollPolicy,
    token: CancellationToken,
    observer: &'a dyn MonitorObserver,
}

impl<'a> DeploymentMonitor<'a> {
    pub fn new(remote: &'a dyn RemoteApi) -> Self {
        Self {
            remote,
            policy: PollPolicy::default(),
            token: CancellationToken::new(),
            observer: &NoopMonitorObserver,
        }
    }

    pub fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_token(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    pub fn with_observer(mut self, observer: &'a dyn MonitorObserver) -> Self {
        self.observer = observer;
        self
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Start a deployment and follow it until it finishes.
    ///
    /// Steps are followed in the order the server lists them. A failed step
    /// aborts with the server's message. If the token is cancelled, the
    /// deployment is cancelled remotely and the outcome is confirmed:
    /// [`DeployError::Cancelled`] when the server cancelled it, the usual
    /// report or failure when it had already finished or failed.
    pub fn run(&self, deployment_id: u64) -> Result<MonitorReport> {
        let started = Instant::now();
        if self.token.is_cancelled() {
            return self.abort(deployment_id, started);
        }

        self.remote.start_deployment(deployment_id)?;
        self.observer.deployment_started(deployment_id);
        tracing::info!(deployment = deployment_id, "deployment started");

        let Some(deployment) = self.poll(
            deployment_id,
            self.policy.start_timeout,
            "deployment to start",
            true,
            |d| Ok(d.status != DeploymentStatus::Pending),
        )?
        else {
            return self.abort(deployment_id, started);
        };
        check_outcome(&deployment)?;

        let steps = deployment.steps.clone();
        let total = steps.len();
        for (index, step) in steps.iter().enumerate() {
            tracing::info!(deployment = deployment_id, step = %step.task_name, "deployment step");
            self.observer.step_started(index, total, step);

            let waiting_for = format!("step '{}'", step.task_name);
            let finished = self.poll(
                deployment_id,
                self.policy.step_timeout,
                &waiting_for,
                true,
                |d| step_finished(d, step.id),
            )?;
            if finished.is_none() {
                return self.abort(deployment_id, started);
            }

            self.observer.step_finished(index, total, step);
        }

        let Some(deployment) = self.poll(
            deployment_id,
            self.policy.step_timeout,
            "deployment to finish",
            true,
            |d| Ok(d.status.is_terminal()),
        )?
        else {
            return self.abort(deployment_id, started);
        };
        check_outcome(&deployment)?;

        Ok(MonitorReport {
            deployment,
            elapsed: started.elapsed(),
        })
    }

    /// Request cancellation and wait for the server to confirm it.
    ///
    /// Returns the record observed once the status left `cancelling`.
    pub fn cancel(&self, deployment_id: u64) -> Result<Deployment> {
        tracing::info!(deployment = deployment_id, "cancelling deployment");
        self.observer.cancelling(deployment_id);
        self.remote.cancel_deployment(deployment_id)?;

        let deployment = self.wait_for_status_change(
            deployment_id,
            DeploymentStatus::Cancelling,
            self.policy.start_timeout,
        )?;
        self.observer.cancelled(&deployment);
        Ok(deployment)
    }

    /// Poll until the deployment's status differs from `from`.
    ///
    /// Not cancellable; fails with a timeout error once `timeout` elapses.
    pub fn wait_for_status_change(
        &self,
        deployment_id: u64,
        from: DeploymentStatus,
        timeout: Duration,
    ) -> Result<Deployment> {
        let waiting_for = format!("deployment to leave '{}'", from);
        self.poll(deployment_id, timeout, &waiting_for, false, |d| {
            Ok(d.status != from)
        })?
        .ok_or_else(|| DeployError::Communication("status wait ended without a result".to_string()))
    }

    /// Cancel remotely and end `run` with whatever the server settled on.
    ///
    /// A cancel that arrives too late can leave the deployment `finished` or
    /// `failed`; only a `cancelled` record is reported as a cancellation.
    fn abort(&self, deployment_id: u64, started: Instant) -> Result<MonitorReport> {
        let deployment = self.cancel(deployment_id)?;
        match deployment.status {
            DeploymentStatus::Cancelled => Err(DeployError::Cancelled { deployment_id }),
            DeploymentStatus::Finished => {
                tracing::warn!(
                    deployment = deployment_id,
                    "deployment finished before the cancellation took effect"
                );
                Ok(MonitorReport {
                    deployment,
                    elapsed: started.elapsed(),
                })
            }
            DeploymentStatus::Failed => Err(DeployError::Remote {
                message: deployment.status_message,
            }),
            status => Err(DeployError::Communication(format!(
                "deployment {} reported '{}' after a cancel request",
                deployment_id, status
            ))),
        }
    }

    /// Re-read the deployment every interval until `done` holds.
    ///
    /// Returns `None` when a cancellable wait observes the token.
    fn poll<F>(
        &self,
        deployment_id: u64,
        timeout: Duration,
        waiting_for: &str,
        cancellable: bool,
        mut done: F,
    ) -> Result<Option<Deployment>>
    where
        F: FnMut(&Deployment) -> Result<bool>,
    {
        let started = Instant::now();
        loop {
            if cancellable && self.token.is_cancelled() {
                return Ok(None);
            }

            let deployment = self.remote.get_deployment(deployment_id)?;
            tracing::debug!(deployment = deployment_id, status = %deployment.status, "polled");
            if done(&deployment)? {
                return Ok(Some(deployment));
            }

            if started.elapsed() >= timeout {
                return Err(DeployError::Timeout {
                    waiting_for: waiting_for.to_string(),
                    seconds: timeout.as_secs(),
                });
            }

            if cancellable {
                if self.token.wait(self.policy.interval) {
                    return Ok(None);
                }
            } else {
                thread::sleep(self.policy.interval);
            }
        }
    }
}

/// Server-reported failure or cancellation as an error.
fn check_outcome(deployment: &Deployment) -> Result<()> {
    match deployment.status {
        DeploymentStatus::Failed => Err(DeployError::Remote {
            message: deployment.status_message.clone(),
        }),
        DeploymentStatus::Cancelled => Err(DeployError::Cancelled {
            deployment_id: deployment.id,
        }),
        _ => Ok(()),
    }
}

fn step_finished(deployment: &Deployment, step_id: u64) -> Result<bool> {
    let step = deployment.step(step_id).ok_or_else(|| {
        DeployError::Communication(format!(
            "deployment {} no longer reports step {}",
            deployment.id, step_id
        ))
    })?;

    match step.status {
        StepStatus::Finished => Ok(true),
        StepStatus::Failed => Err(DeployError::Remote {
            message: deployment.status_message.clone(),
        }),
        StepStatus::Cancelled => Err(DeployError::Cancelled {
            deployment_id: deployment.id,
        }),
        StepStatus::Pending | StepStatus::Running => {
            check_outcome(deployment)?;
            Ok(false)
        }
    }
}
