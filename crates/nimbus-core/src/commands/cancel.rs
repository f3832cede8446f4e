//! Cancel command: stop a running deployment by id.

use crate::error::Result;
use crate::monitor::{DeploymentMonitor, MonitorObserver, NoopMonitorObserver, PollPolicy};
use crate::remote::{Deployment, RemoteApi};

#[derive(Debug, Clone)]
pub struct CancelReport {
    /// Record observed after the cancellation settled
    pub deployment: Deployment,
    /// The deployment had already ended; no request was sent
    pub already_terminal: bool,
}

pub struct CancelCommand<'a> {
    remote: &'a dyn RemoteApi,
    policy: PollPolicy,
    observer: &'a dyn MonitorObserver,
}

impl<'a> CancelCommand<'a> {
    pub fn new(remote: &'a dyn RemoteApi) -> Self {
        Self {
            remote,
            policy: PollPolicy::default(),
            observer: &NoopMonitorObserver,
        }
    }

    pub fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_observer(mut self, observer: &'a dyn MonitorObserver) -> Self {
        self.observer = observer;
        self
    }

    pub fn execute(&self, deployment_id: u64) -> Result<CancelReport> {
        let current = self.remote.get_deployment(deployment_id)?;
        if current.status.is_terminal() {
            return Ok(CancelReport {
                deployment: current,
                already_terminal: true,
            });
        }

        let deployment = DeploymentMonitor::new(self.remote)
            .with_policy(self.policy)
            .with_observer(self.observer)
            .cancel(deployment_id)?;
        Ok(CancelReport {
            deployment,
            already_terminal: false,
        })
    }
}
