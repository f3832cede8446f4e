//! Remote deployment monitoring and cancellation.

pub mod cancel;
pub mod deployment;
pub mod policy;

pub use cancel::CancellationToken;
pub use deployment::{DeploymentMonitor, MonitorObserver, MonitorReport, NoopMonitorObserver};
pub use policy::PollPolicy;
