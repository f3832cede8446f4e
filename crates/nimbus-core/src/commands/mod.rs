//! High-level commands for nimbus operations.
//!
//! Each command wires configuration, collaborators and observers together
//! and returns a report; front ends decide how to present it.

pub mod build;
pub mod cancel;
pub mod deploy;

pub use build::{BuildCommand, BuildOptions, BuildOutcome};
pub use cancel::{CancelCommand, CancelReport};
pub use deploy::{DeployCommand, DeployOptions, DeployReport};
