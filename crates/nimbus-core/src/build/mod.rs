//! Build pipeline: turns a project tree into a deployable artifact.
//!
//! A project type declares an ordered list of [`BuildStep`]s (see
//! [`registry::build_steps`]); [`pipeline::BuildPipeline`] runs them in order
//! and stops at the first failure.

pub mod paths;
pub mod pipeline;
pub mod project_type;
pub mod registry;
pub mod steps;

pub use paths::{BuildPaths, SCRATCH_DIR};
pub use pipeline::{BuildObserver, BuildPipeline, BuildReport, NoopBuildObserver};
pub use project_type::ProjectType;
pub use registry::build_steps;

use crate::config::{EnvironmentConfiguration, ProjectConfiguration};
use crate::error::Result;

/// One discrete, ordered operation that transforms project source into
/// artifact form.
///
/// Steps hold no state across invocations. Re-running a step must be safe:
/// a step that owns an output directory recreates it from scratch.
pub trait BuildStep {
    /// Human-readable description, used for progress and error annotation.
    fn description(&self) -> String;

    /// Run the step for one environment.
    fn perform(
        &self,
        environment: &EnvironmentConfiguration,
        project: &ProjectConfiguration,
    ) -> Result<()>;
}
