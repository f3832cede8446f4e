//! Build command: run an environment's build steps locally.

use std::path::PathBuf;

use crate::build::{
    BuildObserver, BuildPaths, BuildPipeline, BuildReport, NoopBuildObserver, build_steps,
};
use crate::config::{EnvironmentConfiguration, ProjectConfiguration, ProjectStore};
use crate::error::Result;
use crate::image::ImageBuilder;
use crate::types::DeploymentType;

/// Options for the build command
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Environment to build for
    pub environment: String,
}

impl BuildOptions {
    pub fn new(environment: impl Into<String>) -> Self {
        Self {
            environment: environment.into(),
        }
    }
}

/// Result of a build
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub project: ProjectConfiguration,
    pub environment: EnvironmentConfiguration,
    pub deployment_type: DeploymentType,
    pub paths: BuildPaths,
    pub report: BuildReport,
}

/// Build command orchestrator
pub struct BuildCommand<'a> {
    project_root: PathBuf,
    image_builder: &'a dyn ImageBuilder,
    observer: &'a dyn BuildObserver,
}

impl<'a> BuildCommand<'a> {
    pub fn new(project_root: PathBuf, image_builder: &'a dyn ImageBuilder) -> Self {
        Self {
            project_root,
            image_builder,
            observer: &NoopBuildObserver,
        }
    }

    pub fn with_observer(mut self, observer: &'a dyn BuildObserver) -> Self {
        self.observer = observer;
        self
    }

    /// Load the manifest, resolve the environment and run its build steps.
    pub fn execute(&self, options: &BuildOptions) -> Result<BuildOutcome> {
        let store = ProjectStore::new(self.project_root.clone());
        let project = store.load()?;
        let environment = project.environment(&options.environment)?.clone();
        let deployment_type = environment.deployment_type()?;

        let paths = BuildPaths::new(store.project_root());
        let steps = build_steps(
            project.project_type,
            deployment_type,
            &paths,
            self.image_builder,
        );

        tracing::info!(
            project = %project.name,
            environment = %environment.name,
            project_type = %project.project_type,
            %deployment_type,
            "building"
        );
        let report = BuildPipeline::with_observer(self.observer).perform(
            &steps,
            &environment,
            &project,
        )?;

        Ok(BuildOutcome {
            project,
            environment,
            deployment_type,
            paths,
            report,
        })
    }
}
