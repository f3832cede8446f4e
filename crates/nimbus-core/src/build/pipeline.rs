//! Ordered, fail-fast execution of build steps.

use std::time::{Duration, Instant};

use super::BuildStep;
use crate::config::{EnvironmentConfiguration, ProjectConfiguration};
use crate::error::Result;

/// Receives build progress.
pub trait BuildObserver {
    fn step_started(&self, _index: usize, _total: usize, _description: &str) {}
}

/// Observer that ignores every event
#[derive(Debug, Default)]
pub struct NoopBuildObserver;

impl BuildObserver for NoopBuildObserver {}

#[derive(Debug, Clone)]
pub struct BuildReport {
    /// Descriptions of the steps that ran, in order
    pub steps: Vec<String>,
    pub elapsed: Duration,
}

/// Runs build steps strictly in declared order.
///
/// The first error stops the build and is returned annotated with the failing
/// step's description. Nothing is retried or rolled back here; each step
/// cleans up after a previous run itself.
pub struct BuildPipeline<'a> {
    observer: &'a dyn BuildObserver,
}

impl Default for BuildPipeline<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> BuildPipeline<'a> {
    pub fn new() -> Self {
        Self {
            observer: &NoopBuildObserver,
        }
    }

    pub fn with_observer(observer: &'a dyn BuildObserver) -> Self {
        Self { observer }
    }

    pub fn perform(
        &self,
        steps: &[Box<dyn BuildStep + '_>],
        environment: &EnvironmentConfiguration,
        project: &ProjectConfiguration,
    ) -> Result<BuildReport> {
        let started = Instant::now();
        let total = steps.len();
        let mut completed = Vec::with_capacity(total);

        for (index, step) in steps.iter().enumerate() {
            let description = step.description();
            tracing::info!(step = %description, environment = %environment.name, "build step");
            self.observer.step_started(index, total, &description);

            step.perform(environment, project)
                .map_err(|e| e.in_step(description.clone()))?;

            completed.push(description);
        }

        Ok(BuildReport {
            steps: completed,
            elapsed: started.elapsed(),
        })
    }
}
