use std::fs;

use anyhow::Context;
use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::build::{BuildPaths, BuildStep};
use crate::config::{EnvironmentConfiguration, ProjectConfiguration};
use crate::error::{DeployError, Result};
use crate::fs::{prune_empty_dirs, walk_files};

/// Delete files the project type or environment excludes from the build.
///
/// An `include` glob wins over any ignore rule.
pub struct RemoveIgnoredFiles {
    paths: BuildPaths,
}

impl RemoveIgnoredFiles {
    pub fn new(paths: BuildPaths) -> Self {
        Self { paths }
    }
}

fn glob_set<'a>(patterns: impl IntoIterator<Item = &'a str>) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .map_err(|e| DeployError::Config(format!("invalid glob '{}': {}", pattern, e)))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| DeployError::Config(format!("invalid glob set: {}", e)))
}

impl BuildStep for RemoveIgnoredFiles {
    fn description(&self) -> String {
        "Removing ignored files".to_string()
    }

    fn perform(
        &self,
        environment: &EnvironmentConfiguration,
        project: &ProjectConfiguration,
    ) -> Result<()> {
        let ignored = glob_set(
            project
                .project_type
                .default_ignores()
                .iter()
                .copied()
                .chain(environment.ignore.iter().map(String::as_str)),
        )?;
        let included = glob_set(environment.include.iter().map(String::as_str))?;

        let app_dir = self.paths.app_dir();
        let mut removed = 0usize;
        for file in walk_files(&app_dir)? {
            if ignored.is_match(&file.relative) && !included.is_match(&file.relative) {
                fs::remove_file(&file.path)
                    .with_context(|| format!("Failed to remove {}", file.path.display()))?;
                removed += 1;
            }
        }
        prune_empty_dirs(&app_dir)?;

        tracing::debug!(removed, "removed ignored files");
        Ok(())
    }
}
