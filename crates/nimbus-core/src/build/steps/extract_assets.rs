use crate::build::{BuildPaths, BuildStep};
use crate::config::{EnvironmentConfiguration, ProjectConfiguration};
use crate::error::Result;
use crate::fs::{copy_tree, recreate_dir};

/// Copy the project type's asset directory out of the build for separate
/// delivery. The result is empty when the build has no assets.
pub struct ExtractAssets {
    paths: BuildPaths,
}

impl ExtractAssets {
    pub fn new(paths: BuildPaths) -> Self {
        Self { paths }
    }
}

impl BuildStep for ExtractAssets {
    fn description(&self) -> String {
        "Extracting assets".to_string()
    }

    fn perform(
        &self,
        _environment: &EnvironmentConfiguration,
        project: &ProjectConfiguration,
    ) -> Result<()> {
        let assets_dir = self.paths.assets_dir();
        recreate_dir(&assets_dir)?;

        let source = self.paths.app_dir().join(project.project_type.assets_dir());
        if !source.is_dir() {
            tracing::debug!(source = %source.display(), "no assets directory in build");
            return Ok(());
        }

        let copied = copy_tree(&source, &assets_dir, |_| false)?;
        tracing::debug!(files = copied, "extracted assets");
        Ok(())
    }
}
