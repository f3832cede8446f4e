use crate::build::{BuildPaths, BuildStep, SCRATCH_DIR};
use crate::config::{EnvironmentConfiguration, ProjectConfiguration};
use crate::error::Result;
use crate::fs::{copy_tree, recreate_dir};

/// Top-level entries never copied into the build
const EXCLUDED: &[&str] = &[".git", SCRATCH_DIR];

/// Wipe the build directory and copy the project tree into it.
pub struct CopyApplication {
    paths: BuildPaths,
}

impl CopyApplication {
    pub fn new(paths: BuildPaths) -> Self {
        Self { paths }
    }
}

impl BuildStep for CopyApplication {
    fn description(&self) -> String {
        "Copying application files".to_string()
    }

    fn perform(
        &self,
        _environment: &EnvironmentConfiguration,
        _project: &ProjectConfiguration,
    ) -> Result<()> {
        let app_dir = self.paths.app_dir();
        recreate_dir(&app_dir)?;

        let copied = copy_tree(self.paths.project_root(), &app_dir, |relative| {
            EXCLUDED.contains(&relative)
        })?;
        tracing::debug!(files = copied, to = %app_dir.display(), "copied application");
        Ok(())
    }
}
