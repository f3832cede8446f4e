use std::fs;

use anyhow::Context;

use crate::build::{BuildPaths, BuildStep};
use crate::config::{EnvironmentConfiguration, ProjectConfiguration};
use crate::error::Result;

/// Variable naming the target environment inside the build's `.env`
pub const ENVIRONMENT_VARIABLE: &str = "NIMBUS_ENVIRONMENT";

/// Select the environment-specific `.env` file for the build.
///
/// `.env.<environment>` replaces `.env` when present, and the result always
/// names the environment it was built for.
pub struct SetBuildEnvironment {
    paths: BuildPaths,
}

impl SetBuildEnvironment {
    pub fn new(paths: BuildPaths) -> Self {
        Self { paths }
    }
}

impl BuildStep for SetBuildEnvironment {
    fn description(&self) -> String {
        "Setting build environment".to_string()
    }

    fn perform(
        &self,
        environment: &EnvironmentConfiguration,
        _project: &ProjectConfiguration,
    ) -> Result<()> {
        let app_dir = self.paths.app_dir();
        let env_file = app_dir.join(".env");
        let specific = app_dir.join(format!(".env.{}", environment.name));

        if specific.is_file() {
            fs::copy(&specific, &env_file).with_context(|| {
                format!("Failed to copy {} to {}", specific.display(), env_file.display())
            })?;
        }

        let existing = if env_file.is_file() {
            fs::read_to_string(&env_file)
                .with_context(|| format!("Failed to read {}", env_file.display()))?
        } else {
            String::new()
        };

        let prefix = format!("{}=", ENVIRONMENT_VARIABLE);
        let mut content = String::with_capacity(existing.len() + prefix.len() + 16);
        for line in existing.lines().filter(|line| !line.starts_with(&prefix)) {
            content.push_str(line);
            content.push('\n');
        }
        content.push_str(&prefix);
        content.push_str(&environment.name);
        content.push('\n');

        fs::write(&env_file, content)
            .with_context(|| format!("Failed to write {}", env_file.display()))?;
        Ok(())
    }
}
