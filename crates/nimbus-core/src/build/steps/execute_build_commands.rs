use std::path::Path;
use std::process::Command;

use crate::build::{BuildPaths, BuildStep};
use crate::config::{EnvironmentConfiguration, ProjectConfiguration};
use crate::error::{DeployError, Result};

/// Run the environment's build commands inside the build directory.
pub struct ExecuteBuildCommands {
    paths: BuildPaths,
}

impl ExecuteBuildCommands {
    pub fn new(paths: BuildPaths) -> Self {
        Self { paths }
    }
}

fn shell_command(command: &str) -> Command {
    if cfg!(windows) {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", command]);
        cmd
    } else {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", command]);
        cmd
    }
}

fn run(command: &str, dir: &Path) -> Result<()> {
    tracing::info!(%command, "running build command");
    let status = shell_command(command)
        .current_dir(dir)
        .status()
        .map_err(|e| DeployError::Build(format!("failed to spawn `{}`: {}", command, e)))?;

    if !status.success() {
        let code = status
            .code()
            .map(|c| c.to_string())
            .unwrap_or_else(|| "signal".to_string());
        return Err(DeployError::Build(format!(
            "command `{}` exited with {}",
            command, code
        )));
    }
    Ok(())
}

impl BuildStep for ExecuteBuildCommands {
    fn description(&self) -> String {
        "Executing build commands".to_string()
    }

    fn perform(
        &self,
        environment: &EnvironmentConfiguration,
        _project: &ProjectConfiguration,
    ) -> Result<()> {
        let app_dir = self.paths.app_dir();
        for command in &environment.build {
            run(command, &app_dir)?;
        }
        Ok(())
    }
}
