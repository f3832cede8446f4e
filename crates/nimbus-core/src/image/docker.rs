//! Image builder backed by the `docker` command line.

use std::io::Write;
use std::process::{Command, Stdio};

use super::{ImageBuildRequest, ImageBuilder};
use crate::error::{DeployError, Result};
use crate::remote::DeploymentImage;

/// Registry user paired with the short-lived authorization token
const REGISTRY_USER: &str = "nimbus";

#[derive(Debug, Clone)]
pub struct DockerCli {
    binary: String,
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new("docker")
    }
}

impl DockerCli {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn run(&self, args: &[&str]) -> Result<()> {
        tracing::debug!(binary = %self.binary, ?args, "running docker");
        let status = Command::new(&self.binary).args(args).status().map_err(|e| {
            DeployError::Build(format!("failed to run {}: {}", self.binary, e))
        })?;
        if !status.success() {
            return Err(DeployError::Build(format!(
                "{} {} exited with {}",
                self.binary,
                args.first().copied().unwrap_or_default(),
                status
            )));
        }
        Ok(())
    }

    fn login(&self, registry: &str, token: &str) -> Result<()> {
        let mut child = Command::new(&self.binary)
            .args(["login", "--username", REGISTRY_USER, "--password-stdin", registry])
            .stdin(Stdio::piped())
            .spawn()
            .map_err(|e| DeployError::Build(format!("failed to run {}: {}", self.binary, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(token.as_bytes())?;
        }
        let status = child.wait()?;
        if !status.success() {
            return Err(DeployError::Build(format!(
                "registry login to {} failed ({})",
                registry, status
            )));
        }
        Ok(())
    }
}

impl ImageBuilder for DockerCli {
    fn build(&self, request: &ImageBuildRequest<'_>) -> Result<()> {
        let dockerfile = request.dockerfile.to_string_lossy();
        let context = request.context.to_string_lossy();
        self.run(&[
            "build",
            "--platform",
            request.architecture.docker_platform(),
            "--file",
            &dockerfile,
            "--tag",
            request.tag,
            &context,
        ])
    }

    fn push(&self, local_tag: &str, image: &DeploymentImage) -> Result<()> {
        self.login(image.registry(), &image.authorization_token)?;
        self.run(&["tag", local_tag, &image.image_uri])?;
        self.run(&["push", &image.image_uri])
    }
}
