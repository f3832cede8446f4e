//! Container image collaborator.
//!
//! Image deployments hand the build directory to an [`ImageBuilder`]; how the
//! image is actually built and pushed is up to the implementation.

pub mod docker;

use std::path::Path;

pub use docker::DockerCli;

use crate::config::{EnvironmentConfiguration, ProjectConfiguration};
use crate::error::Result;
use crate::remote::DeploymentImage;
use crate::types::Architecture;

/// Inputs for building one environment's image.
#[derive(Debug, Clone, Copy)]
pub struct ImageBuildRequest<'a> {
    /// Build context (the prepared application directory)
    pub context: &'a Path,
    pub dockerfile: &'a Path,
    /// Local tag for the built image
    pub tag: &'a str,
    pub architecture: Architecture,
}

pub trait ImageBuilder {
    /// Build an image from a prepared context.
    fn build(&self, request: &ImageBuildRequest<'_>) -> Result<()>;

    /// Push a locally built image to the registry location issued for a deployment.
    fn push(&self, local_tag: &str, image: &DeploymentImage) -> Result<()>;
}

/// Local tag for a project's environment image, e.g. `storefront:production`.
pub fn image_tag(project: &ProjectConfiguration, environment: &EnvironmentConfiguration) -> String {
    let sanitize = |s: &str| {
        s.to_lowercase()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                    c
                } else {
                    '-'
                }
            })
            .collect::<String>()
    };
    format!("{}:{}", sanitize(&project.name), sanitize(&environment.name))
}
