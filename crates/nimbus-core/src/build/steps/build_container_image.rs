use crate::build::{BuildPaths, BuildStep};
use crate::config::{EnvironmentConfiguration, ProjectConfiguration};
use crate::error::{DeployError, Result};
use crate::image::{ImageBuildRequest, ImageBuilder, image_tag};

/// Build the environment's container image from the prepared build directory.
pub struct BuildContainerImage<'a> {
    paths: BuildPaths,
    builder: &'a dyn ImageBuilder,
}

impl<'a> BuildContainerImage<'a> {
    pub fn new(paths: BuildPaths, builder: &'a dyn ImageBuilder) -> Self {
        Self { paths, builder }
    }
}

impl BuildStep for BuildContainerImage<'_> {
    fn description(&self) -> String {
        "Building container image".to_string()
    }

    fn perform(
        &self,
        environment: &EnvironmentConfiguration,
        project: &ProjectConfiguration,
    ) -> Result<()> {
        let dockerfile = self
            .paths
            .project_root()
            .join(environment.dockerfile_path());
        if !dockerfile.is_file() {
            return Err(DeployError::Build(format!(
                "missing Dockerfile: expected {}",
                dockerfile.display()
            )));
        }

        let tag = image_tag(project, environment);
        let context = self.paths.app_dir();
        self.builder.build(&ImageBuildRequest {
            context: &context,
            dockerfile: &dockerfile,
            tag: &tag,
            architecture: environment.architecture,
        })
    }
}
