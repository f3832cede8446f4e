//! Ordered build steps per project type and deployment type.

use super::steps::{
    BuildContainerImage, CompressApplication, CopyApplication, ExecuteBuildCommands,
    ExtractAssets, RemoveIgnoredFiles, SetBuildEnvironment,
};
use super::{BuildPaths, BuildStep, ProjectType};
use crate::image::ImageBuilder;
use crate::types::DeploymentType;

/// Assemble the build steps for a project, in execution order.
///
/// Static projects ship no code, so their list ends once assets are extracted
/// whatever the deployment type.
pub fn build_steps<'a>(
    project_type: ProjectType,
    deployment_type: DeploymentType,
    paths: &BuildPaths,
    image_builder: &'a dyn ImageBuilder,
) -> Vec<Box<dyn BuildStep + 'a>> {
    let mut steps: Vec<Box<dyn BuildStep + 'a>> = vec![
        Box::new(CopyApplication::new(paths.clone())),
        Box::new(SetBuildEnvironment::new(paths.clone())),
        Box::new(ExecuteBuildCommands::new(paths.clone())),
    ];

    if !project_type.ships_code() {
        steps.push(Box::new(ExtractAssets::new(paths.clone())));
        return steps;
    }

    steps.push(Box::new(RemoveIgnoredFiles::new(paths.clone())));
    steps.push(Box::new(ExtractAssets::new(paths.clone())));
    match deployment_type {
        DeploymentType::Zip => steps.push(Box::new(CompressApplication::new(paths.clone()))),
        DeploymentType::Image => steps.push(Box::new(BuildContainerImage::new(
            paths.clone(),
            image_builder,
        ))),
    }
    steps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::DockerCli;

    fn descriptions(project_type: ProjectType, deployment_type: DeploymentType) -> Vec<String> {
        let docker = DockerCli::default();
        build_steps(
            project_type,
            deployment_type,
            &BuildPaths::new("/tmp/project"),
            &docker,
        )
        .iter()
        .map(|step| step.description())
        .collect()
    }

    #[test]
    fn zip_projects_end_with_compression() {
        assert_eq!(
            descriptions(ProjectType::Node, DeploymentType::Zip),
            vec![
                "Copying application files",
                "Setting build environment",
                "Executing build commands",
                "Removing ignored files",
                "Extracting assets",
                "Compressing application",
            ]
        );
    }

    #[test]
    fn image_projects_end_with_image_build() {
        let steps = descriptions(ProjectType::Generic, DeploymentType::Image);
        assert_eq!(steps.len(), 6);
        assert_eq!(steps.last().unwrap(), "Building container image");
    }

    #[test]
    fn static_projects_stop_after_assets() {
        for deployment_type in [DeploymentType::Zip, DeploymentType::Image] {
            assert_eq!(
                descriptions(ProjectType::Static, deployment_type),
                vec![
                    "Copying application files",
                    "Setting build environment",
                    "Executing build commands",
                    "Extracting assets",
                ]
            );
        }
    }
}
