//! Built-in build steps.
//!
//! Every step receives the [`BuildPaths`](super::BuildPaths) it works on at
//! construction and keeps nothing else between runs.

mod build_container_image;
mod compress_application;
mod copy_application;
mod execute_build_commands;
mod extract_assets;
mod remove_ignored_files;
mod set_build_environment;

pub use build_container_image::BuildContainerImage;
pub use compress_application::{CompressApplication, MAX_APPLICATION_SIZE};
pub use copy_application::CopyApplication;
pub use execute_build_commands::ExecuteBuildCommands;
pub use extract_assets::ExtractAssets;
pub use remove_ignored_files::RemoveIgnoredFiles;
pub use set_build_environment::{ENVIRONMENT_VARIABLE, SetBuildEnvironment};
