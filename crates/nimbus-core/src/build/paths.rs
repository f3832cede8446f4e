use std::path::{Path, PathBuf};

/// Scratch directory at the project root holding every build output
pub const SCRATCH_DIR: &str = ".nimbus";

/// Locations of the transient build outputs for one project.
///
/// The scratch tree is owned by a single in-flight build; concurrent builds
/// of the same project are not supported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPaths {
    project_root: PathBuf,
    build_root: PathBuf,
}

impl BuildPaths {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        let project_root = project_root.into();
        let build_root = project_root.join(SCRATCH_DIR).join("build");
        Self {
            project_root,
            build_root,
        }
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Parent of every build output.
    pub fn build_root(&self) -> &Path {
        &self.build_root
    }

    /// Working copy of the application that build commands run in.
    pub fn app_dir(&self) -> PathBuf {
        self.build_root.join("app")
    }

    /// Static assets extracted for separate delivery.
    pub fn assets_dir(&self) -> PathBuf {
        self.build_root.join("assets")
    }

    /// Compressed application artifact for zip deployments.
    pub fn artifact_path(&self) -> PathBuf {
        self.build_root.join("app.zip")
    }
}
