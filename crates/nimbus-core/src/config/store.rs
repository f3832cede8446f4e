//! Project store for locating and loading nimbus.toml.

use std::path::{Path, PathBuf};

use super::{ProjectConfiguration, parser};
use crate::error::{DeployError, Result};

/// Manifest file name at the project root
pub const MANIFEST_FILE: &str = "nimbus.toml";

#[derive(Debug, Clone)]
pub struct ProjectStore {
    project_root: PathBuf,
    manifest_path: PathBuf,
}

impl ProjectStore {
    /// Store rooted at the current working directory.
    pub fn from_current_dir() -> Result<Self> {
        Ok(Self::new(std::env::current_dir()?))
    }

    pub fn new(project_root: PathBuf) -> Self {
        let manifest_path = project_root.join(MANIFEST_FILE);
        Self {
            project_root,
            manifest_path,
        }
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    pub fn load(&self) -> Result<ProjectConfiguration> {
        if !self.manifest_path.exists() {
            return Err(DeployError::Config(format!(
                "no {} found in {}",
                MANIFEST_FILE,
                self.project_root.display()
            )));
        }
        parser::parse_project_toml(&self.manifest_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn load_reads_manifest_from_project_root() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(MANIFEST_FILE),
            "id = 7\nname = \"docs\"\ntype = \"static\"\n[environments.production]\n",
        )
        .unwrap();

        let store = ProjectStore::new(temp.path().to_path_buf());
        let config = store.load().unwrap();
        assert_eq!(config.id, 7);
        assert_eq!(store.manifest_path(), temp.path().join(MANIFEST_FILE));
    }

    #[test]
    fn load_without_manifest_is_a_config_error() {
        let temp = TempDir::new().unwrap();
        let store = ProjectStore::new(temp.path().to_path_buf());
        let err = store.load().unwrap_err();
        assert!(matches!(err, DeployError::Config(_)));
    }
}
