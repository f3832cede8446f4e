//! Configuration schema for nimbus.toml
//!
//! One manifest per project, with one table per deployment environment:
//!
//! ```toml
//! id = 42
//! name = "storefront"
//! type = "node"
//!
//! [environments.production]
//! deployment_type = "zip"
//! build = ["npm ci", "npm run build"]
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::build::ProjectType;
use crate::error::{DeployError, Result};
use crate::types::{Architecture, DeploymentType};

/// Root configuration structure for nimbus.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfiguration {
    /// Remote project identifier
    pub id: u64,

    /// Project name, also used to tag container images
    pub name: String,

    /// Project type; selects build steps and file-selection rules
    #[serde(rename = "type", default)]
    pub project_type: ProjectType,

    /// Deployment environments keyed by name
    #[serde(default)]
    pub environments: BTreeMap<String, EnvironmentConfiguration>,
}

impl ProjectConfiguration {
    /// Look up an environment by name.
    pub fn environment(&self, name: &str) -> Result<&EnvironmentConfiguration> {
        self.environments.get(name).ok_or_else(|| {
            let known: Vec<&str> = self.environments.keys().map(String::as_str).collect();
            DeployError::Config(format!(
                "environment '{}' is not defined in nimbus.toml (known: {})",
                name,
                if known.is_empty() {
                    "none".to_string()
                } else {
                    known.join(", ")
                }
            ))
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(DeployError::Config("project name must not be empty".to_string()));
        }
        for environment in self.environments.values() {
            environment.validate()?;
        }
        Ok(())
    }
}

/// Per-environment build and deployment settings.
///
/// Immutable once loaded; every build step reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentConfiguration {
    /// Environment name, filled in from the table key
    #[serde(skip)]
    pub name: String,

    /// Deployment type: zip or image
    #[serde(default = "default_deployment_type")]
    pub deployment_type: String,

    /// CPU architecture
    #[serde(default)]
    pub architecture: Architecture,

    /// Build commands, run in order inside the build directory
    #[serde(default)]
    pub build: Vec<String>,

    /// Globs re-included even when an ignore rule matches
    #[serde(default)]
    pub include: Vec<String>,

    /// Extra globs removed from the build
    #[serde(default)]
    pub ignore: Vec<String>,

    /// Dockerfile for image deployments, relative to the project root
    #[serde(default)]
    pub dockerfile: Option<PathBuf>,
}

fn default_deployment_type() -> String {
    "zip".to_string()
}

impl EnvironmentConfiguration {
    /// Create an environment with default settings.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            deployment_type: default_deployment_type(),
            architecture: Architecture::default(),
            build: Vec::new(),
            include: Vec::new(),
            ignore: Vec::new(),
            dockerfile: None,
        }
    }

    /// Resolve the declared deployment type.
    pub fn deployment_type(&self) -> Result<DeploymentType> {
        self.deployment_type.parse()
    }

    /// Dockerfile path relative to the project root.
    pub fn dockerfile_path(&self) -> PathBuf {
        self.dockerfile
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("{}.Dockerfile", self.name)))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.deployment_type()?;
        for pattern in self.include.iter().chain(self.ignore.iter()) {
            globset::Glob::new(pattern).map_err(|e| {
                DeployError::Config(format!(
                    "invalid glob '{}' in environment '{}': {}",
                    pattern, self.name, e
                ))
            })?;
        }
        Ok(())
    }
}
