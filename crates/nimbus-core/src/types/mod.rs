//! Shared core types used across configuration, build and remote layers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DeployError;

/// How the application code is shipped to the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentType {
    /// Compressed archive uploaded to a signed URL.
    Zip,
    /// Container image pushed to the platform registry.
    Image,
}

impl DeploymentType {
    pub fn as_str(self) -> &'static str {
        match self {
            DeploymentType::Zip => "zip",
            DeploymentType::Image => "image",
        }
    }
}

impl FromStr for DeploymentType {
    type Err = DeployError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "zip" => Ok(DeploymentType::Zip),
            "image" => Ok(DeploymentType::Image),
            other => Err(DeployError::UnsupportedConfiguration(format!(
                "unknown deployment type '{other}'. Use 'zip' or 'image'"
            ))),
        }
    }
}

impl fmt::Display for DeploymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CPU architecture the environment runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Architecture {
    #[default]
    #[serde(alias = "x86-64", alias = "amd64")]
    X86_64,
    #[serde(alias = "aarch64")]
    Arm64,
}

impl Architecture {
    pub fn as_str(self) -> &'static str {
        match self {
            Architecture::X86_64 => "x86_64",
            Architecture::Arm64 => "arm64",
        }
    }

    /// Platform string understood by container tooling.
    pub fn docker_platform(self) -> &'static str {
        match self {
            Architecture::X86_64 => "linux/amd64",
            Architecture::Arm64 => "linux/arm64",
        }
    }
}

/// Status of a remote deployment.
///
/// Only `Cancelling` is ever originated by the client; every other value is
/// observed from the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentStatus {
    Pending,
    Running,
    Cancelling,
    Cancelled,
    Finished,
    Failed,
}

impl DeploymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DeploymentStatus::Pending => "pending",
            DeploymentStatus::Running => "running",
            DeploymentStatus::Cancelling => "cancelling",
            DeploymentStatus::Cancelled => "cancelled",
            DeploymentStatus::Finished => "finished",
            DeploymentStatus::Failed => "failed",
        }
    }

    /// Terminal statuses are never re-polled.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            DeploymentStatus::Finished | DeploymentStatus::Failed | DeploymentStatus::Cancelled
        )
    }
}

impl FromStr for DeploymentStatus {
    type Err = DeployError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(DeploymentStatus::Pending),
            "running" => Ok(DeploymentStatus::Running),
            "cancelling" => Ok(DeploymentStatus::Cancelling),
            "cancelled" => Ok(DeploymentStatus::Cancelled),
            "finished" => Ok(DeploymentStatus::Finished),
            "failed" => Ok(DeploymentStatus::Failed),
            other => Err(DeployError::Communication(format!(
                "unrecognized deployment status '{other}'"
            ))),
        }
    }
}

impl fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a single remote deployment step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Pending,
    Running,
    Finished,
    Failed,
    Cancelled,
}

impl StepStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            StepStatus::Pending => "pending",
            StepStatus::Running => "running",
            StepStatus::Finished => "finished",
            StepStatus::Failed => "failed",
            StepStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for StepStatus {
    type Err = DeployError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(StepStatus::Pending),
            "running" => Ok(StepStatus::Running),
            "finished" => Ok(StepStatus::Finished),
            "failed" => Ok(StepStatus::Failed),
            "cancelled" => Ok(StepStatus::Cancelled),
            other => Err(DeployError::Communication(format!(
                "unrecognized step status '{other}'"
            ))),
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
