//! Nimbus Core Library
//!
//! Domain logic for the nimbus deployment client: building a project into a
//! deployable artifact, syncing static assets against content hashes, and
//! following a remote deployment to completion.

pub mod assets;
pub mod build;
pub mod commands;
pub mod config;
pub mod error;
pub mod fs;
pub mod image;
pub mod monitor;
pub mod remote;
pub mod types;
pub mod upload;

/// Re-exports of commonly used types
pub mod prelude {
    // Configuration
    pub use crate::config::{
        ClientSettings, EnvironmentConfiguration, ProjectConfiguration, ProjectStore,
    };

    // Errors
    pub use crate::error::{DeployError, Result};

    // Build
    pub use crate::build::{BuildObserver, BuildPaths, BuildPipeline, BuildStep, ProjectType};

    // Assets
    pub use crate::assets::{AssetSyncPlanner, SyncReport};

    // Remote
    pub use crate::remote::{Deployment, DeploymentStep, HttpRemoteApi, RemoteApi};
    pub use crate::types::{Architecture, DeploymentStatus, DeploymentType, StepStatus};

    // Transfers and images
    pub use crate::image::{DockerCli, ImageBuilder};
    pub use crate::upload::{HttpUploader, Uploader};

    // Monitoring
    pub use crate::monitor::{CancellationToken, DeploymentMonitor, MonitorObserver, PollPolicy};

    // Commands
    pub use crate::commands::{
        BuildCommand, BuildOptions, CancelCommand, DeployCommand, DeployOptions, DeployReport,
    };
}
