//! Deploy command: build, ship, sync assets, and follow the remote deployment.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use super::build::{BuildCommand, BuildOptions, BuildOutcome};
use crate::assets::{AssetSyncPlanner, SyncReport};
use crate::build::{BuildObserver, NoopBuildObserver};
use crate::error::Result;
use crate::fs::hash_tree;
use crate::image::{ImageBuilder, image_tag};
use crate::monitor::{
    CancellationToken, DeploymentMonitor, MonitorObserver, NoopMonitorObserver, PollPolicy,
};
use crate::remote::{CreateDeploymentRequest, Deployment, RemoteApi};
use crate::types::DeploymentType;
use crate::upload::Uploader;

/// Options for the deploy command
#[derive(Debug, Clone)]
pub struct DeployOptions {
    /// Environment to deploy
    pub environment: String,
    /// Sync assets even when they match the last finished deployment
    pub force: bool,
    /// Free-form note recorded with the deployment
    pub message: Option<String>,
}

impl DeployOptions {
    pub fn new(environment: impl Into<String>) -> Self {
        Self {
            environment: environment.into(),
            force: false,
            message: None,
        }
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Result of a successful deployment
#[derive(Debug, Clone)]
pub struct DeployReport {
    /// Final deployment record
    pub deployment: Deployment,
    /// Local build steps that ran
    pub build_steps: Vec<String>,
    pub sync: SyncReport,
    pub elapsed: Duration,
}

/// Deploy command orchestrator
pub struct DeployCommand<'a> {
    project_root: PathBuf,
    remote: &'a dyn RemoteApi,
    uploader: &'a dyn Uploader,
    image_builder: &'a dyn ImageBuilder,
    build_observer: &'a dyn BuildObserver,
    monitor_observer: &'a dyn MonitorObserver,
    policy: PollPolicy,
    token: CancellationToken,
    interrupt_handler: bool,
}

impl<'a> DeployCommand<'a> {
    pub fn new(
        project_root: PathBuf,
        remote: &'a dyn RemoteApi,
        uploader: &'a dyn Uploader,
        image_builder: &'a dyn ImageBuilder,
    ) -> Self {
        Self {
            project_root,
            remote,
            uploader,
            image_builder,
            build_observer: &NoopBuildObserver,
            monitor_observer: &NoopMonitorObserver,
            policy: PollPolicy::default(),
            token: CancellationToken::new(),
            interrupt_handler: false,
        }
    }

    pub fn with_build_observer(mut self, observer: &'a dyn BuildObserver) -> Self {
        self.build_observer = observer;
        self
    }

    pub fn with_monitor_observer(mut self, observer: &'a dyn MonitorObserver) -> Self {
        self.monitor_observer = observer;
        self
    }

    pub fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_token(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    /// Route Ctrl+C to the cancellation token once the deployment is about
    /// to start. Installs a process-wide handler.
    pub fn with_interrupt_handler(mut self, enabled: bool) -> Self {
        self.interrupt_handler = enabled;
        self
    }

    pub fn execute(&self, options: &DeployOptions) -> Result<DeployReport> {
        let started = Instant::now();

        let build = BuildCommand::new(self.project_root.clone(), self.image_builder)
            .with_observer(self.build_observer)
            .execute(&BuildOptions::new(&options.environment))?;

        let assets_dir = build.paths.assets_dir();
        let assets_hash = if assets_dir.is_dir() {
            Some(hash_tree(&assets_dir)?)
        } else {
            None
        };

        let ships_code = build.project.project_type.ships_code();
        let request = CreateDeploymentRequest {
            assets_hash,
            deployment_type: ships_code.then_some(build.deployment_type),
            architecture: build.environment.architecture,
            message: options.message.clone(),
        };
        let deployment = self.remote.create_deployment(
            build.project.id,
            &build.environment.name,
            &request,
        )?;
        tracing::info!(deployment = deployment.id, "deployment created");

        if ships_code {
            self.ship_code(&build, deployment.id)?;
        }

        let sync = AssetSyncPlanner::new(self.remote, self.uploader).sync(
            &deployment,
            build.project.id,
            &build.environment.name,
            &assets_dir,
            request.assets_hash.as_deref(),
            options.force,
        )?;

        if self.interrupt_handler {
            self.token.install_interrupt_handler()?;
        }
        let monitor = DeploymentMonitor::new(self.remote)
            .with_policy(self.policy)
            .with_token(self.token.clone())
            .with_observer(self.monitor_observer)
            .run(deployment.id)?;

        Ok(DeployReport {
            deployment: monitor.deployment,
            build_steps: build.report.steps,
            sync,
            elapsed: started.elapsed(),
        })
    }

    fn ship_code(&self, build: &BuildOutcome, deployment_id: u64) -> Result<()> {
        match build.deployment_type {
            DeploymentType::Zip => {
                let upload = self.remote.get_artifact_upload_url(deployment_id)?;
                let artifact = build.paths.artifact_path();
                tracing::info!(artifact = %artifact.display(), "uploading artifact");
                self.uploader
                    .upload_file(&artifact, &upload.uri, &upload.headers)
            }
            DeploymentType::Image => {
                let image = self.remote.get_deployment_image(deployment_id)?;
                let tag = image_tag(&build.project, &build.environment);
                tracing::info!(%tag, destination = %image.image_uri, "pushing image");
                self.image_builder.push(&tag, &image)
            }
        }
    }
}
