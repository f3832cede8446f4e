//! Scripted in-memory collaborators for integration tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use nimbus_core::error::{DeployError, Result};
use nimbus_core::image::{ImageBuildRequest, ImageBuilder};
use nimbus_core::monitor::PollPolicy;
use nimbus_core::remote::{
    ArtifactUpload, AssetCommand, AssetManifestEntry, CreateDeploymentRequest, Deployment,
    DeploymentImage, DeploymentStep, RemoteApi, SignedRequest,
};
use nimbus_core::types::{DeploymentStatus, StepStatus};
use nimbus_core::upload::{Method, TransferBody, TransferRequest, Uploader};

pub fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent dir");
    }
    fs::write(path, content).expect("Failed to write file");
}

/// Millisecond-scale polling so tests count polls instead of waiting.
pub fn fast_policy() -> PollPolicy {
    PollPolicy::default()
        .with_interval(Duration::from_millis(2))
        .with_start_timeout(Duration::from_secs(5))
        .with_step_timeout(Duration::from_secs(5))
}

pub fn deployment(id: u64, status: DeploymentStatus, steps: &[(u64, &str, StepStatus)]) -> Deployment {
    Deployment {
        id,
        status,
        deployment_type: None,
        assets_hash: None,
        configuration: None,
        steps: steps
            .iter()
            .map(|(id, name, status)| DeploymentStep {
                id: *id,
                task_name: name.to_string(),
                status: *status,
            })
            .collect(),
        status_message: None,
        created_at: None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Create {
        project_id: u64,
        environment: String,
        request: CreateDeploymentRequest,
    },
    Start(u64),
    Cancel(u64),
    Get(u64),
    List(u64, String),
    SignAssets(Vec<AssetManifestEntry>),
    ArtifactUrl(u64),
    Image(u64),
}

type Signer = Box<dyn Fn(&str) -> Option<AssetCommand> + Send + Sync>;

/// RemoteApi whose `get_deployment` answers come from a script.
///
/// Each poll consumes one scripted answer; the last answer repeats forever.
/// After a cancel request the cancellation script takes over.
pub struct FakeRemote {
    deployment_id: u64,
    polls: Mutex<VecDeque<std::result::Result<Deployment, String>>>,
    cancel_polls: Mutex<VecDeque<Deployment>>,
    cancelled: Mutex<bool>,
    history: Vec<Deployment>,
    signer: Signer,
    image: Option<DeploymentImage>,
    calls: Mutex<Vec<Call>>,
}

impl FakeRemote {
    pub fn new(deployment_id: u64) -> Self {
        Self {
            deployment_id,
            polls: Mutex::new(VecDeque::new()),
            cancel_polls: Mutex::new(VecDeque::new()),
            cancelled: Mutex::new(false),
            history: Vec::new(),
            signer: Box::new(|_| Some(AssetCommand::Store)),
            image: Some(DeploymentImage {
                authorization_token: "registry-token".to_string(),
                image_uri: "registry.nimbus.test/storefront:42".to_string(),
            }),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_polls(self, polls: Vec<Deployment>) -> Self {
        *self.polls.lock().unwrap() = polls.into_iter().map(Ok).collect();
        self
    }

    /// Append an answer the client cannot read.
    pub fn with_unreadable_poll(self, message: &str) -> Self {
        self.polls.lock().unwrap().push_back(Err(message.to_string()));
        self
    }

    pub fn with_cancel_polls(self, polls: Vec<Deployment>) -> Self {
        *self.cancel_polls.lock().unwrap() = polls.into_iter().collect();
        self
    }

    pub fn with_history(mut self, history: Vec<Deployment>) -> Self {
        self.history = history;
        self
    }

    pub fn with_signer<F>(mut self, signer: F) -> Self
    where
        F: Fn(&str) -> Option<AssetCommand> + Send + Sync + 'static,
    {
        self.signer = Box::new(signer);
        self
    }

    pub fn without_image_credentials(mut self) -> Self {
        self.image = None;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| matches(c)).count()
    }

    pub fn signed_manifest(&self) -> Option<Vec<AssetManifestEntry>> {
        self.calls.lock().unwrap().iter().find_map(|call| match call {
            Call::SignAssets(entries) => Some(entries.clone()),
            _ => None,
        })
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn next_from<T: Clone>(queue: &mut VecDeque<T>) -> Option<T> {
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

impl RemoteApi for FakeRemote {
    fn create_deployment(
        &self,
        project_id: u64,
        environment: &str,
        request: &CreateDeploymentRequest,
    ) -> Result<Deployment> {
        self.record(Call::Create {
            project_id,
            environment: environment.to_string(),
            request: request.clone(),
        });
        let mut created = deployment(self.deployment_id, DeploymentStatus::Pending, &[]);
        created.assets_hash = request.assets_hash.clone();
        created.deployment_type = request.deployment_type;
        Ok(created)
    }

    fn start_deployment(&self, deployment_id: u64) -> Result<()> {
        self.record(Call::Start(deployment_id));
        Ok(())
    }

    fn cancel_deployment(&self, deployment_id: u64) -> Result<()> {
        self.record(Call::Cancel(deployment_id));
        *self.cancelled.lock().unwrap() = true;
        Ok(())
    }

    fn get_deployment(&self, deployment_id: u64) -> Result<Deployment> {
        self.record(Call::Get(deployment_id));

        if *self.cancelled.lock().unwrap() {
            let mut queue = self.cancel_polls.lock().unwrap();
            if let Some(next) = Self::next_from(&mut queue) {
                return Ok(next);
            }
        }

        let mut queue = self.polls.lock().unwrap();
        match Self::next_from(&mut queue) {
            Some(Ok(deployment)) => Ok(deployment),
            Some(Err(message)) => Err(DeployError::Communication(message)),
            None => Err(DeployError::Communication(format!(
                "no scripted answer for deployment {}",
                deployment_id
            ))),
        }
    }

    fn get_deployments(&self, project_id: u64, environment: &str) -> Result<Vec<Deployment>> {
        self.record(Call::List(project_id, environment.to_string()));
        Ok(self.history.clone())
    }

    fn get_signed_asset_requests(
        &self,
        _deployment_id: u64,
        files: &[AssetManifestEntry],
    ) -> Result<BTreeMap<String, SignedRequest>> {
        self.record(Call::SignAssets(files.to_vec()));
        Ok(files
            .iter()
            .filter_map(|file| {
                (self.signer)(&file.path).map(|command| {
                    (
                        file.path.clone(),
                        SignedRequest {
                            command,
                            uri: format!("https://assets.nimbus.test/{}", file.path),
                            headers: BTreeMap::from([(
                                "x-nimbus-hash".to_string(),
                                file.hash.clone(),
                            )]),
                        },
                    )
                })
            })
            .collect())
    }

    fn get_artifact_upload_url(&self, deployment_id: u64) -> Result<ArtifactUpload> {
        self.record(Call::ArtifactUrl(deployment_id));
        Ok(ArtifactUpload {
            uri: format!("https://artifacts.nimbus.test/{}.zip", deployment_id),
            headers: BTreeMap::from([("Content-Type".to_string(), "application/zip".to_string())]),
        })
    }

    fn get_deployment_image(&self, deployment_id: u64) -> Result<DeploymentImage> {
        self.record(Call::Image(deployment_id));
        self.image.clone().ok_or_else(|| {
            DeployError::Communication(
                "unable to retrieve image registry credentials".to_string(),
            )
        })
    }
}

/// Uploader that records batches and can be told to reject one URI.
#[derive(Default)]
pub struct FakeUploader {
    batches: Mutex<Vec<(Method, Vec<TransferRequest>)>>,
    files: Mutex<Vec<(PathBuf, String)>>,
    reject: Option<String>,
}

impl FakeUploader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting(uri: impl Into<String>) -> Self {
        Self {
            reject: Some(uri.into()),
            ..Self::default()
        }
    }

    pub fn batches(&self) -> Vec<(Method, Vec<TransferRequest>)> {
        self.batches.lock().unwrap().clone()
    }

    pub fn uploaded_files(&self) -> Vec<(PathBuf, String)> {
        self.files.lock().unwrap().clone()
    }
}

impl Uploader for FakeUploader {
    fn batch(&self, method: Method, requests: &[TransferRequest]) -> Result<()> {
        self.batches
            .lock()
            .unwrap()
            .push((method, requests.to_vec()));

        for request in requests {
            if let TransferBody::File(path) = &request.body {
                fs::metadata(path)?;
            }
            if self.reject.as_deref() == Some(request.uri.as_str()) {
                return Err(DeployError::Upload {
                    uri: request.uri.clone(),
                    status: 403,
                });
            }
        }
        Ok(())
    }

    fn upload_file(&self, path: &Path, uri: &str, _headers: &BTreeMap<String, String>) -> Result<()> {
        fs::metadata(path)?;
        self.files
            .lock()
            .unwrap()
            .push((path.to_path_buf(), uri.to_string()));
        Ok(())
    }
}

/// ImageBuilder that records what it was asked to do.
#[derive(Default)]
pub struct FakeImageBuilder {
    pub builds: Mutex<Vec<(PathBuf, String)>>,
    pub pushes: Mutex<Vec<(String, String)>>,
}

impl ImageBuilder for FakeImageBuilder {
    fn build(&self, request: &ImageBuildRequest<'_>) -> Result<()> {
        self.builds
            .lock()
            .unwrap()
            .push((request.dockerfile.to_path_buf(), request.tag.to_string()));
        Ok(())
    }

    fn push(&self, local_tag: &str, image: &DeploymentImage) -> Result<()> {
        self.pushes
            .lock()
            .unwrap()
            .push((local_tag.to_string(), image.image_uri.clone()));
        Ok(())
    }
}
