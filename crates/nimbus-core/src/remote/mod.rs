//! Remote management API.
//!
//! The server is the only source of truth for deployment state. Everything
//! the pipeline needs from it goes through [`RemoteApi`], so tests can swap in
//! a scripted implementation.

pub mod http;
pub mod types;

use std::collections::BTreeMap;

pub use http::HttpRemoteApi;
pub use types::{
    ArtifactUpload, AssetCommand, AssetManifestEntry, CreateDeploymentRequest, Deployment,
    DeploymentImage, DeploymentStep, SignedRequest,
};

use crate::error::Result;

pub trait RemoteApi {
    /// Create a deployment for a project environment.
    fn create_deployment(
        &self,
        project_id: u64,
        environment: &str,
        request: &CreateDeploymentRequest,
    ) -> Result<Deployment>;

    fn start_deployment(&self, deployment_id: u64) -> Result<()>;

    /// Ask the server to cancel a deployment. Safe to repeat.
    fn cancel_deployment(&self, deployment_id: u64) -> Result<()>;

    /// Fetch the authoritative deployment record.
    fn get_deployment(&self, deployment_id: u64) -> Result<Deployment>;

    /// Deployments of one environment, as returned by the server.
    fn get_deployments(&self, project_id: u64, environment: &str) -> Result<Vec<Deployment>>;

    /// Submit the asset manifest and receive one signed request per path the
    /// server is willing to process.
    fn get_signed_asset_requests(
        &self,
        deployment_id: u64,
        files: &[AssetManifestEntry],
    ) -> Result<BTreeMap<String, SignedRequest>>;

    fn get_artifact_upload_url(&self, deployment_id: u64) -> Result<ArtifactUpload>;

    /// Registry credentials for pushing an image deployment.
    fn get_deployment_image(&self, deployment_id: u64) -> Result<DeploymentImage>;
}
