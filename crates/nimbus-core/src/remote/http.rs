//! JSON-over-HTTPS implementation of [`RemoteApi`].

use std::collections::BTreeMap;

use reqwest::{Client, Method};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::runtime::Runtime;
use url::Url;

use super::RemoteApi;
use super::types::{
    ArtifactUpload, ArtifactUploadPayload, AssetManifestEntry, CreateDeploymentRequest,
    Deployment, DeploymentImage, DeploymentImagePayload, DeploymentPayload, SignedRequest,
    SignedRequestPayload,
};
use crate::config::ClientSettings;
use crate::error::{DeployError, Result};

const USER_AGENT: &str = concat!("nimbus/", env!("CARGO_PKG_VERSION"));

#[derive(Serialize)]
struct AssetManifest<'a> {
    assets: &'a [AssetManifestEntry],
}

/// Blocking client for the management API.
///
/// Owns a tokio runtime and blocks on each request, so callers stay
/// synchronous. Must not be used from inside another runtime.
pub struct HttpRemoteApi {
    client: Client,
    runtime: Runtime,
    base: Url,
    token: String,
}

impl HttpRemoteApi {
    pub fn new(api_url: &str, token: impl Into<String>) -> Result<Self> {
        let mut base = Url::parse(api_url)
            .map_err(|e| DeployError::Config(format!("invalid API URL '{}': {}", api_url, e)))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = Client::builder().user_agent(USER_AGENT).build()?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        Ok(Self {
            client,
            runtime,
            base,
            token: token.into(),
        })
    }

    pub fn from_settings(settings: &ClientSettings) -> Result<Self> {
        Self::new(&settings.api_url, settings.require_token()?)
    }

    /// Absolute URL for an API path such as `api/deployments/7`.
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|e| DeployError::Config(format!("invalid API path '{}': {}", path, e)))
    }

    /// URL of the deployments collection for one environment.
    ///
    /// The environment name is a single percent-encoded path segment.
    pub fn environment_endpoint(&self, project_id: u64, environment: &str) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| DeployError::Config(format!("API URL '{}' cannot take a path", self.base)))?
            .pop_if_empty()
            .extend([
                "api",
                "projects",
                &project_id.to_string(),
                "environments",
                environment,
                "deployments",
            ]);
        Ok(url)
    }

    fn send<B, T>(&self, method: Method, url: Url, body: Option<&B>) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let path = url.path().to_string();
        let bytes = self.send_raw(method, url, body)?;
        serde_json::from_slice(&bytes).map_err(|e| {
            DeployError::Communication(format!("unreadable response from {}: {}", path, e))
        })
    }

    fn send_raw<B>(&self, method: Method, url: Url, body: Option<&B>) -> Result<Vec<u8>>
    where
        B: Serialize + ?Sized,
    {
        tracing::debug!(%method, %url, "api request");

        let mut request = self
            .client
            .request(method, url.clone())
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        self.runtime.block_on(async {
            let response = request.send().await?;
            let status = response.status();
            let bytes = response.bytes().await?;
            if !status.is_success() {
                let detail = String::from_utf8_lossy(&bytes);
                return Err(DeployError::Communication(format!(
                    "{} returned HTTP {}: {}",
                    url,
                    status.as_u16(),
                    detail.trim()
                )));
            }
            Ok::<_, DeployError>(bytes.to_vec())
        })
    }

    fn post_empty(&self, path: &str) -> Result<()> {
        self.send_raw::<()>(Method::POST, self.endpoint(path)?, None)
            .map(|_| ())
    }
}

impl RemoteApi for HttpRemoteApi {
    fn create_deployment(
        &self,
        project_id: u64,
        environment: &str,
        request: &CreateDeploymentRequest,
    ) -> Result<Deployment> {
        let payload: DeploymentPayload = self.send(
            Method::POST,
            self.environment_endpoint(project_id, environment)?,
            Some(request),
        )?;
        Deployment::try_from(payload)
    }

    fn start_deployment(&self, deployment_id: u64) -> Result<()> {
        self.post_empty(&format!("api/deployments/{}/start", deployment_id))
    }

    fn cancel_deployment(&self, deployment_id: u64) -> Result<()> {
        self.post_empty(&format!("api/deployments/{}/cancel", deployment_id))
    }

    fn get_deployment(&self, deployment_id: u64) -> Result<Deployment> {
        let payload: DeploymentPayload = self.send::<(), _>(
            Method::GET,
            self.endpoint(&format!("api/deployments/{}", deployment_id))?,
            None,
        )?;
        Deployment::try_from(payload)
    }

    fn get_deployments(&self, project_id: u64, environment: &str) -> Result<Vec<Deployment>> {
        let payloads: Vec<DeploymentPayload> =
            self.send::<(), _>(
                Method::GET,
                self.environment_endpoint(project_id, environment)?,
                None,
            )?;
        payloads.into_iter().map(Deployment::try_from).collect()
    }

    fn get_signed_asset_requests(
        &self,
        deployment_id: u64,
        files: &[AssetManifestEntry],
    ) -> Result<BTreeMap<String, SignedRequest>> {
        let payload: BTreeMap<String, SignedRequestPayload> = self.send(
            Method::POST,
            self.endpoint(&format!("api/deployments/{}/assets", deployment_id))?,
            Some(&AssetManifest { assets: files }),
        )?;
        payload
            .into_iter()
            .map(|(path, request)| SignedRequest::try_from(request).map(|signed| (path, signed)))
            .collect()
    }

    fn get_artifact_upload_url(&self, deployment_id: u64) -> Result<ArtifactUpload> {
        let payload: ArtifactUploadPayload = self.send::<(), _>(
            Method::GET,
            self.endpoint(&format!("api/deployments/{}/artifact", deployment_id))?,
            None,
        )?;
        ArtifactUpload::try_from(payload)
    }

    fn get_deployment_image(&self, deployment_id: u64) -> Result<DeploymentImage> {
        let payload: DeploymentImagePayload = self.send::<(), _>(
            Method::GET,
            self.endpoint(&format!("api/deployments/{}/image", deployment_id))?,
            None,
        )?;
        DeploymentImage::try_from(payload)
    }
}
