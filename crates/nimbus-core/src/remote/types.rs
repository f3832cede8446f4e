//! Remote deployment records and their wire payloads.
//!
//! Payloads deserialize leniently (every field optional) and are then
//! validated into domain types, so a malformed response surfaces as a
//! communication error instead of a serde message.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DeployError, Result};
use crate::types::{Architecture, DeploymentStatus, DeploymentType, StepStatus};

/// Remote-owned deployment record.
///
/// The client keeps only the id between calls; every read re-fetches this.
#[derive(Debug, Clone, PartialEq)]
pub struct Deployment {
    pub id: u64,
    pub status: DeploymentStatus,
    pub deployment_type: Option<DeploymentType>,
    pub assets_hash: Option<String>,
    pub configuration: Option<serde_json::Value>,
    /// Server-declared order
    pub steps: Vec<DeploymentStep>,
    /// Server-supplied explanation, set on failures
    pub status_message: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Deployment {
    pub fn step(&self, id: u64) -> Option<&DeploymentStep> {
        self.steps.iter().find(|step| step.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentStep {
    pub id: u64,
    pub task_name: String,
    pub status: StepStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeploymentPayload {
    pub id: Option<u64>,
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub deployment_type: Option<String>,
    pub assets_hash: Option<String>,
    pub configuration: Option<serde_json::Value>,
    #[serde(default)]
    pub steps: Vec<DeploymentStepPayload>,
    pub status_message: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeploymentStepPayload {
    pub id: Option<u64>,
    pub task_name: Option<String>,
    pub status: Option<String>,
}

impl TryFrom<DeploymentPayload> for Deployment {
    type Error = DeployError;

    fn try_from(payload: DeploymentPayload) -> Result<Self> {
        let id = payload
            .id
            .ok_or_else(|| missing("deployment", "id"))?;
        let status = payload
            .status
            .as_deref()
            .ok_or_else(|| missing("deployment", "status"))?
            .parse()?;
        let deployment_type = match payload.deployment_type.as_deref() {
            Some(value) => Some(value.parse().map_err(|_| {
                DeployError::Communication(format!("unrecognized deployment type '{value}'"))
            })?),
            None => None,
        };
        let steps = payload
            .steps
            .into_iter()
            .map(DeploymentStep::try_from)
            .collect::<Result<Vec<_>>>()?;

        Ok(Deployment {
            id,
            status,
            deployment_type,
            assets_hash: payload.assets_hash,
            configuration: payload.configuration,
            steps,
            status_message: payload.status_message,
            created_at: payload.created_at,
        })
    }
}

impl TryFrom<DeploymentStepPayload> for DeploymentStep {
    type Error = DeployError;

    fn try_from(payload: DeploymentStepPayload) -> Result<Self> {
        Ok(DeploymentStep {
            id: payload.id.ok_or_else(|| missing("deployment step", "id"))?,
            task_name: payload
                .task_name
                .ok_or_else(|| missing("deployment step", "task_name"))?,
            status: payload
                .status
                .as_deref()
                .ok_or_else(|| missing("deployment step", "status"))?
                .parse()?,
        })
    }
}

/// Body of the create-deployment request.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CreateDeploymentRequest {
    pub assets_hash: Option<String>,
    #[serde(rename = "type")]
    pub deployment_type: Option<DeploymentType>,
    pub architecture: Architecture,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// One asset file as submitted for signing.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AssetManifestEntry {
    pub path: String,
    pub hash: String,
}

/// What the server wants done with one asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetCommand {
    /// Duplicate bytes the server already stores; no body is sent
    Copy,
    /// Upload the file content
    Store,
}

/// Pre-authorized instruction permitting exactly one transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    pub command: AssetCommand,
    pub uri: String,
    pub headers: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignedRequestPayload {
    pub command: Option<String>,
    pub uri: Option<String>,
    #[serde(default)]
    pub headers: BTreeMap<String, HeaderValue>,
}

/// Header values arrive either as a string or as a list of strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum HeaderValue {
    One(String),
    Many(Vec<String>),
}

impl HeaderValue {
    fn into_value(self) -> String {
        match self {
            HeaderValue::One(value) => value,
            HeaderValue::Many(values) => values.join(", "),
        }
    }
}

impl TryFrom<SignedRequestPayload> for SignedRequest {
    type Error = DeployError;

    fn try_from(payload: SignedRequestPayload) -> Result<Self> {
        let command = match payload.command.as_deref() {
            Some("copy") => AssetCommand::Copy,
            Some("store") => AssetCommand::Store,
            Some(other) => {
                return Err(DeployError::Communication(format!(
                    "unrecognized asset command '{other}'"
                )));
            }
            None => return Err(missing("signed request", "command")),
        };
        Ok(SignedRequest {
            command,
            uri: payload.uri.ok_or_else(|| missing("signed request", "uri"))?,
            headers: payload
                .headers
                .into_iter()
                .map(|(k, v)| (k, v.into_value()))
                .collect(),
        })
    }
}

/// Where to upload a zip artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactUpload {
    pub uri: String,
    pub headers: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArtifactUploadPayload {
    pub url: Option<String>,
    #[serde(default)]
    pub headers: BTreeMap<String, HeaderValue>,
}

impl TryFrom<ArtifactUploadPayload> for ArtifactUpload {
    type Error = DeployError;

    fn try_from(payload: ArtifactUploadPayload) -> Result<Self> {
        Ok(ArtifactUpload {
            uri: payload.url.ok_or_else(|| missing("artifact upload", "url"))?,
            headers: payload
                .headers
                .into_iter()
                .map(|(k, v)| (k, v.into_value()))
                .collect(),
        })
    }
}

/// Registry credentials and destination for an image deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentImage {
    pub authorization_token: String,
    pub image_uri: String,
}

impl DeploymentImage {
    /// Registry host portion of the image URI.
    pub fn registry(&self) -> &str {
        self.image_uri
            .split('/')
            .next()
            .unwrap_or(self.image_uri.as_str())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeploymentImagePayload {
    pub authorization_token: Option<String>,
    pub image_uri: Option<String>,
}

impl TryFrom<DeploymentImagePayload> for DeploymentImage {
    type Error = DeployError;

    fn try_from(payload: DeploymentImagePayload) -> Result<Self> {
        match (payload.authorization_token, payload.image_uri) {
            (Some(authorization_token), Some(image_uri))
                if !authorization_token.is_empty() && !image_uri.is_empty() =>
            {
                Ok(DeploymentImage {
                    authorization_token,
                    image_uri,
                })
            }
            _ => Err(DeployError::Communication(
                "unable to retrieve image registry credentials: missing authorization_token or image_uri"
                    .to_string(),
            )),
        }
    }
}

fn missing(what: &str, field: &str) -> DeployError {
    DeployError::Communication(format!("{what} response is missing '{field}'"))
}
