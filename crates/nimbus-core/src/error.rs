//! Error types for the deployment pipeline.
//!
//! Every failure the core can raise propagates unchanged to the caller;
//! nothing in here is retried.

use thiserror::Error;

/// Result type alias for nimbus operations
pub type Result<T> = std::result::Result<T, DeployError>;

/// Main error type for build, sync and deployment operations
#[derive(Error, Debug)]
pub enum DeployError {
    /// A build step could not produce its required output
    #[error("build failed: {0}")]
    Build(String),

    /// A build step failed; wraps the underlying cause with the step description
    #[error("build step '{step}' failed: {source}")]
    StepFailed {
        step: String,
        #[source]
        source: Box<DeployError>,
    },

    /// The remote API answered with something we cannot use
    #[error("communication error: {0}")]
    Communication(String),

    /// A bounded poll ran past its budget
    #[error("timed out after {seconds}s waiting for {waiting_for}")]
    Timeout { waiting_for: String, seconds: u64 },

    /// The server reported the deployment or one of its steps as failed
    #[error("{}", remote_message(.message))]
    Remote { message: Option<String> },

    /// The environment asks for something this client does not support
    #[error("unsupported configuration: {0}")]
    UnsupportedConfiguration(String),

    /// The operator cancelled the deployment
    #[error("deployment {deployment_id} was cancelled")]
    Cancelled { deployment_id: u64 },

    /// A transfer inside an upload batch was rejected
    #[error("upload to {uri} failed with HTTP {status}")]
    Upload { uri: String, status: u16 },

    /// Project manifest or client settings are invalid
    #[error("configuration error: {0}")]
    Config(String),

    /// HTTP transport error
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Filesystem helper error carrying its own context
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn remote_message(message: &Option<String>) -> String {
    match message {
        Some(message) if !message.trim().is_empty() => format!("deployment failed: {message}"),
        _ => "deployment failed".to_string(),
    }
}

impl DeployError {
    /// Annotate an error with the description of the build step that raised it.
    pub fn in_step(self, step: impl Into<String>) -> Self {
        DeployError::StepFailed {
            step: step.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, skipping step annotations.
    pub fn root(&self) -> &DeployError {
        match self {
            DeployError::StepFailed { source, .. } => source.root(),
            other => other,
        }
    }
}
