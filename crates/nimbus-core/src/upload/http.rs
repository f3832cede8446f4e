use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use futures_util::{StreamExt, TryStreamExt, stream};
use reqwest::header::CONTENT_LENGTH;
use reqwest::{Body, Client, Method};
use tokio::runtime::Runtime;
use tokio_util::io::ReaderStream;

use super::{TransferBody, TransferRequest, Uploader};
use crate::config::ClientSettings;
use crate::error::{DeployError, Result};

/// reqwest-backed uploader with bounded transfer concurrency.
///
/// At most `concurrency` transfers are in flight, and therefore at most that
/// many files are open at once.
pub struct HttpUploader {
    client: Client,
    runtime: Runtime,
    concurrency: usize,
}

impl HttpUploader {
    pub fn new(concurrency: usize) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("nimbus/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        Ok(Self {
            client,
            runtime,
            concurrency: concurrency.max(1),
        })
    }

    pub fn from_settings(settings: &ClientSettings) -> Result<Self> {
        Self::new(settings.upload_concurrency)
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    async fn transfer(&self, method: Method, request: &TransferRequest) -> Result<()> {
        tracing::debug!(%method, uri = %request.uri, "transfer");

        let mut builder = self.client.request(method, request.uri.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder = match &request.body {
            TransferBody::Empty => builder.header(CONTENT_LENGTH, 0u64),
            TransferBody::File(path) => {
                let file = tokio::fs::File::open(path)
                    .await
                    .with_context(|| format!("Failed to open {}", path.display()))?;
                let length = file
                    .metadata()
                    .await
                    .with_context(|| format!("Failed to stat {}", path.display()))?
                    .len();
                builder
                    .header(CONTENT_LENGTH, length)
                    .body(Body::wrap_stream(ReaderStream::new(file)))
            }
        };

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DeployError::Upload {
                uri: request.uri.clone(),
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}

impl Uploader for HttpUploader {
    fn batch(&self, method: Method, requests: &[TransferRequest]) -> Result<()> {
        if requests.is_empty() {
            return Ok(());
        }

        self.runtime.block_on(async {
            stream::iter(requests)
                .map(|request| self.transfer(method.clone(), request))
                .buffer_unordered(self.concurrency)
                .try_for_each(|()| async { Ok(()) })
                .await
        })
    }

    fn upload_file(&self, path: &Path, uri: &str, headers: &BTreeMap<String, String>) -> Result<()> {
        let request = TransferRequest {
            uri: uri.to_string(),
            headers: headers.clone(),
            body: TransferBody::File(path.to_path_buf()),
        };
        self.batch(Method::PUT, std::slice::from_ref(&request))
    }
}
