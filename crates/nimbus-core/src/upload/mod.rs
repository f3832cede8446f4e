//! Signed-URL transfers.
//!
//! An [`Uploader`] executes pre-authorized requests issued by the remote API:
//! whole batches of asset copies/stores, or a single artifact upload.

pub mod http;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub use http::HttpUploader;
pub use reqwest::Method;

use crate::error::Result;

/// Payload of one transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferBody {
    /// No body; the server acts on bytes it already has
    Empty,
    /// Stream the file's content, opened only when the transfer is dispatched
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub uri: String,
    pub headers: BTreeMap<String, String>,
    pub body: TransferBody,
}

pub trait Uploader {
    /// Dispatch every request and wait for all of them.
    ///
    /// Transfers run concurrently. A file body is opened when its transfer
    /// starts and closed when it ends, so open handles never exceed the
    /// number of transfers in flight. The first failure fails the whole
    /// batch; there is no partial success.
    fn batch(&self, method: Method, requests: &[TransferRequest]) -> Result<()>;

    /// Upload one file to a signed URI.
    fn upload_file(&self, path: &Path, uri: &str, headers: &BTreeMap<String, String>) -> Result<()>;
}
