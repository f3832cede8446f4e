//! Content-addressed differential sync of static assets.

use std::collections::BTreeMap;
use std::path::Path;

use super::scan::{AssetFile, scan_assets};
use crate::error::Result;
use crate::remote::{AssetCommand, Deployment, RemoteApi, SignedRequest};
use crate::types::DeploymentStatus;
use crate::upload::{Method, TransferBody, TransferRequest, Uploader};

/// Per-file outcome of a sync run.
///
/// Every scanned file lands in exactly one of the three lists.
#[derive(Debug, Clone, Default)]
pub struct SyncPlan {
    /// Server already has the bytes; duplicate remotely
    pub copies: Vec<(AssetFile, SignedRequest)>,
    /// Upload the file's content
    pub stores: Vec<(AssetFile, SignedRequest)>,
    /// No signed request was issued for these
    pub unprocessed: Vec<AssetFile>,
}

impl SyncPlan {
    /// Partition files by the signed request issued for their path.
    pub fn partition(files: Vec<AssetFile>, mut signed: BTreeMap<String, SignedRequest>) -> Self {
        let mut plan = SyncPlan::default();
        for file in files {
            match signed.remove(&file.relative_path) {
                Some(request) => match request.command {
                    AssetCommand::Copy => plan.copies.push((file, request)),
                    AssetCommand::Store => plan.stores.push((file, request)),
                },
                None => plan.unprocessed.push(file),
            }
        }
        plan
    }

    pub fn len(&self) -> usize {
        self.copies.len() + self.stores.len() + self.unprocessed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// What a sync run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// The assets hash matched the last finished deployment; nothing was sent
    pub skipped: bool,
    pub copied: usize,
    pub stored: usize,
    /// Relative paths the server issued no request for
    pub unprocessed: Vec<String>,
}

/// Decides per asset whether to upload or duplicate remotely, then does it.
pub struct AssetSyncPlanner<'a> {
    remote: &'a dyn RemoteApi,
    uploader: &'a dyn Uploader,
}

impl<'a> AssetSyncPlanner<'a> {
    pub fn new(remote: &'a dyn RemoteApi, uploader: &'a dyn Uploader) -> Self {
        Self { remote, uploader }
    }

    /// Sync the assets directory for a deployment.
    ///
    /// `assets_hash` is the hash computed locally for `assets_dir`. Unless
    /// `force` is set, a hash equal to that of the most recent finished
    /// deployment of the same environment skips the scan entirely.
    pub fn sync(
        &self,
        deployment: &Deployment,
        project_id: u64,
        environment: &str,
        assets_dir: &Path,
        assets_hash: Option<&str>,
        force: bool,
    ) -> Result<SyncReport> {
        let unchanged = match assets_hash {
            Some(hash) if !force => {
                self.assets_unchanged(deployment.id, hash, project_id, environment)?
            }
            _ => false,
        };
        if unchanged {
            tracing::info!(deployment = deployment.id, "assets unchanged, skipping sync");
            return Ok(SyncReport {
                skipped: true,
                ..SyncReport::default()
            });
        }

        let files = scan_assets(assets_dir)?;
        let plan = self.plan(deployment.id, files)?;
        self.execute(&plan)?;

        Ok(SyncReport {
            skipped: false,
            copied: plan.copies.len(),
            stored: plan.stores.len(),
            unprocessed: plan
                .unprocessed
                .iter()
                .map(|file| file.relative_path.clone())
                .collect(),
        })
    }

    /// Whether `current` matches the assets hash of the latest finished
    /// deployment of the environment, other than `deployment_id` itself.
    pub fn assets_unchanged(
        &self,
        deployment_id: u64,
        current: &str,
        project_id: u64,
        environment: &str,
    ) -> Result<bool> {
        let deployments = self.remote.get_deployments(project_id, environment)?;
        let previous = latest_finished(&deployments, deployment_id);
        Ok(previous
            .and_then(|previous| previous.assets_hash.as_deref())
            .is_some_and(|hash| hash == current))
    }

    /// Ask the server what to do with each file.
    ///
    /// An empty file set makes no request.
    pub fn plan(&self, deployment_id: u64, files: Vec<AssetFile>) -> Result<SyncPlan> {
        if files.is_empty() {
            return Ok(SyncPlan::default());
        }

        let manifest: Vec<_> = files.iter().map(AssetFile::manifest_entry).collect();
        let signed = self
            .remote
            .get_signed_asset_requests(deployment_id, &manifest)?;
        let plan = SyncPlan::partition(files, signed);

        if !plan.unprocessed.is_empty() {
            tracing::warn!(
                count = plan.unprocessed.len(),
                "unable to process some asset files"
            );
            for file in &plan.unprocessed {
                tracing::debug!(path = %file.relative_path, "unprocessed asset");
            }
        }
        Ok(plan)
    }

    /// Run the copy batch, then the store batch. A failure in either aborts.
    pub fn execute(&self, plan: &SyncPlan) -> Result<()> {
        if !plan.copies.is_empty() {
            let copies: Vec<TransferRequest> = plan
                .copies
                .iter()
                .map(|(_, request)| transfer(request, TransferBody::Empty))
                .collect();
            tracing::debug!(count = copies.len(), "copying assets");
            self.uploader.batch(Method::PUT, &copies)?;
        }

        if !plan.stores.is_empty() {
            let stores: Vec<TransferRequest> = plan
                .stores
                .iter()
                .map(|(file, request)| {
                    transfer(request, TransferBody::File(file.real_path.clone()))
                })
                .collect();
            tracing::debug!(count = stores.len(), "storing assets");
            self.uploader.batch(Method::PUT, &stores)?;
        }

        Ok(())
    }
}

fn transfer(request: &SignedRequest, body: TransferBody) -> TransferRequest {
    TransferRequest {
        uri: request.uri.clone(),
        headers: request.headers.clone(),
        body,
    }
}

/// Most recent finished deployment other than `exclude`.
///
/// Ordered by creation time where the server reports it; otherwise the
/// earliest entry in server order (newest first) wins.
fn latest_finished(deployments: &[Deployment], exclude: u64) -> Option<&Deployment> {
    let mut best: Option<&Deployment> = None;
    for candidate in deployments
        .iter()
        .filter(|d| d.id != exclude && d.status == DeploymentStatus::Finished)
    {
        best = match best {
            Some(current) if candidate.created_at <= current.created_at => Some(current),
            _ => Some(candidate),
        };
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::path::PathBuf;

    fn file(path: &str) -> AssetFile {
        AssetFile {
            real_path: PathBuf::from("/assets").join(path),
            relative_path: path.to_string(),
            hash: format!("hash-{path}"),
        }
    }

    fn signed(command: AssetCommand, path: &str) -> (String, SignedRequest) {
        (
            path.to_string(),
            SignedRequest {
                command,
                uri: format!("https://bucket/{path}"),
                headers: BTreeMap::new(),
            },
        )
    }

    fn deployment(id: u64, status: DeploymentStatus, hash: &str, day: Option<u32>) -> Deployment {
        Deployment {
            id,
            status,
            deployment_type: None,
            assets_hash: Some(hash.to_string()),
            configuration: None,
            steps: Vec::new(),
            status_message: None,
            created_at: day.map(|d| Utc.with_ymd_and_hms(2026, 1, d, 0, 0, 0).unwrap()),
        }
    }

    #[test]
    fn partition_is_total_and_disjoint() {
        let files: Vec<AssetFile> = (0..10).map(|i| file(&format!("f{i}.js"))).collect();
        let mut response: BTreeMap<String, SignedRequest> = BTreeMap::new();
        for i in 0..8 {
            let command = if i % 2 == 0 {
                AssetCommand::Copy
            } else {
                AssetCommand::Store
            };
            let (path, request) = signed(command, &format!("f{i}.js"));
            response.insert(path, request);
        }
        // Paths never submitted are ignored
        let (path, request) = signed(AssetCommand::Store, "ghost.js");
        response.insert(path, request);

        let plan = SyncPlan::partition(files, response);

        assert_eq!(plan.len(), 10);
        assert_eq!(plan.copies.len(), 4);
        assert_eq!(plan.stores.len(), 4);
        let unprocessed: Vec<&str> = plan
            .unprocessed
            .iter()
            .map(|f| f.relative_path.as_str())
            .collect();
        assert_eq!(unprocessed, vec!["f8.js", "f9.js"]);
    }

    #[test]
    fn latest_finished_prefers_newest_created_at() {
        let deployments = vec![
            deployment(1, DeploymentStatus::Finished, "old", Some(1)),
            deployment(2, DeploymentStatus::Failed, "failed", Some(5)),
            deployment(3, DeploymentStatus::Finished, "new", Some(3)),
            deployment(4, DeploymentStatus::Finished, "current", Some(9)),
        ];
        let latest = latest_finished(&deployments, 4).unwrap();
        assert_eq!(latest.id, 3);
    }

    #[test]
    fn latest_finished_falls_back_to_server_order() {
        let deployments = vec![
            deployment(9, DeploymentStatus::Finished, "a", None),
            deployment(8, DeploymentStatus::Finished, "b", None),
        ];
        assert_eq!(latest_finished(&deployments, 10).unwrap().id, 9);
        assert!(latest_finished(&[], 1).is_none());
    }
}
