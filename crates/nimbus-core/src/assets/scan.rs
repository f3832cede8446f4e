use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::fs::{hash_file, walk_files};
use crate::remote::AssetManifestEntry;

/// One asset file found by a scan. Recomputed every run, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetFile {
    pub real_path: PathBuf,
    /// Forward-slash path relative to the assets directory
    pub relative_path: String,
    pub hash: String,
}

impl AssetFile {
    pub fn manifest_entry(&self) -> AssetManifestEntry {
        AssetManifestEntry {
            path: self.relative_path.clone(),
            hash: self.hash.clone(),
        }
    }
}

/// Hash every regular file under `assets_dir`, sorted by relative path.
///
/// A missing directory scans as empty.
pub fn scan_assets(assets_dir: &Path) -> Result<Vec<AssetFile>> {
    if !assets_dir.is_dir() {
        return Ok(Vec::new());
    }

    walk_files(assets_dir)?
        .into_iter()
        .map(|file| -> Result<AssetFile> {
            let hash = hash_file(&file.path)?;
            Ok(AssetFile {
                real_path: file.path,
                relative_path: file.relative,
                hash,
            })
        })
        .collect()
}
