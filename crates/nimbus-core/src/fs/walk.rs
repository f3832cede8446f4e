//! Deterministic directory traversal.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;

/// A regular file found under a traversal root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkedFile {
    /// Absolute (or root-joined) path on disk
    pub path: PathBuf,
    /// Path relative to the root, always forward-slash separated
    pub relative: String,
}

/// Recursively list regular files under `root`, sorted by relative path.
///
/// Symlinks are skipped; they are neither followed nor reported.
pub fn walk_files(root: &Path) -> anyhow::Result<Vec<WalkedFile>> {
    let mut files = Vec::new();
    walk_recursive(root, "", &mut files)?;
    files.sort_by(|a, b| a.relative.cmp(&b.relative));
    Ok(files)
}

fn walk_recursive(dir: &Path, base: &str, out: &mut Vec<WalkedFile>) -> anyhow::Result<()> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?;

    for entry in entries {
        let entry =
            entry.with_context(|| format!("Failed to read directory entries: {}", dir.display()))?;
        let name = entry.file_name();
        let relative = join_relative(base, &name.to_string_lossy());

        let ty = entry
            .file_type()
            .with_context(|| format!("Failed to stat file: {}", entry.path().display()))?;

        if ty.is_dir() {
            walk_recursive(&entry.path(), &relative, out)?;
        } else if ty.is_file() {
            out.push(WalkedFile {
                path: entry.path(),
                relative,
            });
        } else {
            tracing::debug!(path = %entry.path().display(), "skipping non-regular file");
        }
    }

    Ok(())
}

/// Join a forward-slash relative base with a path segment.
pub fn join_relative(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", base, name)
    }
}

/// Normalize a relative path to forward slashes.
pub fn to_forward_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
