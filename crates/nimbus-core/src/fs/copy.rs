//! Directory materialization helpers used by build steps.

use std::fs;
use std::path::Path;

use anyhow::Context;

use super::walk::join_relative;

/// Remove `path` (if present) and create it again, empty.
pub fn recreate_dir(path: &Path) -> anyhow::Result<()> {
    if path.exists() {
        fs::remove_dir_all(path)
            .with_context(|| format!("Failed to remove directory: {}", path.display()))?;
    }
    fs::create_dir_all(path)
        .with_context(|| format!("Failed to create directory: {}", path.display()))?;
    Ok(())
}

/// Copy the tree under `src` into `dst`, skipping entries for which `skip`
/// returns true. `skip` receives forward-slash paths relative to `src`; a
/// skipped directory is not descended into.
///
/// Returns the number of files copied.
pub fn copy_tree<F>(src: &Path, dst: &Path, skip: F) -> anyhow::Result<usize>
where
    F: Fn(&str) -> bool,
{
    fs::create_dir_all(dst)
        .with_context(|| format!("Failed to create directory: {}", dst.display()))?;
    copy_recursive(src, dst, "", &skip)
}

fn copy_recursive<F>(src: &Path, dst: &Path, base: &str, skip: &F) -> anyhow::Result<usize>
where
    F: Fn(&str) -> bool,
{
    let mut copied = 0;
    let entries = fs::read_dir(src)
        .with_context(|| format!("Failed to read directory: {}", src.display()))?;

    for entry in entries {
        let entry =
            entry.with_context(|| format!("Failed to read directory entries: {}", src.display()))?;
        let name = entry.file_name();
        let relative = join_relative(base, &name.to_string_lossy());
        if skip(&relative) {
            continue;
        }

        let target = dst.join(&name);
        let ty = entry
            .file_type()
            .with_context(|| format!("Failed to stat file: {}", entry.path().display()))?;

        if ty.is_dir() {
            fs::create_dir_all(&target)
                .with_context(|| format!("Failed to create directory: {}", target.display()))?;
            copied += copy_recursive(&entry.path(), &target, &relative, skip)?;
        } else if ty.is_file() {
            fs::copy(entry.path(), &target).with_context(|| {
                format!(
                    "Failed to copy {} to {}",
                    entry.path().display(),
                    target.display()
                )
            })?;
            copied += 1;
        } else {
            tracing::debug!(path = %entry.path().display(), "not copying non-regular file");
        }
    }

    Ok(copied)
}

/// Remove empty directories below `root` (never `root` itself).
pub fn prune_empty_dirs(root: &Path) -> anyhow::Result<()> {
    let entries = fs::read_dir(root)
        .with_context(|| format!("Failed to read directory: {}", root.display()))?;
    for entry in entries {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            let path = entry.path();
            prune_empty_dirs(&path)?;
            if fs::read_dir(&path)?.next().is_none() {
                fs::remove_dir(&path)
                    .with_context(|| format!("Failed to remove directory: {}", path.display()))?;
            }
        }
    }
    Ok(())
}
