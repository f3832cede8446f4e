//! Content hashing for change detection.
//!
//! Two hashes are part of the wire contract with the remote API:
//! - the per-file content hash submitted with every asset: XXH3-128, as 32
//!   lowercase hex digits;
//! - the aggregate assets hash recorded on each deployment: blake3 over the
//!   sorted per-file hashes, as 64 lowercase hex digits.
//!
//! They detect changes; they are not used for integrity checks, and
//! collisions are not handled.

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use anyhow::Context;
use xxhash_rust::xxh3::Xxh3;

use super::walk::walk_files;

const READ_BUFFER: usize = 64 * 1024;

/// Hash a single file's content (XXH3-128, lowercase hex).
pub fn hash_file(path: &Path) -> anyhow::Result<String> {
    let mut file =
        File::open(path).with_context(|| format!("Failed to open file: {}", path.display()))?;
    let mut hasher = Xxh3::new();
    let mut buffer = vec![0u8; READ_BUFFER];
    loop {
        let read = match file.read(&mut buffer) {
            Ok(0) => break,
            Ok(read) => read,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read file: {}", path.display()));
            }
        };
        hasher.update(&buffer[..read]);
    }
    Ok(format!("{:032x}", hasher.digest128()))
}

/// Compute the aggregate hash of a directory tree.
///
/// # Algorithm
/// - Regular files only, sorted by forward-slash relative path
/// - Each file contributes `relative_path || 0x00 || content_hash || 0x0A`
/// - Empty directories and symlinks do not contribute
///
/// Two trees with the same relative paths and contents hash identically
/// regardless of creation order or platform path separator.
pub fn hash_tree(path: &Path) -> anyhow::Result<String> {
    if !path.is_dir() {
        anyhow::bail!("Not a directory: {}", path.display());
    }

    let mut hasher = blake3::Hasher::new();
    for file in walk_files(path)? {
        hasher.update(file.relative.as_bytes());
        hasher.update(&[0x00]);
        hasher.update(hash_file(&file.path)?.as_bytes());
        hasher.update(&[0x0A]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}
