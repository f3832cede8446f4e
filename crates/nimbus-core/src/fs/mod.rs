//! Filesystem primitives shared across features.

pub mod copy;
pub mod tree_hash;
pub mod walk;

pub use copy::{copy_tree, prune_empty_dirs, recreate_dir};
pub use tree_hash::{hash_file, hash_tree};
pub use walk::{WalkedFile, to_forward_slash, walk_files};
