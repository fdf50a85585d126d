pub mod tree_walker;

use itertools::Itertools;
use std::path::{Component, Path};
use std::sync::Arc;

/// A single file to be stored in the backup archive
///
/// `src` is the absolute path on the filesystem, `dst` the path the file gets
/// inside the archive. `dst` is relative to the parent of the source
/// directory, so the source directory's own name is the top-level folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Source file path on the filesystem
    pub src: Arc<Path>,

    /// Destination path within the backup archive
    pub dst: Arc<Path>,
}

impl ArchiveEntry {
    pub fn new<A: Into<Arc<Path>>, B: Into<Arc<Path>>>(src: A, dst: B) -> ArchiveEntry {
        Self {
            src: src.into(),
            dst: dst.into(),
        }
    }

    /// Name of the entry inside the archive, always `/` separated.
    pub fn archive_name(&self) -> String {
        self.dst
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy()),
                _ => None,
            })
            .join("/")
    }
}
