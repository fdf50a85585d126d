use crate::backup::archive::ArchiveEntry;
use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use crate::backup::result_error::WithMsg;

use getset::Getters;
use walkdir::{DirEntry, WalkDir};

use std::path::{Path, PathBuf};

/// Recursively enumerates the files of one source directory
///
/// Entries are produced lazily in filesystem enumeration order, with archive
/// paths rooted at the source directory's own name.
#[derive(Clone, Debug, PartialEq, Eq, Getters)]
#[getset(get = "pub")]
pub struct TreeWalker {
    src_dir: PathBuf,
    base_dir: PathBuf,
}

impl TreeWalker {
    /// `src_dir` is expected to be already resolved.
    pub fn new<P: Into<PathBuf>>(src_dir: P) -> Self {
        let src_dir = src_dir.into();
        let base_dir = src_dir
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| src_dir.clone());
        Self { src_dir, base_dir }
    }

    /// Starts the walk. A missing source directory is reported here, before
    /// any entry is produced.
    pub fn walk(&self) -> Result<TreeWalk> {
        if !self.src_dir.is_dir() {
            return Err(Error::source_missing(&self.src_dir));
        }

        tracing::trace!("Scanning directory {:?}", self.src_dir);
        Ok(TreeWalk {
            inner: WalkDir::new(&self.src_dir).follow_links(false).into_iter(),
            base_dir: self.base_dir.clone(),
        })
    }
}

/// Single-pass iterator over the files found by a [`TreeWalker`]
pub struct TreeWalk {
    inner: walkdir::IntoIter,
    base_dir: PathBuf,
}

impl Iterator for TreeWalk {
    type Item = Result<ArchiveEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let res = match self.inner.next()? {
                Ok(de) => process_dir_entry(de, &self.base_dir),
                Err(e) => Some(Err(Error::from(e))),
            };
            if res.is_some() {
                return res;
            }
        }
    }
}

fn process_dir_entry<P: AsRef<Path>>(de: DirEntry, base_dir: P) -> Option<Result<ArchiveEntry>> {
    let is_file = de.file_type().is_file() || (de.path_is_symlink() && de.path().is_file());
    let p = de.into_path();
    if !is_file {
        tracing::trace!("Skipping {:?} not a file", p);
        return None;
    }

    let res = match p.strip_prefix(base_dir.as_ref()) {
        Ok(stripped_path) => Ok(stripped_path.to_path_buf()),
        Err(e) => Err(Error::from(std::io::Error::other(e)).with_msg(format!(
            "Stripping {:?} from {:?} failed",
            base_dir.as_ref(),
            p
        ))),
    };

    Some(res.map(|dst| {
        if dst.to_str().is_none() {
            tracing::warn!("Non UTF-8 path {:?} is stored with replacement characters", p);
        }
        let entry = ArchiveEntry::new(p, dst);
        tracing::trace!("Including file: {:?} -> {:?}", entry.src, entry.dst);
        entry
    }))
}
