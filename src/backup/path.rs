//! Source path resolution.

use std::path::{Path, PathBuf};

/// Resolves `path` to an absolute, symlink-free canonical path.
///
/// Never fails: when the path cannot be canonicalized (usually because it
/// does not exist) the absolute but unresolved form is returned, and the
/// caller finds out it is missing when it walks it.
pub fn resolve<P: AsRef<Path>>(path: P) -> PathBuf {
    let path = path.as_ref();
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    match std::fs::canonicalize(&absolute) {
        Ok(canonical) => canonical,
        Err(e) => {
            tracing::trace!("Keeping unresolved path {:?}: {}", absolute, e);
            absolute
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_existing_dir_is_canonical() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir(temp_dir.path().join("a")).unwrap();

        let resolved = resolve(temp_dir.path().join("a").join("..").join("a"));
        assert_eq!(resolved, temp_dir.path().join("a").canonicalize().unwrap());
    }

    #[test]
    fn test_resolve_relative_is_absolute() {
        assert!(resolve("some/relative/dir").is_absolute());
        assert!(resolve(".").is_absolute());
    }

    #[test]
    fn test_resolve_missing_passes_through() {
        let resolved = resolve("/definitely/not/here");
        assert_eq!(resolved, PathBuf::from("/definitely/not/here"));
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_follows_symlink() {
        let temp_dir = TempDir::new().unwrap();
        let real = temp_dir.path().join("real");
        std::fs::create_dir(&real).unwrap();
        let link = temp_dir.path().join("link");
        std::os::unix::fs::symlink(&real, &link).unwrap();

        assert_eq!(resolve(&link), real.canonicalize().unwrap());
    }
}
