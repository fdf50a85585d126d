use crate::backup::result_error::WithMsg;
use itertools::Itertools;
use std::fmt::Debug;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    WalkDir(#[from] walkdir::Error),
    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
    #[error(transparent)]
    ValidationError(#[from] validator::ValidationErrors),
    #[error(transparent)]
    SerdeYml(#[from] serde_yml::Error),
    #[error("Source directory not found: {path:?}")]
    SourceMissing { path: PathBuf },
    #[error("Failed to add {src:?} as {dst:?}:\n{}", indent::indent_all_with("  ", error.to_string()))]
    EntryWrite {
        src: PathBuf,
        dst: PathBuf,
        error: Box<Error>,
    },
    #[error("Destination directory unavailable {dir:?}:\n{}", indent::indent_all_with("  ", error.to_string()))]
    DestinationUnavailable { dir: PathBuf, error: Box<Error> },
    #[error("Cannot open archive {path:?}:\n{}", indent::indent_all_with("  ", error.to_string()))]
    ArchiveOpen { path: PathBuf, error: Box<Error> },
    #[error("Cannot finalize archive {path:?}:\n{}", indent::indent_all_with("  ", error.to_string()))]
    ArchiveClose { path: PathBuf, error: Box<Error> },
    #[error("{}:\n{}", msg, indent::indent_all_with("  ", error.to_string()))]
    WithMsg { msg: String, error: Box<Error> },
    #[error("{}", itertools::join(.0, "\n\n"))]
    LotsOfError(Vec<Error>),
}

impl<S: Into<String>> WithMsg<S> for Error {
    fn with_msg(self, msg: S) -> Self {
        Self::WithMsg {
            msg: msg.into(),
            error: Box::new(self),
        }
    }
}

impl From<Vec<Error>> for Error {
    fn from(errors: Vec<Error>) -> Self {
        if errors.is_empty() {
            panic!("Should not create lots of errors when error is empty")
        }
        Self::LotsOfError(errors.into_iter().flat_map(Error::into_iter).collect_vec())
    }
}

impl Error {
    pub fn source_missing<P: Into<PathBuf>>(path: P) -> Self {
        Self::SourceMissing { path: path.into() }
    }

    pub fn entry_write<A: Into<PathBuf>, B: Into<PathBuf>, E: Into<Error>>(
        src: A,
        dst: B,
        error: E,
    ) -> Self {
        Self::EntryWrite {
            src: src.into(),
            dst: dst.into(),
            error: Box::new(error.into()),
        }
    }

    pub fn destination_unavailable<P: Into<PathBuf>, E: Into<Error>>(dir: P, error: E) -> Self {
        Self::DestinationUnavailable {
            dir: dir.into(),
            error: Box::new(error.into()),
        }
    }

    pub fn archive_open<P: Into<PathBuf>, E: Into<Error>>(path: P, error: E) -> Self {
        Self::ArchiveOpen {
            path: path.into(),
            error: Box::new(error.into()),
        }
    }

    pub fn archive_close<P: Into<PathBuf>, E: Into<Error>>(path: P, error: E) -> Self {
        Self::ArchiveClose {
            path: path.into(),
            error: Box::new(error.into()),
        }
    }

    /// Recoverable errors narrow what a run captured; everything else aborts it.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::SourceMissing { .. } | Error::EntryWrite { .. } | Error::WalkDir(_) => true,
            Error::WithMsg { error, .. } => error.is_recoverable(),
            Error::LotsOfError(errors) => errors.iter().all(Error::is_recoverable),
            _ => false,
        }
    }

    /// Display text folded onto one line, for log output.
    pub fn one_line(&self) -> String {
        self.to_string()
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .join(" ")
    }

    pub fn into_iter(self) -> Box<dyn Iterator<Item = Error>> {
        match self {
            Error::LotsOfError(v) => Box::new(v.into_iter().flat_map(Error::into_iter)),
            e => Box::new(std::iter::once(e)),
        }
    }

    pub fn chain(self, other: Error) -> Error {
        Error::LotsOfError(self.into_iter().chain(other.into_iter()).collect_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn not_found(msg: &str) -> std::io::Error {
        std::io::Error::new(std::io::ErrorKind::NotFound, msg.to_string())
    }

    #[test]
    fn test_error_from_io_error() {
        let error = Error::from(not_found("file not found"));

        match error {
            Error::Io(_) => (),
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_error_with_msg_display() {
        let error = Error::from(not_found("file not found")).with_msg("Operation failed");
        let error_str = error.to_string();

        assert!(error_str.contains("Operation failed"));
        assert!(error_str.contains("file not found"));
    }

    #[test]
    fn test_source_missing_display_contains_path() {
        let error = Error::source_missing("/data/missing");
        assert!(error.to_string().contains("/data/missing"));
        assert!(error.is_recoverable());
    }

    #[test]
    fn test_entry_write_display_and_class() {
        let error = Error::entry_write("/data/a.txt", "data/a.txt", not_found("gone"));
        let error_str = error.to_string();

        assert!(error_str.contains("/data/a.txt"));
        assert!(error_str.contains("gone"));
        assert!(error.is_recoverable());
    }

    #[test]
    fn test_one_line_flattens_nested_context() {
        let error = Error::entry_write("/data/a.txt", "data/a.txt", not_found("gone"))
            .with_msg("Skipping entry");
        let line = error.one_line();

        assert!(!line.contains('\n'));
        assert!(line.starts_with("Skipping entry: Failed to add"));
        assert!(line.ends_with("gone"));
    }

    #[test]
    fn test_fatal_errors_are_not_recoverable() {
        assert!(!Error::destination_unavailable("/out", not_found("x")).is_recoverable());
        assert!(!Error::archive_open("/out/a.zip", not_found("x")).is_recoverable());
        assert!(!Error::archive_close("/out/a.zip", not_found("x")).is_recoverable());
        assert!(!Error::from(not_found("x")).is_recoverable());
    }

    #[test]
    fn test_with_msg_keeps_recoverable_class() {
        let error = Error::source_missing("/nope").with_msg("Skipping source");
        assert!(error.is_recoverable());
    }

    #[test]
    fn test_error_from_vec_flattens() {
        let nested = Error::from(vec![Error::from(not_found("a")), Error::from(not_found("b"))]);
        let combined = Error::from(vec![nested, Error::source_missing("/c")]);

        match combined {
            Error::LotsOfError(errors) => assert_eq!(errors.len(), 3),
            _ => panic!("Expected LotsOfError"),
        }
    }

    #[test]
    #[should_panic(expected = "Should not create lots of errors when error is empty")]
    fn test_error_from_empty_vec_panics() {
        let _error = Error::from(Vec::<Error>::new());
    }

    #[test]
    fn test_error_chain() {
        let chained = Error::from(not_found("error1")).chain(Error::source_missing("/x"));
        match chained {
            Error::LotsOfError(errors) => assert_eq!(errors.len(), 2),
            _ => panic!("Expected LotsOfError"),
        }
    }
}
