use crate::backup::archive::tree_walker::TreeWalker;
use crate::backup::archive::ArchiveEntry;
use crate::backup::backup_config::BackupConfig;
use crate::backup::log_sink::LogSink;
use crate::backup::path::resolve;
use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::{convert_error_vec, Result};
use crate::backup::zip_writer::ArchiveWriter;

use chrono::{DateTime, Local, TimeZone};
use derive_more::Display;
use getset::{CopyGetters, Getters};
use itertools::Itertools;
use tracing::{debug, error, info, trace, warn};

use std::collections::HashMap;
use std::path::{Path, PathBuf};

static TIME_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Lifecycle of a single backup run
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum RunState {
    Init,
    DestinationReady,
    Archiving,
    Closed,
    Failed,
}

/// What a successful run captured
#[derive(Debug, Getters, CopyGetters)]
pub struct BackupReport {
    #[getset(get = "pub")]
    archive: PathBuf,
    #[getset(get_copy = "pub")]
    files: usize,
    #[getset(get_copy = "pub")]
    bytes: u64,
    /// Recoverable problems, in the order they happened
    #[getset(get = "pub")]
    warnings: Vec<Error>,
}

impl BackupReport {
    /// Folds the warnings into one error, `None` when the run was clean.
    pub fn into_non_fatal_error(self) -> Option<Error> {
        convert_error_vec(self.warnings).err()
    }
}

pub fn archive_file_name<T: TimeZone>(dt: &DateTime<T>) -> String
where
    T::Offset: std::fmt::Display,
{
    format!("backup_{}.zip", dt.format(TIME_FORMAT))
}

/// Drives one backup from configuration to a closed archive
///
/// Archive level failures (destination, open, close) abort the run.
/// Missing sources and unreadable files are logged, collected as warnings
/// and skipped.
pub struct BackupOrchestrator {
    config: BackupConfig,
    log_sink: LogSink,
    state: RunState,
}

impl BackupOrchestrator {
    pub fn new(config: BackupConfig, log_sink: LogSink) -> Self {
        Self {
            config,
            log_sink,
            state: RunState::Init,
        }
    }

    pub fn config(&self) -> &BackupConfig {
        &self.config
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn run(&mut self) -> Result<BackupReport> {
        self.run_at(Local::now())
    }

    /// Runs the backup as if started at `dt`, which names the archive.
    pub fn run_at<T: TimeZone>(&mut self, dt: DateTime<T>) -> Result<BackupReport>
    where
        T::Offset: std::fmt::Display,
    {
        let log_sink = self.log_sink.clone();
        log_sink.in_scope(|| {
            info!("Backup process initialized.");
            let res = self
                .open_archive(archive_file_name(&dt))
                .and_then(|writer| self.archive_sources(writer));
            self.conclude(res)
        })
    }

    fn transition(&mut self, next: RunState) {
        trace!("Run state {} -> {}", self.state, next);
        self.state = next;
    }

    fn open_archive(&mut self, file_name: String) -> Result<ArchiveWriter> {
        let out_dir = ensure_destination(self.config.out_dir())?;
        self.transition(RunState::DestinationReady);

        let writer = ArchiveWriter::open(out_dir.join(file_name), self.config.archive_options())?;
        self.transition(RunState::Archiving);
        Ok(writer)
    }

    fn archive_sources(&self, mut writer: ArchiveWriter) -> Result<BackupReport> {
        let mut warnings = Vec::new();
        let entries = self
            .config
            .sources()
            .iter()
            .flat_map(|source| walk_source(source, &mut warnings))
            .collect_vec();

        for entry in last_write_wins(entries) {
            match writer.write_entry(&entry) {
                Ok(_) => debug!("Added {:?} as {:?}", entry.src, entry.dst),
                Err(e) => {
                    warn!("Skipping entry: {}", e.one_line());
                    warnings.push(e);
                }
            }
        }

        let files = writer.entry_count();
        let bytes = writer.bytes_written();
        let archive = writer.close()?;

        Ok(BackupReport {
            archive,
            files,
            bytes,
            warnings,
        })
    }

    fn conclude(&mut self, res: Result<BackupReport>) -> Result<BackupReport> {
        match &res {
            Ok(report) => {
                self.transition(RunState::Closed);
                info!("Backup created successfully: {:?}", report.archive);
                if !report.warnings.is_empty() {
                    info!("Backup completed with {} warning(s)", report.warnings.len());
                }
            }
            Err(e) => {
                self.transition(RunState::Failed);
                error!("Backup failed: {}", e.one_line());
            }
        }
        res
    }
}

/// Resolves the output directory and creates it when missing.
fn ensure_destination(out_dir: &Path) -> Result<PathBuf> {
    let dir = resolve(out_dir);
    if dir.is_dir() {
        return Ok(dir);
    }

    std::fs::create_dir_all(&dir).map_err(|e| Error::destination_unavailable(&dir, e))?;
    info!("Created backup directory: {:?}", dir);
    // canonical form now that it exists
    Ok(resolve(&dir))
}

/// Lists the files of one source. Problems are logged and pushed to
/// `warnings`, the source then contributes whatever could be listed.
fn walk_source(source: &Path, warnings: &mut Vec<Error>) -> Vec<ArchiveEntry> {
    let walk = match TreeWalker::new(resolve(source)).walk() {
        Ok(walk) => walk,
        Err(e) => {
            warn!("{}", e.one_line());
            warnings.push(e);
            return Vec::new();
        }
    };

    walk.filter_map(|entry| match entry {
        Ok(entry) => Some(entry),
        Err(e) => {
            warn!("Skipping entry: {}", e.one_line());
            warnings.push(e);
            None
        }
    })
    .collect()
}

/// Keeps only the last entry for each archive name, in walk order.
fn last_write_wins(entries: Vec<ArchiveEntry>) -> Vec<ArchiveEntry> {
    let last: HashMap<String, usize> = entries
        .iter()
        .enumerate()
        .map(|(idx, entry)| (entry.archive_name(), idx))
        .collect();

    entries
        .into_iter()
        .enumerate()
        .filter_map(|(idx, entry)| {
            if last.get(&entry.archive_name()) == Some(&idx) {
                Some(entry)
            } else {
                info!("{:?} replaced by a later source file as {:?}", entry.src, entry.dst);
                None
            }
        })
        .collect()
}
