//! File-backed tracing sink handed to a backup run.
//!
//! Nothing here installs a global subscriber: the sink is entered for the
//! duration of a run with [`LogSink::in_scope`], so the log file only sees
//! lines belonging to that run.

use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use crate::backup::result_error::WithMsg;

use clap::ValueEnum;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use tracing::Dispatch;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;

static TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(
    Clone, Copy, Debug, Default, Display, PartialEq, Eq, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    #[display("trace")]
    Trace,
    #[default]
    #[display("debug")]
    Debug,
    #[display("info")]
    Info,
    #[display("warn")]
    Warn,
    #[display("error")]
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

struct LocalTime;

impl FormatTime for LocalTime {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format(TIME_FORMAT))
    }
}

/// Append-only log file plus the subscriber writing to it
#[derive(Clone)]
pub struct LogSink {
    path: PathBuf,
    file: Arc<File>,
    dispatch: Dispatch,
}

impl LogSink {
    pub fn open<P: Into<PathBuf>>(path: P, level: LogLevel) -> Result<Self> {
        let path = path.into();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map(Arc::new)
            .map_err(Error::from)
            .with_msg(format!("Cannot open log file {:?}", path))?;

        let subscriber = tracing_subscriber::fmt()
            .with_writer(file.clone())
            .with_ansi(false)
            .with_target(false)
            .with_timer(LocalTime)
            .with_max_level(LevelFilter::from(level))
            .finish();

        Ok(Self {
            path,
            file,
            dispatch: Dispatch::new(subscriber),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Runs `f` with this sink as the current subscriber, then syncs the file.
    pub fn in_scope<T, F: FnOnce() -> T>(&self, f: F) -> T {
        let res = tracing::dispatcher::with_default(&self.dispatch, f);
        if let Err(e) = self.file.sync_all() {
            tracing::warn!("Syncing log file {:?} failed: {}", self.path, e);
        }
        res
    }
}
