//! # auto-backup
//!
//! Directory-to-archive backup: every file under a set of source
//! directories goes into one timestamped, deflate-compressed ZIP archive.
//!
//! ## Features
//!
//! - **Failure isolation**: a missing source directory or an unreadable file
//!   is logged and skipped, the rest of the run carries on
//! - **Safe publishing**: the archive is written to a temporary file and only
//!   appears under `backup_<YYYYMMDD_HHMMSS>.zip` once it is complete
//! - **Log file**: timestamped lines appended to a configurable file
//!
//! ## Quick Start
//!
//! ```no_run
//! use auto_backup::backup::backup_config::BackupConfig;
//! use auto_backup::backup::log_sink::LogSink;
//! use auto_backup::backup::orchestrator::BackupOrchestrator;
//! use std::path::PathBuf;
//!
//! let config = BackupConfig::builder()
//!     .sources(vec![PathBuf::from("/data/projects")])
//!     .build();
//! let log_sink = LogSink::open(config.log_file(), config.log_level())?;
//! let report = BackupOrchestrator::new(config, log_sink).run()?;
//! println!("Backup complete: {:?}", report.archive());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod backup;
