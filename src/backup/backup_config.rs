use crate::backup::log_sink::LogLevel;
use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use crate::backup::result_error::WithMsg;
use crate::backup::validate::validate_non_empty_paths;
use crate::backup::zip_writer::ArchiveOptions;

use bon::Builder;
use getset::{CopyGetters, Getters};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use validator::Validate;

use std::fs::File;
use std::path::{Path, PathBuf};

fn default_out_dir() -> PathBuf {
    PathBuf::from("backups")
}

fn default_log_file() -> PathBuf {
    PathBuf::from("backup.log")
}

/// Everything a backup run needs to know
///
/// Built from command line flags or loaded from a YAML file.
#[skip_serializing_none]
#[derive(Clone, Debug, Serialize, Deserialize, Validate, Builder, PartialEq, Eq, Getters, CopyGetters)]
#[serde(deny_unknown_fields)]
pub struct BackupConfig {
    /// Directories to back up, archived in this order
    #[validate(length(min = 1), custom(function = validate_non_empty_paths))]
    #[builder(into)]
    #[getset(get = "pub")]
    sources: Vec<PathBuf>,

    /// Where archives are written, created at run time when missing
    #[serde(default = "default_out_dir")]
    #[builder(default = default_out_dir(), into)]
    #[getset(get = "pub")]
    out_dir: PathBuf,

    #[serde(default = "default_log_file")]
    #[builder(default = default_log_file(), into)]
    #[getset(get = "pub")]
    log_file: PathBuf,

    #[serde(default)]
    #[builder(default)]
    #[getset(get_copy = "pub")]
    log_level: LogLevel,

    /// Deflate level (0-9)
    #[validate(range(min = 0, max = 9))]
    #[getset(get_copy = "pub")]
    compression_level: Option<i64>,
}

impl BackupConfig {
    /// Loads and validates a YAML config file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let config = File::open(path)
            .map_err(Error::from)
            .and_then(|f| serde_yml::from_reader::<_, BackupConfig>(f).map_err(Error::from))
            .with_msg(format!("Parse YAML config failed: {:?}", path))?;
        config
            .validate()
            .map_err(Error::from)
            .with_msg(format!("Config validation failed: {:?}", path))?;
        Ok(config)
    }

    pub fn archive_options(&self) -> ArchiveOptions {
        ArchiveOptions::builder()
            .maybe_compression_level(self.compression_level)
            .build()
    }
}
