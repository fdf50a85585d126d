use auto_backup::backup::backup_config::BackupConfig;
use auto_backup::backup::log_sink::{LogLevel, LogSink};
use auto_backup::backup::orchestrator::BackupOrchestrator;
use auto_backup::backup::result_error::error::Error;
use auto_backup::backup::result_error::result::Result;
use clap::Parser;
use std::path::PathBuf;
use std::process::exit;
use tracing::{error, warn};
use validator::Validate;

/// Automated System Backup Script
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// List of source directories to backup
    #[arg(short, long, num_args = 1.., required_unless_present = "config")]
    source: Vec<PathBuf>,

    /// Output directory for backup ZIP
    #[arg(short, long, default_value = "backups")]
    output: PathBuf,

    /// Log file name
    #[arg(short, long, default_value = "backup.log")]
    log: PathBuf,

    /// Minimum level written to the log file
    #[arg(long, value_enum, default_value_t = LogLevel::Debug)]
    log_level: LogLevel,

    /// Deflate level, 0 (fastest) to 9 (smallest)
    #[arg(long, value_parser = clap::value_parser!(i64).range(0..=9))]
    compression_level: Option<i64>,

    /// YAML config file, replaces all other options
    #[arg(short, long, conflicts_with = "source")]
    config: Option<PathBuf>,
}

impl Args {
    fn into_config(self) -> Result<BackupConfig> {
        if let Some(path) = self.config {
            return BackupConfig::from_yaml_file(path);
        }

        let config = BackupConfig::builder()
            .sources(self.source)
            .out_dir(self.output)
            .log_file(self.log)
            .log_level(self.log_level)
            .maybe_compression_level(self.compression_level)
            .build();
        config.validate().map_err(Error::from)?;
        Ok(config)
    }
}

fn main() {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    let args = Args::parse();

    let res = args.into_config().and_then(|config| {
        let log_sink = LogSink::open(config.log_file(), config.log_level())?;
        BackupOrchestrator::new(config, log_sink).run()
    });

    match res {
        Ok(report) => {
            println!("Backup complete: {}", report.archive().display());
            if let Some(non_fatal_error) = report.into_non_fatal_error() {
                warn!("Received non fatal error: {non_fatal_error}");
            }
        }
        Err(e) => {
            error!("Error during backup: {e}");
            exit(1);
        }
    }
}
