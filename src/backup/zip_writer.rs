use crate::backup::archive::ArchiveEntry;
use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;

use bon::Builder;
use chrono::{Datelike, Timelike};
use getset::{CopyGetters, Getters};
use tempfile::NamedTempFile;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use std::fs::{File, Metadata};
use std::io::{BufWriter, IntoInnerError};
use std::path::{Path, PathBuf};

/// Entries at or above this size need ZIP64 headers.
const LARGE_FILE_THRESHOLD: u64 = u32::MAX as u64;

/// Settings applied to every entry of an archive
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Builder, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct ArchiveOptions {
    /// Deflate level 0-9, codec default when unset.
    compression_level: Option<i64>,
}

/// An open ZIP archive being filled with entries
///
/// Bytes go to a hidden temporary file next to the final path. The archive
/// only appears under its final name once [`ArchiveWriter::close`] succeeds,
/// and dropping an unclosed writer deletes the temporary file.
#[derive(Getters, CopyGetters)]
pub struct ArchiveWriter {
    zip: ZipWriter<BufWriter<NamedTempFile>>,
    #[getset(get = "pub")]
    path: PathBuf,
    options: ArchiveOptions,
    #[getset(get_copy = "pub")]
    entry_count: usize,
    #[getset(get_copy = "pub")]
    bytes_written: u64,
}

impl ArchiveWriter {
    /// Creates a new archive that will be published at `path`.
    ///
    /// Refuses to reuse a path that already exists.
    pub fn open<P: Into<PathBuf>>(path: P, options: ArchiveOptions) -> Result<Self> {
        let path = path.into();
        let tmp = create_tmp_file(&path).map_err(|e| Error::archive_open(&path, e))?;
        tracing::trace!("Opened temporary archive {:?} for {:?}", tmp.path(), path);

        Ok(Self {
            zip: ZipWriter::new(BufWriter::new(tmp)),
            path,
            options,
            entry_count: 0,
            bytes_written: 0,
        })
    }

    /// Reads `entry.src` fully and stores it deflated under `entry.dst`.
    ///
    /// Returns the number of uncompressed bytes stored. On failure the entry
    /// is dropped from the archive and the writer stays usable.
    pub fn write_entry(&mut self, entry: &ArchiveEntry) -> Result<u64> {
        let written = self
            .try_write_entry(entry)
            .map_err(|e| Error::entry_write(entry.src.as_ref(), entry.dst.as_ref(), e))?;
        self.entry_count += 1;
        self.bytes_written += written;
        Ok(written)
    }

    fn try_write_entry(&mut self, entry: &ArchiveEntry) -> Result<u64> {
        let mut file = File::open(&entry.src)?;
        let options = self.entry_options(&file.metadata()?);
        self.zip.start_file(entry.archive_name(), options)?;

        match std::io::copy(&mut file, &mut self.zip) {
            Ok(written) => Ok(written),
            Err(e) => {
                let error = Error::from(e);
                match self.zip.abort_file() {
                    Ok(_) => Err(error),
                    Err(abort_error) => Err(error.chain(abort_error.into())),
                }
            }
        }
    }

    fn entry_options(&self, metadata: &Metadata) -> SimpleFileOptions {
        let mut options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(self.options.compression_level)
            .large_file(metadata.len() >= LARGE_FILE_THRESHOLD);

        if let Some(modified) = modified_time(metadata) {
            options = options.last_modified_time(modified);
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            options = options.unix_permissions(metadata.permissions().mode());
        }

        options
    }

    /// Writes the central directory, syncs the data and publishes the
    /// archive under its final name.
    pub fn close(self) -> Result<PathBuf> {
        let path = self.path;
        finalize(self.zip, &path).map_err(|e| Error::archive_close(&path, e))?;
        tracing::trace!("Finalized archive {:?} with {} entries", path, self.entry_count);
        Ok(path)
    }
}

fn create_tmp_file(path: &Path) -> Result<NamedTempFile> {
    if path.try_exists()? {
        return Err(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            "archive already exists",
        )
        .into());
    }

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(tempfile::Builder::new()
        .prefix(&format!(".{file_name}."))
        .suffix(".tmp")
        .tempfile_in(dir)?)
}

fn finalize(zip: ZipWriter<BufWriter<NamedTempFile>>, path: &Path) -> Result<()> {
    let tmp = zip
        .finish()?
        .into_inner()
        .map_err(IntoInnerError::into_error)?;
    tmp.as_file().sync_all()?;
    tmp.persist_noclobber(path).map_err(|e| e.error)?;
    sync_parent_dir(path)
}

/// Makes the rename itself durable.
#[cfg(unix)]
fn sync_parent_dir(path: &Path) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    File::open(dir)?.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) -> Result<()> {
    Ok(())
}

fn modified_time(metadata: &Metadata) -> Option<zip::DateTime> {
    let modified: chrono::DateTime<chrono::Local> = metadata.modified().ok()?.into();
    // ZIP timestamps cover 1980-2107 only
    zip::DateTime::from_date_and_time(
        u16::try_from(modified.year()).ok()?,
        modified.month() as u8,
        modified.day() as u8,
        modified.hour() as u8,
        modified.minute() as u8,
        modified.second() as u8,
    )
    .ok()
}
