//! Pristine backup + working copy of a snapshot file.
//!
//! The backup is only ever read. The working copy is overwritten wholesale by
//! [`SnapshotStore::restore`] and rewritten table-by-table by
//! [`SnapshotStore::persist_all_tables`].

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::dataset::Dataset;
use crate::error::{Result, ShiftError};

use super::sqlite::{Catalog, Database};

/// First 16 bytes of every SQLite 3 database file.
pub const SQLITE_HEADER: &[u8; 16] = b"SQLite format 3\0";

/// Sidecar files SQLite may leave next to a database.
const SIDECAR_SUFFIXES: [&str; 3] = ["-wal", "-shm", "-journal"];

/// Outcome of a restore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestoreReport {
    pub working_path: PathBuf,
    pub backup_path: PathBuf,
    pub bytes: u64,
    /// Hex SHA-256 of the restored working copy.
    pub sha256: String,
}

/// Outcome of installing a downloaded dataset as the backup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    /// `false` when a backup already existed and overwrite was not requested.
    pub installed: bool,
    pub backup_path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restore: Option<RestoreReport>,
}

/// Durable, restorable holder of the dataset.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    working_path: PathBuf,
    backup_path: PathBuf,
}

impl SnapshotStore {
    pub fn new(working_path: impl Into<PathBuf>, backup_path: impl Into<PathBuf>) -> Self {
        Self {
            working_path: working_path.into(),
            backup_path: backup_path.into(),
        }
    }

    pub fn working_path(&self) -> &Path {
        &self.working_path
    }

    pub fn backup_path(&self) -> &Path {
        &self.backup_path
    }

    /// Copy the backup over the working file, byte for byte.
    ///
    /// Any prior working state is discarded, including stale journal
    /// sidecars. The copy lands in a temporary file next to the working file
    /// and is renamed into place.
    pub fn restore(&self) -> Result<RestoreReport> {
        let source = open_backup(&self.backup_path)?;
        let (bytes, sha256) = install_copy(source, &self.working_path)?;

        info!(
            working = %self.working_path.display(),
            backup = %self.backup_path.display(),
            bytes,
            "restored working copy from backup"
        );
        Ok(RestoreReport {
            working_path: self.working_path.clone(),
            backup_path: self.backup_path.clone(),
            bytes,
            sha256,
        })
    }

    /// Install an already-downloaded SQLite file as the backup, then restore
    /// the working copy from it.
    ///
    /// Does nothing when a backup exists and `overwrite` is false.
    pub fn seed(&self, source: &Path, overwrite: bool) -> Result<SeedReport> {
        if self.backup_path.exists() && !overwrite {
            debug!(backup = %self.backup_path.display(), "backup exists, seed skipped");
            return Ok(SeedReport {
                installed: false,
                backup_path: self.backup_path.clone(),
                restore: None,
            });
        }

        let mut file = File::open(source)?;
        let mut header = [0u8; 16];
        let header_ok = match file.read_exact(&mut header) {
            Ok(()) => &header == SQLITE_HEADER,
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => false,
            Err(err) => return Err(err.into()),
        };
        if !header_ok {
            return Err(ShiftError::InvalidSnapshot(format!(
                "{} does not start with the SQLite header",
                source.display()
            )));
        }

        let file = File::open(source)?;
        install_copy(file, &self.backup_path)?;
        info!(
            source = %source.display(),
            backup = %self.backup_path.display(),
            "installed backup"
        );

        let restore = self.restore()?;
        Ok(SeedReport {
            installed: true,
            backup_path: self.backup_path.clone(),
            restore: Some(restore),
        })
    }

    /// Tables and columns of the working copy.
    pub fn catalog(&self) -> Result<Catalog> {
        self.open_working()?.catalog()
    }

    /// Load every user table of the working copy verbatim.
    pub fn load_all_tables(&self) -> Result<Dataset> {
        let dataset = self.open_working()?.load_tables(None)?;
        debug!(tables = dataset.len(), rows = dataset.row_count(), "loaded working copy");
        Ok(dataset)
    }

    /// Load only the named tables of the working copy.
    pub fn load_tables(&self, names: &[&str]) -> Result<Dataset> {
        self.open_working()?.load_tables(Some(names))
    }

    /// Load tables straight from the backup without touching the working copy.
    pub fn load_backup(&self, names: Option<&[&str]>) -> Result<Dataset> {
        open_backup(&self.backup_path)?;
        Database::open_read_only(&self.backup_path)?.load_tables(names)
    }

    /// Replace every table of `dataset` in the working copy atomically.
    pub fn persist_all_tables(&self, dataset: &Dataset) -> Result<()> {
        let mut db = self.open_working()?;
        db.replace_tables(dataset)?;
        info!(
            working = %self.working_path.display(),
            tables = dataset.len(),
            rows = dataset.row_count(),
            "persisted working copy"
        );
        Ok(())
    }

    fn open_working(&self) -> Result<Database> {
        if !self.working_path.is_file() {
            return Err(ShiftError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("working copy not found: {}", self.working_path.display()),
            )));
        }
        Database::open(&self.working_path)
    }
}

/// SHA-256 of a file's contents as lowercase hex.
pub fn file_sha256(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut writer = DigestWriter::new(io::sink());
    io::copy(&mut file, &mut writer)?;
    Ok(writer.finish())
}

fn open_backup(path: &Path) -> Result<File> {
    let missing = |source: io::Error| ShiftError::MissingBackup {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(missing)?;
    let metadata = file.metadata().map_err(missing)?;
    if !metadata.is_file() {
        return Err(missing(io::Error::new(
            io::ErrorKind::InvalidInput,
            "not a regular file",
        )));
    }
    Ok(file)
}

/// Stream `source` into a temp file beside `dest`, drop stale sidecars, and
/// rename over `dest`. Returns the byte count and hex digest.
fn install_copy(mut source: File, dest: &Path) -> Result<(u64, String)> {
    let parent = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent)?;

    let tmp = NamedTempFile::new_in(&parent)?;
    let mut writer = DigestWriter::new(tmp);
    let bytes = io::copy(&mut source, &mut writer)?;
    writer.flush()?;
    let DigestWriter { inner: tmp, hasher } = writer;
    let sha256 = hex::encode(hasher.finalize());
    tmp.as_file().sync_all()?;

    for suffix in SIDECAR_SUFFIXES {
        let mut sidecar = dest.as_os_str().to_owned();
        sidecar.push(suffix);
        let sidecar = PathBuf::from(sidecar);
        if sidecar.exists() {
            fs::remove_file(&sidecar)?;
            debug!(path = %sidecar.display(), "removed stale sidecar");
        }
    }

    tmp.persist(dest).map_err(|err| ShiftError::Io(err.error))?;
    Ok((bytes, sha256))
}

struct DigestWriter<W> {
    inner: W,
    hasher: Sha256,
}

impl<W: Write> DigestWriter<W> {
    fn new(inner: W) -> Self {
        Self {
            inner,
            hasher: Sha256::new(),
        }
    }

    fn finish(self) -> String {
        hex::encode(self.hasher.finalize())
    }
}

impl<W: Write> Write for DigestWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.hasher.update(&buf[..written]);
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
