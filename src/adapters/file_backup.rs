use std::{
    fs::{self, File, OpenOptions},
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};

use chrono::{DateTime, Local};

use crate::{
    core::error::{EditorError, EditorResult},
    ports::backup_sink::BackupSink,
};

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const MAX_SNAPSHOTS_PER_SECOND: u32 = 1000;

/// Backup adapter copying the document to
/// `<backup_dir>/<file name>.<YYYYMMDD_HHMMSS>.bak`
#[derive(Debug, Clone)]
pub struct TimestampedBackupSink {
    source: PathBuf,
    backup_dir: PathBuf,
}

impl TimestampedBackupSink {
    pub fn new(source: impl Into<PathBuf>, backup_dir: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            backup_dir: backup_dir.into(),
        }
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Snapshot the source as of `now`. A second snapshot within the same
    /// second gets a numeric discriminator instead of overwriting the first.
    pub fn backup_at(&self, now: DateTime<Local>) -> EditorResult<Option<PathBuf>> {
        let mut source = match File::open(&self.source) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(EditorError::io("open", &self.source, e)),
        };

        fs::create_dir_all(&self.backup_dir)
            .map_err(|e| EditorError::io("create directory", &self.backup_dir, e))?;

        let stem = format!(
            "{}.{}",
            self.source
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "dynamic".to_string()),
            now.format(TIMESTAMP_FORMAT)
        );

        for n in 0..MAX_SNAPSHOTS_PER_SECOND {
            let target = match n {
                0 => self.backup_dir.join(format!("{stem}.bak")),
                n => self.backup_dir.join(format!("{stem}.{n}.bak")),
            };
            let mut snapshot = match OpenOptions::new().write(true).create_new(true).open(&target) {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(EditorError::io("create", target, e)),
            };
            io::copy(&mut source, &mut snapshot)
                .and_then(|_| snapshot.sync_all())
                .map_err(|e| EditorError::io("copy backup to", &target, e))?;
            return Ok(Some(target));
        }

        Err(EditorError::io(
            "create",
            self.backup_dir.join(format!("{stem}.bak")),
            io::Error::new(ErrorKind::AlreadyExists, "too many backups within one second"),
        ))
    }
}

impl BackupSink for TimestampedBackupSink {
    fn backup(&self) -> EditorResult<Option<PathBuf>> {
        self.backup_at(Local::now())
    }
}
