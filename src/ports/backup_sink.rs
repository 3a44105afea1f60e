use std::path::PathBuf;

use crate::core::error::EditorResult;

/// BackupSink defines the port for snapshotting the stored document before
/// it is overwritten
pub trait BackupSink: Send + Sync + 'static {
    /// Copy the currently stored document aside
    ///
    /// # Returns
    /// `Some(path)` of the new snapshot, or `None` when there was no stored
    /// document to copy
    fn backup(&self) -> EditorResult<Option<PathBuf>>;
}
