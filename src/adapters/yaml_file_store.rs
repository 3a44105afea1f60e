use std::{
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;

use crate::{
    core::{
        document::RoutingDocument,
        error::{EditorError, EditorResult},
    },
    ports::document_store::DocumentStore,
};

/// Document store adapter keeping the routing document in a YAML file
#[derive(Debug, Clone)]
pub struct YamlFileStore {
    path: PathBuf,
}

impl YamlFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn directory(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    /// Write `text` to a sibling temp file and rename it over the target.
    ///
    /// The document itself is only touched by the final rename. When the
    /// directory refuses the temp file or the rename, the refusal is handed
    /// back instead of an error so the caller may write in place; failures
    /// while filling the temp file are errors.
    fn replace_atomically(&self, text: &str) -> EditorResult<Replace> {
        let dir = self.directory();
        let mut tmp = match NamedTempFile::new_in(dir) {
            Ok(tmp) => tmp,
            Err(e) if e.kind() == ErrorKind::PermissionDenied => return Ok(Replace::Refused(e)),
            Err(e) => return Err(EditorError::io("create a temp file in", dir, e)),
        };

        tmp.write_all(text.as_bytes())
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| EditorError::io("write", tmp.path().to_path_buf(), e))?;

        // Temp files are created owner-only; keep the mode the proxy can read.
        match fs::metadata(&self.path) {
            Ok(metadata) => {
                tmp.as_file()
                    .set_permissions(metadata.permissions())
                    .map_err(|e| EditorError::io("set permissions on", tmp.path().to_path_buf(), e))?;
            }
            Err(e) if e.kind() == ErrorKind::NotFound => set_default_mode(tmp.as_file())
                .map_err(|e| EditorError::io("set permissions on", tmp.path().to_path_buf(), e))?,
            Err(e) => return Err(EditorError::io("inspect", &self.path, e)),
        }

        match tmp.persist(&self.path) {
            Ok(_) => Ok(Replace::Done),
            Err(e) => Ok(Replace::Refused(e.error)),
        }
    }
}

enum Replace {
    Done,
    /// The directory would not take a temp file or a rename
    Refused(std::io::Error),
}

#[cfg(unix)]
fn set_default_mode(file: &fs::File) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn set_default_mode(_file: &fs::File) -> std::io::Result<()> {
    Ok(())
}

impl DocumentStore for YamlFileStore {
    fn load(&self) -> EditorResult<RoutingDocument> {
        match fs::read_to_string(&self.path) {
            Ok(text) => RoutingDocument::from_yaml_str(&text),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(
                    "Routing document {} not found, starting empty",
                    self.path.display()
                );
                Ok(RoutingDocument::default())
            }
            Err(e) => Err(EditorError::io("read", &self.path, e)),
        }
    }

    fn save(&self, doc: &RoutingDocument) -> EditorResult<()> {
        let text = doc.to_yaml_string()?;
        let dir = self.directory();
        fs::create_dir_all(dir).map_err(|e| EditorError::io("create directory", dir, e))?;

        if let Replace::Refused(e) = self.replace_atomically(&text)? {
            // A file bind-mounted into a container cannot be renamed over.
            tracing::warn!(
                "Atomic replace of {} failed ({}), writing in place",
                self.path.display(),
                e
            );
            fs::write(&self.path, text.as_bytes())
                .map_err(|e| EditorError::io("write", &self.path, e))?;
        }

        tracing::debug!("Saved routing document to {}", self.path.display());
        Ok(())
    }
}
