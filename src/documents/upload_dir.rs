//! Filesystem-backed document store.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use super::{DocumentStore, PurgeError, PurgeResult};

/// Flat upload directory. Only regular files directly inside it are managed.
#[derive(Debug, Clone)]
pub struct UploadDir {
    root: PathBuf,
}

impl UploadDir {
    /// Wraps `root`. The directory does not have to exist yet.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory being managed.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn io_err(path: &Path) -> impl FnOnce(io::Error) -> PurgeError + '_ {
        move |source| PurgeError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl DocumentStore for UploadDir {
    fn purge(&mut self) -> PurgeResult<usize> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(Self::io_err(&self.root)(e)),
        };

        let mut removed = 0;
        for entry in entries {
            let entry = entry.map_err(Self::io_err(&self.root))?;
            let path = entry.path();
            // Follows symlinks: a link to a file counts as a file, and only the link is unlinked.
            let meta = fs::metadata(&path).map_err(Self::io_err(&path))?;
            if meta.is_file() {
                fs::remove_file(&path).map_err(Self::io_err(&path))?;
                removed += 1;
            }
        }

        tracing::debug!(dir = %self.root.display(), removed, "purged uploaded documents");
        Ok(removed)
    }
}
