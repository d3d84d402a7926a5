//! All-or-nothing artifact writes.
//!
//! Contents go to a temporary file in the destination directory which is
//! renamed over the target once fully written. A failed write leaves no
//! partial file behind. Groups of files are staged together and either all
//! land or none do.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::CodegenError;

/// Writes artifacts below a root directory.
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    root: PathBuf,
}

impl ArtifactWriter {
    /// Creates a writer rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Atomically writes `contents` to `relative` below the root, creating
    /// parent directories as needed.
    ///
    /// # Errors
    /// Returns `CodegenError::Write` naming the destination on any IO
    /// failure.
    pub fn write(&self, relative: &Path, contents: &[u8]) -> Result<PathBuf, CodegenError> {
        let (path, tmp) = self.stage(relative, contents)?;
        tmp.persist(&path)
            .map_err(|e| CodegenError::write(&path, e.error))?;

        debug!(path = %path.display(), bytes = contents.len(), "wrote artifact");
        Ok(path)
    }

    /// Writes several files as one unit. Every file is staged before any is
    /// renamed into place; if a rename fails, the files already placed by
    /// this call are removed again.
    ///
    /// # Errors
    /// Returns the `CodegenError::Write` of the first file that failed.
    pub fn write_all(&self, files: &[(&Path, &[u8])]) -> Result<Vec<PathBuf>, CodegenError> {
        let staged = files
            .iter()
            .map(|(relative, contents)| self.stage(relative, contents))
            .collect::<Result<Vec<_>, _>>()?;

        let mut placed: Vec<PathBuf> = Vec::with_capacity(staged.len());
        for (path, tmp) in staged {
            if let Err(e) = tmp.persist(&path) {
                for done in &placed {
                    self.discard(done);
                }
                return Err(CodegenError::write(&path, e.error));
            }
            debug!(path = %path.display(), "wrote artifact");
            placed.push(path);
        }
        Ok(placed)
    }

    /// Removes a file placed by this writer, logging instead of failing.
    fn discard(&self, path: &Path) {
        match fs::remove_file(path) {
            Ok(()) => debug!(path = %path.display(), "discarded artifact"),
            Err(e) => warn!(path = %path.display(), reason = %e, "failed to discard artifact"),
        }
    }

    fn stage(&self, relative: &Path, contents: &[u8]) -> Result<(PathBuf, NamedTempFile), CodegenError> {
        let path = self.root.join(relative);
        let dir = path
            .parent()
            .map_or_else(|| self.root.clone(), Path::to_path_buf);
        fs::create_dir_all(&dir).map_err(|e| CodegenError::write(&path, e))?;

        let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| CodegenError::write(&path, e))?;
        tmp.write_all(contents)
            .and_then(|()| tmp.flush())
            .map_err(|e| CodegenError::write(&path, e))?;
        Ok((path, tmp))
    }
}
