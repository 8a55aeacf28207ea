//! Per-invocation scratch directories
//!
//! Callers that render intermediate source packages before a merge can put
//! them in a [`ScratchDir`]. Every instance is a fresh, uniquely named
//! directory that is removed again when the value is dropped, whichever way
//! the surrounding code exits.

use std::path::{Path, PathBuf};

use log::{debug, warn};
use tempfile::TempDir;

use crate::error::{Error, Result};

/// Prefix of scratch directory names
pub const SCRATCH_PREFIX: &str = "threemf-merge-";

/// A uniquely named directory removed on drop
#[derive(Debug)]
pub struct ScratchDir {
    dir: Option<TempDir>,
    path: PathBuf,
}

impl ScratchDir {
    /// Create a scratch directory under the system temporary directory
    pub fn new() -> Result<Self> {
        Self::wrap(
            tempfile::Builder::new()
                .prefix(SCRATCH_PREFIX)
                .tempdir()?,
        )
    }

    /// Create a scratch directory under `parent`
    ///
    /// Useful when the scratch files should live on the same filesystem as
    /// the merge output.
    pub fn new_in(parent: &Path) -> Result<Self> {
        Self::wrap(
            tempfile::Builder::new()
                .prefix(SCRATCH_PREFIX)
                .tempdir_in(parent)?,
        )
    }

    fn wrap(dir: TempDir) -> Result<Self> {
        let path = dir.path().to_path_buf();
        debug!("Created scratch directory {}", path.display());
        Ok(Self {
            dir: Some(dir),
            path,
        })
    }

    /// Directory path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of `name` inside the directory
    ///
    /// `name` must be a plain file name; separators and `..` are rejected so
    /// nothing can be placed outside the directory.
    pub fn file(&self, name: &str) -> Result<PathBuf> {
        let plain = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['/', '\\']);
        if !plain {
            return Err(Error::invalid_config(
                "scratch file",
                &format!("'{}' is not a plain file name", name),
            ));
        }
        Ok(self.path.join(name))
    }

    /// Remove the directory now and report failures
    pub fn close(mut self) -> Result<()> {
        match self.dir.take() {
            Some(dir) => dir.close().map_err(Error::Io),
            None => Ok(()),
        }
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take()
            && let Err(e) = dir.close()
        {
            warn!(
                "Could not remove scratch directory {}: {}",
                self.path.display(),
                e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_directories_are_unique() {
        let a = ScratchDir::new().unwrap();
        let b = ScratchDir::new().unwrap();
        assert_ne!(a.path(), b.path());
        assert!(a.path().is_dir());
        assert!(
            a.path()
                .file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with(SCRATCH_PREFIX)
        );
    }

    #[test]
    fn test_removed_on_drop() {
        let path = {
            let scratch = ScratchDir::new().unwrap();
            fs::write(scratch.file("part.3mf").unwrap(), b"data").unwrap();
            scratch.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_removed_on_early_return() {
        fn fails(seen: &mut Option<PathBuf>) -> Result<()> {
            let scratch = ScratchDir::new()?;
            *seen = Some(scratch.path().to_path_buf());
            Err(Error::InvalidModel("render failed".to_string()))
        }

        let mut seen = None;
        assert!(fails(&mut seen).is_err());
        assert!(!seen.unwrap().exists());
    }

    #[test]
    fn test_close_and_new_in() {
        let parent = tempfile::tempdir().unwrap();
        let scratch = ScratchDir::new_in(parent.path()).unwrap();
        let path = scratch.path().to_path_buf();
        assert_eq!(path.parent(), Some(parent.path()));
        scratch.close().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_file_rejects_paths() {
        let scratch = ScratchDir::new().unwrap();
        assert!(scratch.file("a.3mf").is_ok());
        for bad in ["", "..", "../x", "a/b", "a\\b"] {
            assert!(matches!(
                scratch.file(bad),
                Err(Error::InvalidConfig(_))
            ));
        }
    }
}
