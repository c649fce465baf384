//! File-listing capability used by discovery.
//!
//! Resolution only needs three questions answered: "is this a directory", "which files sit
//! directly in it", and "which directories sit directly in it". [`OsListing`] answers them from
//! the real filesystem; [`MemoryListing`] from an in-memory set of paths, so discovery logic can
//! be exercised without touching disk.

use crate::error::{Error, Result};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

pub trait FileListing {
    fn is_dir(&self, path: &Path) -> bool;

    /// Regular files directly inside `dir`, sorted by path.
    fn files_in(&self, dir: &Path) -> Result<Vec<PathBuf>>;

    /// Directories directly inside `dir`, sorted by path.
    fn dirs_in(&self, dir: &Path) -> Result<Vec<PathBuf>>;

    /// Every regular file below `root`, recursively, sorted by path.
    fn walk_files(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let mut out = Vec::new();
        let mut stack = vec![root.to_path_buf()];
        while let Some(dir) = stack.pop() {
            out.extend(self.files_in(&dir)?);
            stack.extend(self.dirs_in(&dir)?);
        }
        out.sort();
        Ok(out)
    }
}

impl<T: FileListing + ?Sized> FileListing for &T {
    fn is_dir(&self, path: &Path) -> bool {
        (**self).is_dir(path)
    }

    fn files_in(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        (**self).files_in(dir)
    }

    fn dirs_in(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        (**self).dirs_in(dir)
    }
}

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsListing;

impl OsListing {
    fn entries(dir: &Path, want_dirs: bool) -> Result<Vec<PathBuf>> {
        let entries = std::fs::read_dir(dir).map_err(|source| Error::ListDir {
            path: dir.to_path_buf(),
            source,
        })?;
        let mut out = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| Error::ListDir {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            // Follows symlinks, so a linked fixture file counts as a file.
            let keep = if want_dirs {
                path.is_dir()
            } else {
                path.is_file()
            };
            if keep {
                out.push(path);
            }
        }
        out.sort();
        Ok(out)
    }
}

impl FileListing for OsListing {
    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn files_in(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        Self::entries(dir, false)
    }

    fn dirs_in(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        Self::entries(dir, true)
    }
}

/// An in-memory tree made of file paths; directories exist implicitly as ancestors of files.
#[derive(Debug, Clone, Default)]
pub struct MemoryListing {
    files: BTreeSet<PathBuf>,
}

impl MemoryListing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_files<I, P>(files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut listing = Self::new();
        for f in files {
            listing.add_file(f);
        }
        listing
    }

    pub fn add_file(&mut self, path: impl Into<PathBuf>) {
        self.files.insert(path.into());
    }
}

impl FileListing for MemoryListing {
    fn is_dir(&self, path: &Path) -> bool {
        self.files
            .iter()
            .any(|f| f != path && f.starts_with(path))
    }

    fn files_in(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        Ok(self
            .files
            .iter()
            .filter(|f| f.parent() == Some(dir))
            .cloned()
            .collect())
    }

    fn dirs_in(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut dirs = BTreeSet::new();
        for f in &self.files {
            let Ok(rel) = f.strip_prefix(dir) else {
                continue;
            };
            let mut parts = rel.components();
            let (Some(first), Some(_)) = (parts.next(), parts.next()) else {
                continue;
            };
            dirs.insert(dir.join(first));
        }
        Ok(dirs.into_iter().collect())
    }
}
