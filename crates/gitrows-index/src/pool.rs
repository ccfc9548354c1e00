//! Named set of repositories
//!
//! The pool stores paths, not open repositories: `git2::Repository` is not
//! `Sync`, so every scan or build opens its own handle and drops it when done.

use git2::Repository;
use std::path::{Path, PathBuf};

use crate::error::{AtPosition, Error, Position, Result};

/// One registered repository
#[derive(Debug, Clone)]
pub struct RepositoryHandle {
    id: String,
    path: PathBuf,
}

impl RepositoryHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Opens a fresh handle to the repository
    pub fn open(&self) -> Result<Repository> {
        Repository::open(&self.path).at(|| Position::repository(&self.id))
    }
}

/// Repositories known to the system, in registration order
#[derive(Debug, Clone, Default)]
pub struct RepositoryPool {
    repositories: Vec<RepositoryHandle>,
}

impl RepositoryPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the repository at `path` under `id`
    pub fn add<P: AsRef<Path>>(&mut self, id: &str, path: P) -> Result<()> {
        if self.repositories.iter().any(|r| r.id == id) {
            return Err(Error::DuplicateRepository(id.to_string()));
        }

        let handle = RepositoryHandle {
            id: id.to_string(),
            path: path.as_ref().to_path_buf(),
        };
        // Fail early on paths that are not repositories
        handle.open()?;

        log::debug!("Registered repository '{}' at {:?}", id, handle.path);
        self.repositories.push(handle);
        Ok(())
    }

    /// Builds a pool from every git repository directly below `dir`.
    ///
    /// Ids are directory names with a trailing `.git` removed; entries that are
    /// not repositories are ignored. Repositories are registered in id order.
    pub fn discover<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let mut found = Vec::new();
        for entry in std::fs::read_dir(dir.as_ref())? {
            let path = entry?.path();
            if !path.is_dir() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                log::warn!("Skipping non UTF-8 directory name {:?}", path);
                continue;
            };
            let id = name.strip_suffix(".git").unwrap_or(name).to_string();
            if Repository::open(&path).is_ok() {
                found.push((id, path));
            } else {
                log::debug!("Skipping {:?}: not a git repository", path);
            }
        }
        found.sort();

        let mut pool = Self::new();
        for (id, path) in found {
            pool.add(&id, path)?;
        }
        log::info!(
            "Discovered {} repositories under {:?}",
            pool.len(),
            dir.as_ref()
        );
        Ok(pool)
    }

    /// Restartable sequence of the registered repositories
    pub fn repositories(&self) -> impl Iterator<Item = &RepositoryHandle> + '_ {
        self.repositories.iter()
    }

    pub fn by_name(&self, id: &str) -> Result<&RepositoryHandle> {
        self.repositories
            .iter()
            .find(|r| r.id == id)
            .ok_or_else(|| Error::UnknownRepository(id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.repositories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty()
    }
}
