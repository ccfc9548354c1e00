//! Index build: repositories -> commits -> file changes -> index keys

use git2::Repository;
use gitrows_core::IndexKey;
use gitrows_db::IndexStore;
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::commits::{CommitInfo, CommitIter};
use crate::error::{Error, Position, Result};
use crate::formatting::{format_duration, format_number};
use crate::iter::describe;
use crate::locate::ObjectLocator;
use crate::pool::{RepositoryHandle, RepositoryPool};
use crate::stats::BuildStats;

/// What to do with a file whose blob has no physical location
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionPolicy {
    /// Abort the build
    #[default]
    Fatal,
    /// Log a warning and leave the file out of the index
    Skip,
}

/// Build configuration, readable from JSON
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    /// Walk every reference instead of only HEAD
    pub all_commits: bool,
    pub on_unresolved: ResolutionPolicy,
    /// Commits between progress log lines (0 disables them)
    pub progress_interval: usize,
    /// Commits between store flushes (0 flushes only at the end)
    pub flush_interval: usize,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            all_commits: false,
            on_unresolved: ResolutionPolicy::Fatal,
            progress_interval: 100,
            flush_interval: 1000,
        }
    }
}

/// Writes one index entry per (repository, commit, file change)
pub struct IndexBuilder<'a> {
    pool: &'a RepositoryPool,
    store: &'a dyn IndexStore,
    options: BuildOptions,
    interrupt: Option<Arc<AtomicBool>>,
}

impl<'a> IndexBuilder<'a> {
    pub fn new(pool: &'a RepositoryPool, store: &'a dyn IndexStore, options: BuildOptions) -> Self {
        Self {
            pool,
            store,
            options,
            interrupt: None,
        }
    }

    /// Stops the build at the next key once `flag` is set
    pub fn with_interrupt(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupt = Some(flag);
        self
    }

    /// Indexes every repository of the pool, in pool order
    pub fn build(&self) -> Result<BuildStats> {
        let start_time = Instant::now();
        let mut stats = BuildStats::default();

        log::info!(
            "Indexing {} repositories into {} envelope",
            self.pool.len(),
            self.store.envelope().name()
        );

        for handle in self.pool.repositories() {
            let result = self.build_repository(handle, &mut stats);
            // Keep what was written so far, also when the build stops early
            self.store.flush()?;
            result?;
            stats.repositories += 1;
        }

        stats.elapsed = start_time.elapsed();
        log::info!("Index build finished: {}", stats);
        Ok(stats)
    }

    fn build_repository(&self, handle: &RepositoryHandle, stats: &mut BuildStats) -> Result<()> {
        let repo = handle.open()?;
        let locator = ObjectLocator::load(&repo);
        let mut commits = CommitIter::new(&repo, handle.id(), self.options.all_commits)?;
        let written_before = stats.keys_written;

        log::info!(
            "Repository '{}': {} packed objects",
            handle.id(),
            format_number(locator.packed_len())
        );

        while let Some(commit) = commits.next_commit(&repo)? {
            self.build_commit(&repo, handle.id(), &commit, &locator, stats)?;
            stats.commits += 1;

            let interval = self.options.progress_interval;
            if interval > 0 && stats.commits % interval == 0 {
                log::info!(
                    "Progress: {} commits | {} keys written ({} duplicates, {} skipped)",
                    format_number(stats.commits),
                    format_number(stats.keys_written),
                    format_number(stats.duplicates),
                    format_number(stats.skipped)
                );
            }

            let flush = self.options.flush_interval;
            if flush > 0 && stats.commits % flush == 0 {
                let flush_start = Instant::now();
                self.store.flush()?;
                log::debug!(
                    "Store flushed after {} commits ({})",
                    stats.commits,
                    format_duration(flush_start.elapsed())
                );
            }
        }

        log::info!(
            "Repository '{}' done: {} keys written",
            handle.id(),
            format_number(stats.keys_written - written_before)
        );
        Ok(())
    }

    fn build_commit(
        &self,
        repo: &Repository,
        repository: &str,
        commit: &CommitInfo,
        locator: &ObjectLocator,
        stats: &mut BuildStats,
    ) -> Result<()> {
        let commit_hash = commit.id.to_string();
        let tree_hash = commit.tree.to_string();

        for change in commit.file_changes(repo, repository)? {
            let at = || Position::file(repository, &commit_hash, &change.path);

            if self.is_interrupted() {
                log::warn!("Build interrupted at {}", at());
                return Err(Error::Interrupted(at()));
            }

            let blob_hash = change.blob.to_string();
            let Some(location) = locator.locate(change.blob) else {
                match self.options.on_unresolved {
                    ResolutionPolicy::Fatal => {
                        return Err(Error::ObjectResolution {
                            hash: blob_hash,
                            at: at(),
                        })
                    }
                    ResolutionPolicy::Skip => {
                        log::warn!("Skipping {}: object {} not found", at(), blob_hash);
                        stats.skipped += 1;
                        continue;
                    }
                }
            };

            let key = IndexKey {
                repository: repository.to_string(),
                packfile: location.packfile,
                offset: location.offset,
                hash: blob_hash,
                name: change.path.clone(),
                mode: change.mode,
                tree: tree_hash.clone(),
                commit: commit_hash.clone(),
            };
            let value = key
                .encode()
                .and_then(|bytes| self.store.envelope().seal(&bytes))
                .map_err(|source| Error::Encoding { at: at(), source })?;

            let row = key.to_row();
            if self.store.put(&row, &value)? {
                stats.keys_written += 1;
            } else {
                log::debug!("Association {} already indexed", describe(&row));
                stats.duplicates += 1;
            }
        }
        Ok(())
    }

    fn is_interrupted(&self) -> bool {
        self.interrupt
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}
