//! Row iterators
//!
//! Every iterator follows the same pull protocol: `next_row` returns
//! `Ok(Some(row))`, `Ok(None)` once exhausted (and on every call after that),
//! or an error that ends the pass. `close` releases what the iterator holds
//! and may be called any number of times, from any state.

use git2::Repository;
use gitrows_core::{Filter, IndexKey, Row};
use gitrows_db::{Envelope, ValueSource};

use crate::commits::{CommitInfo, CommitIter, FileChanges};
use crate::error::Result;
use crate::pool::RepositoryHandle;
use crate::table::ScanOptions;

pub trait RowIter {
    fn next_row(&mut self) -> Result<Option<Row>>;

    fn close(&mut self) -> Result<()>;
}

impl<I: RowIter + ?Sized> RowIter for Box<I> {
    fn next_row(&mut self) -> Result<Option<Row>> {
        (**self).next_row()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

/// Pulls every row out of `iter` and closes it, also when pulling fails
pub fn collect_rows<I: RowIter>(mut iter: I) -> Result<Vec<Row>> {
    let mut rows = Vec::new();
    let pulled = loop {
        match iter.next_row() {
            Ok(Some(row)) => rows.push(row),
            Ok(None) => break Ok(()),
            Err(e) => break Err(e),
        }
    };
    let closed = iter.close();
    pulled?;
    closed?;
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Cold path
// ---------------------------------------------------------------------------

struct OpenWalk {
    repo: Repository,
    commits: CommitIter,
    commit: Option<CommitInfo>,
    changes: FileChanges,
}

/// Rows of one repository, produced by walking its history
pub struct PartitionIter {
    repository: String,
    walk: Option<OpenWalk>,
}

impl PartitionIter {
    pub fn new(handle: &RepositoryHandle, options: &ScanOptions) -> Result<Self> {
        let repo = handle.open()?;
        let commits = CommitIter::new(&repo, handle.id(), options.all_commits)?;
        Ok(Self {
            repository: handle.id().to_string(),
            walk: Some(OpenWalk {
                repo,
                commits,
                commit: None,
                changes: Vec::new().into_iter(),
            }),
        })
    }

    fn advance(&mut self) -> Result<Option<Row>> {
        let Some(walk) = self.walk.as_mut() else {
            return Ok(None);
        };

        loop {
            if let (Some(commit), Some(change)) = (walk.commit.as_ref(), walk.changes.next()) {
                return Ok(Some(Row {
                    repository_id: self.repository.clone(),
                    commit_hash: commit.id.to_string(),
                    file_path: change.path,
                    blob_hash: change.blob.to_string(),
                    tree_hash: commit.tree.to_string(),
                    file_mode: change.mode,
                }));
            }

            match walk.commits.next_commit(&walk.repo)? {
                Some(commit) => {
                    walk.changes = commit.file_changes(&walk.repo, &self.repository)?;
                    walk.commit = Some(commit);
                }
                None => {
                    self.walk = None;
                    return Ok(None);
                }
            }
        }
    }
}

impl RowIter for PartitionIter {
    fn next_row(&mut self) -> Result<Option<Row>> {
        let next = self.advance();
        if next.is_err() {
            // Drop the repository before the error leaves the iterator
            self.walk = None;
        }
        next
    }

    fn close(&mut self) -> Result<()> {
        self.walk = None;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Index path
// ---------------------------------------------------------------------------

/// Rows decoded from index values, without touching any repository
pub struct IndexRowIter {
    source: Option<Box<dyn ValueSource + Send>>,
    envelope: Envelope,
    exhausted: bool,
}

impl IndexRowIter {
    pub fn new(source: Box<dyn ValueSource + Send>, envelope: Envelope) -> Self {
        Self {
            source: Some(source),
            envelope,
            exhausted: false,
        }
    }

    fn decode(&self, value: &[u8]) -> Result<Row> {
        let payload = self.envelope.open(value)?;
        let key = IndexKey::decode(&payload)?;
        log::trace!("Decoded {}", key);
        Ok(key.into_row())
    }
}

impl RowIter for IndexRowIter {
    fn next_row(&mut self) -> Result<Option<Row>> {
        if self.exhausted {
            return Ok(None);
        }
        let Some(source) = self.source.as_mut() else {
            return Ok(None);
        };

        let next = match source.next_value() {
            Ok(Some(value)) => self.decode(&value).map(Some),
            Ok(None) => Ok(None),
            Err(e) => Err(e.into()),
        };
        if !matches!(next, Ok(Some(_))) {
            self.exhausted = true;
        }
        next
    }

    fn close(&mut self) -> Result<()> {
        if let Some(mut source) = self.source.take() {
            source.close()?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Adapters
// ---------------------------------------------------------------------------

/// Keeps only rows matching a predicate
pub struct FilterIter<I> {
    inner: I,
    filter: Filter,
}

impl<I: RowIter> FilterIter<I> {
    pub fn new(inner: I, filter: Filter) -> Self {
        Self { inner, filter }
    }
}

impl<I: RowIter> RowIter for FilterIter<I> {
    fn next_row(&mut self) -> Result<Option<Row>> {
        while let Some(row) = self.inner.next_row()? {
            if self.filter.matches(&row) {
                return Ok(Some(row));
            }
        }
        Ok(None)
    }

    fn close(&mut self) -> Result<()> {
        self.inner.close()
    }
}

/// Stops after `limit` rows and closes the wrapped iterator
pub struct LimitIter<I> {
    inner: I,
    remaining: usize,
}

impl<I: RowIter> LimitIter<I> {
    pub fn new(inner: I, limit: usize) -> Self {
        Self {
            inner,
            remaining: limit,
        }
    }
}

impl<I: RowIter> RowIter for LimitIter<I> {
    fn next_row(&mut self) -> Result<Option<Row>> {
        if self.remaining == 0 {
            self.inner.close()?;
            return Ok(None);
        }
        match self.inner.next_row()? {
            Some(row) => {
                self.remaining -= 1;
                Ok(Some(row))
            }
            None => {
                self.remaining = 0;
                Ok(None)
            }
        }
    }

    fn close(&mut self) -> Result<()> {
        self.inner.close()
    }
}

/// Short form of a row for debug output
pub(crate) fn describe(row: &Row) -> String {
    let commit = row.commit_hash.get(..8).unwrap_or(&row.commit_hash);
    format!("{}@{}:{}", row.repository_id, commit, row.file_path)
}
