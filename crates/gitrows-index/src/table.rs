//! The commit-files relation and its partitions
//!
//! A table can be scanned partition by partition either by walking repository
//! history ([`CommitFilesTable`]) or by reading index values
//! ([`IndexedCommitFilesTable`]). Both produce the same rows.

use gitrows_core::{Column, Filter, SCHEMA};
use gitrows_db::IndexStore;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::iter::{IndexRowIter, PartitionIter, RowIter};
use crate::pool::RepositoryPool;

/// Options for history walks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ScanOptions {
    /// Walk every reference instead of only HEAD
    pub all_commits: bool,
}

/// A unit of parallel scanning: one repository
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Partition(String);

impl Partition {
    pub fn new(repository: &str) -> Self {
        Self(repository.to_string())
    }

    pub fn repository(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Something that can be split into partitions and scanned one partition at a time
pub trait Scannable {
    type Iter: RowIter + Send;

    fn partitions(&self) -> Vec<Partition>;

    fn scan(&self, partition: &Partition) -> Result<Self::Iter>;

    fn schema(&self) -> &'static [Column] {
        &SCHEMA
    }
}

/// Index values a table scan may read instead of walking history
#[derive(Clone)]
pub struct IndexLookup {
    store: Arc<dyn IndexStore>,
    filter: Option<Filter>,
}

impl IndexLookup {
    /// Every indexed association
    pub fn all(store: Arc<dyn IndexStore>) -> Self {
        Self {
            store,
            filter: None,
        }
    }

    /// Only associations matching `filter`, whose terms must fit the row schema
    pub fn matching(store: Arc<dyn IndexStore>, filter: Filter) -> Result<Self> {
        filter.validate()?;
        Ok(Self {
            store,
            filter: Some(filter),
        })
    }

    pub fn filter(&self) -> Option<&Filter> {
        self.filter.as_ref()
    }

    /// Rows of one partition, with the lookup predicate applied
    pub fn values(&self, partition: &Partition) -> Result<IndexRowIter> {
        let scope = Filter::Eq(Column::RepositoryId, partition.repository().into());
        let filter = match &self.filter {
            Some(f) => scope.and(f.clone()),
            None => scope,
        };
        let source = self.store.get(Some(&filter))?;
        Ok(IndexRowIter::new(source, self.store.envelope()))
    }
}

/// Something whose scans can be served from an index
pub trait IndexLookupable {
    type Indexed: Scannable;

    fn with_index_lookup(&self, lookup: IndexLookup) -> Self::Indexed;
}

/// Commit-files relation served by walking repository history
#[derive(Clone)]
pub struct CommitFilesTable {
    pool: Arc<RepositoryPool>,
    options: ScanOptions,
}

impl CommitFilesTable {
    pub fn new(pool: Arc<RepositoryPool>, options: ScanOptions) -> Self {
        Self { pool, options }
    }

    pub fn pool(&self) -> &RepositoryPool {
        &self.pool
    }
}

impl Scannable for CommitFilesTable {
    type Iter = PartitionIter;

    fn partitions(&self) -> Vec<Partition> {
        self.pool
            .repositories()
            .map(|r| Partition::new(r.id()))
            .collect()
    }

    fn scan(&self, partition: &Partition) -> Result<PartitionIter> {
        let handle = self.pool.by_name(partition.repository())?;
        PartitionIter::new(handle, &self.options)
    }
}

impl IndexLookupable for CommitFilesTable {
    type Indexed = IndexedCommitFilesTable;

    fn with_index_lookup(&self, lookup: IndexLookup) -> IndexedCommitFilesTable {
        IndexedCommitFilesTable {
            pool: Arc::clone(&self.pool),
            lookup,
        }
    }
}

/// Commit-files relation served from index values
#[derive(Clone)]
pub struct IndexedCommitFilesTable {
    pool: Arc<RepositoryPool>,
    lookup: IndexLookup,
}

impl IndexedCommitFilesTable {
    pub fn lookup(&self) -> &IndexLookup {
        &self.lookup
    }
}

impl Scannable for IndexedCommitFilesTable {
    type Iter = IndexRowIter;

    fn partitions(&self) -> Vec<Partition> {
        self.pool
            .repositories()
            .map(|r| Partition::new(r.id()))
            .collect()
    }

    fn scan(&self, partition: &Partition) -> Result<IndexRowIter> {
        self.pool.by_name(partition.repository())?;
        self.lookup.values(partition)
    }
}
