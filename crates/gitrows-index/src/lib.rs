//! gitrows Index - commit-files rows from git history and from the index
//!
//! This crate is responsible for:
//! - Walking the history of every repository in a pool
//! - Turning each commit's file changes into rows
//! - Building index keys that record where each blob is stored
//! - Serving the same rows back from the index without walking history

pub mod builder;
pub mod commits;
pub mod error;
pub mod formatting;
pub mod iter;
pub mod locate;
pub mod pool;
pub mod stats;
pub mod table;

pub use builder::{BuildOptions, IndexBuilder, ResolutionPolicy};
pub use commits::{mode_bits, CommitInfo, CommitIter, FileChange, FileChanges};
pub use error::{Error, Position, Result};
pub use iter::{collect_rows, FilterIter, IndexRowIter, LimitIter, PartitionIter, RowIter};
pub use locate::{Location, ObjectLocator};
pub use pool::{RepositoryHandle, RepositoryPool};
pub use stats::BuildStats;
pub use table::{
    CommitFilesTable, IndexLookup, IndexLookupable, IndexedCommitFilesTable, Partition,
    Scannable, ScanOptions,
};
