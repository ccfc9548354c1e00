//! Sled-backed index store

use gitrows_core::{Column, Filter, Row, Value, SCHEMA};
use sled::transaction::{ConflictableTransactionResult, TransactionError};
use sled::{Db, Transactional};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::envelope::Envelope;
use crate::error::StoreError;
use crate::source::{IndexStore, KeyedSource, ScanSource, ValueSource};

// ---------------------------------------------------------------------------
// Key layout
// ---------------------------------------------------------------------------
//
// locations:   assoc_key                      -> sealed index value
// col:<name>:  len(value) value assoc_key     -> ()
//
// assoc_key = len(repository) repository len(commit) commit path
//
// Lengths are u32 big-endian so that keys sort by their first component and a
// column value prefix never matches a longer value.

fn push_prefixed(out: &mut Vec<u8>, bytes: &[u8]) {
    out.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
    out.extend_from_slice(bytes);
}

/// Storage key of the (repository, commit, path) association
pub fn association_key(repository: &str, commit: &str, path: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(8 + repository.len() + commit.len() + path.len());
    push_prefixed(&mut key, repository.as_bytes());
    push_prefixed(&mut key, commit.as_bytes());
    key.extend_from_slice(path.as_bytes());
    key
}

/// Leading bytes shared by every association key of `repository`
fn repository_prefix(repository: &str) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(4 + repository.len());
    push_prefixed(&mut prefix, repository.as_bytes());
    prefix
}

/// Repository named by a `repository_id = ...` term
fn repository_term(filter: &Filter) -> Option<&str> {
    match filter {
        Filter::Eq(Column::RepositoryId, Value::Text(repository)) => Some(repository),
        _ => None,
    }
}

fn column_prefix(value: &Value) -> Vec<u8> {
    let bytes = value.index_bytes();
    let mut prefix = Vec::with_capacity(4 + bytes.len());
    push_prefixed(&mut prefix, &bytes);
    prefix
}

const META_ENVELOPE: &[u8] = b"envelope";
const META_BUILT_AT: &[u8] = b"built_at";

/// Main structure managing the index database
pub struct IndexDb {
    /// Association key -> sealed index value
    locations: sled::Tree,

    /// One secondary tree per row column, in schema order
    columns: Vec<sled::Tree>,

    /// `locations` followed by `columns`, written together by `put`
    write_set: Vec<sled::Tree>,

    /// Store-level metadata (envelope, build time)
    meta: sled::Tree,

    envelope: Envelope,

    db: Db,
}

impl IndexDb {
    /// Opens or creates an index at `path`.
    ///
    /// A new index records `envelope`; an existing one keeps the envelope it was
    /// created with.
    pub fn open<P: AsRef<Path>>(path: P, envelope: Envelope) -> Result<Self, StoreError> {
        let db = sled::open(path.as_ref())?;
        Self::from_db(db, envelope)
    }

    /// In-memory index removed on drop
    pub fn temporary(envelope: Envelope) -> Result<Self, StoreError> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db, envelope)
    }

    fn from_db(db: Db, envelope: Envelope) -> Result<Self, StoreError> {
        let locations = db.open_tree("locations")?;
        let columns = SCHEMA
            .iter()
            .map(|c| db.open_tree(format!("col:{}", c.name())))
            .collect::<Result<Vec<_>, _>>()?;
        let meta = db.open_tree("meta")?;

        let envelope = match meta.get(META_ENVELOPE)? {
            Some(bytes) => {
                let stored = Envelope::from_meta(&bytes)
                    .ok_or_else(|| StoreError::Corrupt("unknown envelope".to_string()))?;
                if stored != envelope {
                    log::debug!(
                        "Index was created with {} envelope, ignoring requested {}",
                        stored.name(),
                        envelope.name()
                    );
                }
                stored
            }
            None => {
                meta.insert(META_ENVELOPE, envelope.to_meta())?;
                envelope
            }
        };

        let write_set = std::iter::once(locations.clone())
            .chain(columns.iter().cloned())
            .collect();

        Ok(Self {
            locations,
            columns,
            write_set,
            meta,
            envelope,
            db,
        })
    }

    fn column(&self, column: Column) -> &sled::Tree {
        &self.columns[column.position()]
    }

    /// Association keys matching `filter`, in key order
    fn resolve(&self, filter: &Filter) -> Result<BTreeSet<Vec<u8>>, StoreError> {
        match filter {
            Filter::Eq(column, value) => {
                let prefix = column_prefix(value);
                let mut keys = BTreeSet::new();
                for item in self.column(*column).scan_prefix(&prefix) {
                    let (key, _) = item?;
                    keys.insert(key[prefix.len()..].to_vec());
                }
                Ok(keys)
            }
            Filter::And(a, b) => {
                // The repository is the leading component of every association key
                if let Some(repository) = repository_term(a) {
                    return self.resolve_in(repository, b);
                }
                if let Some(repository) = repository_term(b) {
                    return self.resolve_in(repository, a);
                }
                let left = self.resolve(a)?;
                if left.is_empty() {
                    return Ok(left);
                }
                let right = self.resolve(b)?;
                Ok(left.intersection(&right).cloned().collect())
            }
            Filter::Or(a, b) => {
                let mut left = self.resolve(a)?;
                left.extend(self.resolve(b)?);
                Ok(left)
            }
        }
    }

    /// Association keys of `repository` matching `filter`
    fn resolve_in(
        &self,
        repository: &str,
        filter: &Filter,
    ) -> Result<BTreeSet<Vec<u8>>, StoreError> {
        let prefix = repository_prefix(repository);
        let mut keys = self.resolve(filter)?;
        keys.retain(|key| key.starts_with(&prefix));
        Ok(keys)
    }

    /// Returns the number of stored associations
    pub fn entry_count(&self) -> usize {
        self.locations.len()
    }

    /// Checks if the index holds no associations
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Number of associations per repository, scanning only the repository column keys
    pub fn repository_counts(&self) -> Result<BTreeMap<String, usize>, StoreError> {
        let mut counts = BTreeMap::new();
        for item in self.column(Column::RepositoryId).iter().keys() {
            let key = item?;
            let len = key
                .get(..4)
                .and_then(|b| b.try_into().ok())
                .map(u32::from_be_bytes)
                .ok_or_else(|| StoreError::Corrupt("short repository key".to_string()))?
                as usize;
            let name = key
                .get(4..4 + len)
                .ok_or_else(|| StoreError::Corrupt("short repository key".to_string()))?;
            *counts
                .entry(String::from_utf8_lossy(name).into_owned())
                .or_insert(0) += 1;
        }
        Ok(counts)
    }

    /// Removes every association, keeping the envelope
    pub fn clear(&self) -> Result<(), StoreError> {
        self.locations.clear()?;
        for tree in &self.columns {
            tree.clear()?;
        }
        self.meta.remove(META_BUILT_AT)?;
        Ok(())
    }

    /// Records when the last build finished (Unix epoch seconds)
    pub fn set_built_at(&self, timestamp: u64) -> Result<(), StoreError> {
        self.meta.insert(META_BUILT_AT, &timestamp.to_le_bytes())?;
        Ok(())
    }

    pub fn built_at(&self) -> Result<Option<u64>, StoreError> {
        match self.meta.get(META_BUILT_AT)? {
            Some(bytes) => {
                let raw: [u8; 8] = bytes
                    .as_ref()
                    .try_into()
                    .map_err(|_| StoreError::Corrupt("built_at".to_string()))?;
                Ok(Some(u64::from_le_bytes(raw)))
            }
            None => Ok(None),
        }
    }

    /// Returns total on-disk size of the database in bytes
    pub fn size_on_disk(&self) -> Result<u64, StoreError> {
        Ok(self.db.size_on_disk()?)
    }
}

impl IndexStore for IndexDb {
    fn envelope(&self) -> Envelope {
        self.envelope
    }

    fn put(&self, row: &Row, value: &[u8]) -> Result<bool, StoreError> {
        let assoc = association_key(&row.repository_id, &row.commit_hash, &row.file_path);

        let column_keys: Vec<Vec<u8>> = SCHEMA
            .iter()
            .map(|column| {
                let mut key = column_prefix(&row.get(*column));
                key.extend_from_slice(&assoc);
                key
            })
            .collect();
        let marker: &[u8] = &[];

        // The association and its column entries land together or not at all
        let written = self.write_set.as_slice().transaction(
            |trees| -> ConflictableTransactionResult<bool, ()> {
                let Some((locations, columns)) = trees.split_first() else {
                    return Ok(false);
                };
                if locations.get(assoc.as_slice())?.is_some() {
                    return Ok(false);
                }
                locations.insert(assoc.as_slice(), value)?;
                for (tree, key) in columns.iter().zip(&column_keys) {
                    tree.insert(key.as_slice(), marker)?;
                }
                Ok(true)
            },
        );

        match written {
            Ok(inserted) => Ok(inserted),
            Err(TransactionError::Storage(e)) => Err(e.into()),
            Err(TransactionError::Abort(())) => {
                Err(StoreError::Corrupt("association write aborted".to_string()))
            }
        }
    }

    fn get(&self, filter: Option<&Filter>) -> Result<Box<dyn ValueSource + Send>, StoreError> {
        match filter {
            None => Ok(Box::new(ScanSource::new(self.locations.iter()))),
            Some(filter) => {
                if let Some(repository) = repository_term(filter) {
                    let prefix = repository_prefix(repository);
                    return Ok(Box::new(ScanSource::new(self.locations.scan_prefix(prefix))));
                }
                let keys = self.resolve(filter)?;
                log::debug!("Lookup {} matched {} associations", filter, keys.len());
                Ok(Box::new(KeyedSource::new(
                    keys.into_iter().collect(),
                    self.locations.clone(),
                )))
            }
        }
    }

    fn flush(&self) -> Result<(), StoreError> {
        self.db.flush()?;
        Ok(())
    }
}
