//! Commit-file index key and its binary layout

use bincode::Options;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{DecodingError, EncodingError};
use crate::hash::{hash_hex, parse_hash, HASH_LEN};
use crate::row::Row;

/// Location and identity of one file association
///
/// Besides the logical fields (repository, commit, path, blob) the key records
/// where the blob physically lives: the pack that holds it and the byte offset
/// inside that pack. Loose objects carry the zero hash as `packfile` and 0 as
/// `offset`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndexKey {
    pub repository: String,
    pub packfile: String,
    pub offset: u64,
    pub hash: String,
    pub name: String,
    pub mode: u32,
    pub tree: String,
    pub commit: String,
}

// ---------------------------------------------------------------------------
// Binary layout
// ---------------------------------------------------------------------------

/// Wire form of [`IndexKey`]. Field order is the on-disk order: strings are
/// prefixed with a u64 length, hashes are 20 raw bytes, integers are fixed
/// width little-endian.
#[derive(Serialize, Deserialize)]
struct StoredKey {
    repository: String,
    packfile: [u8; HASH_LEN],
    offset: u64,
    hash: [u8; HASH_LEN],
    name: String,
    mode: u32,
    tree: [u8; HASH_LEN],
    commit: [u8; HASH_LEN],
}

fn options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
        .reject_trailing_bytes()
}

impl IndexKey {
    /// Serializes the key into its self-delimiting binary form
    pub fn encode(&self) -> Result<Vec<u8>, EncodingError> {
        let stored = StoredKey {
            repository: self.repository.clone(),
            packfile: parse_hash("packfile", &self.packfile)?,
            offset: self.offset,
            hash: parse_hash("hash", &self.hash)?,
            name: self.name.clone(),
            mode: self.mode,
            tree: parse_hash("tree", &self.tree)?,
            commit: parse_hash("commit", &self.commit)?,
        };

        options()
            .serialize(&stored)
            .map_err(|e| EncodingError::Serialize(e.to_string()))
    }

    /// Reads a key back from bytes produced by [`IndexKey::encode`]
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodingError> {
        let stored: StoredKey = options().deserialize(bytes).map_err(|e| match *e {
            bincode::ErrorKind::Io(ref io) if io.kind() == std::io::ErrorKind::UnexpectedEof => {
                DecodingError::Truncated
            }
            other => DecodingError::Malformed(other.to_string()),
        })?;

        Ok(Self {
            repository: stored.repository,
            packfile: hash_hex(&stored.packfile),
            offset: stored.offset,
            hash: hash_hex(&stored.hash),
            name: stored.name,
            mode: stored.mode,
            tree: hash_hex(&stored.tree),
            commit: hash_hex(&stored.commit),
        })
    }

    /// Result row for this association. Only the key's own fields are used.
    pub fn to_row(&self) -> Row {
        Row {
            repository_id: self.repository.clone(),
            commit_hash: self.commit.clone(),
            file_path: self.name.clone(),
            blob_hash: self.hash.clone(),
            tree_hash: self.tree.clone(),
            file_mode: self.mode,
        }
    }

    /// Consumes the key into its result row
    pub fn into_row(self) -> Row {
        Row {
            repository_id: self.repository,
            commit_hash: self.commit,
            file_path: self.name,
            blob_hash: self.hash,
            tree_hash: self.tree,
            file_mode: self.mode,
        }
    }
}

fn short(hash: &str) -> &str {
    hash.get(..8).unwrap_or(hash)
}

impl fmt::Display for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{} {} -> pack {} +{}",
            self.repository,
            short(&self.commit),
            self.name,
            short(&self.packfile),
            self.offset
        )
    }
}
