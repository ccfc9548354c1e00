//! gitrows DB - persistence for the commit-files index
//!
//! This crate stores sealed index values in a local Sled database, one entry
//! per (repository, commit, path) association, plus one secondary tree per row
//! column so that equality predicates can be answered without a full scan.

mod database;
mod envelope;
mod error;
mod source;

pub use database::{association_key, IndexDb};
pub use envelope::{Envelope, DEFAULT_LEVEL};
pub use error::StoreError;
pub use source::{IndexStore, ValueSource};

#[cfg(test)]
mod tests {
    use super::*;
    use gitrows_core::{Column, Filter, Row};

    fn row(commit: &str, path: &str) -> Row {
        Row {
            repository_id: "repo".to_string(),
            commit_hash: commit.repeat(40),
            file_path: path.to_string(),
            blob_hash: "b".repeat(40),
            tree_hash: "c".repeat(40),
            file_mode: 0o100644,
        }
    }

    fn drain(mut source: Box<dyn ValueSource + Send>) -> Vec<Vec<u8>> {
        let mut out = Vec::new();
        while let Some(v) = source.next_value().unwrap() {
            out.push(v);
        }
        source.close().unwrap();
        out
    }

    #[test]
    fn test_put_and_scan() -> Result<(), StoreError> {
        let db = IndexDb::temporary(Envelope::Plain)?;
        assert!(db.put(&row("1", "a"), b"one")?);
        assert!(db.put(&row("2", "a"), b"two")?);

        let values = drain(db.get(None)?);
        assert_eq!(values, vec![b"one".to_vec(), b"two".to_vec()]);
        Ok(())
    }

    #[test]
    fn test_duplicate_association_is_rejected() -> Result<(), StoreError> {
        let db = IndexDb::temporary(Envelope::Plain)?;
        assert!(db.put(&row("1", "a"), b"first")?);
        assert!(!db.put(&row("1", "a"), b"second")?);

        assert_eq!(db.entry_count(), 1);
        assert_eq!(drain(db.get(None)?), vec![b"first".to_vec()]);
        Ok(())
    }

    #[test]
    fn test_lookup_by_commit() -> Result<(), StoreError> {
        let db = IndexDb::temporary(Envelope::Plain)?;
        db.put(&row("1", "a"), b"1a")?;
        db.put(&row("1", "b"), b"1b")?;
        db.put(&row("2", "a"), b"2a")?;

        let filter = Filter::eq(Column::CommitHash, "1".repeat(40)).unwrap();
        let values = drain(db.get(Some(&filter))?);
        assert_eq!(values, vec![b"1a".to_vec(), b"1b".to_vec()]);
        Ok(())
    }
}
