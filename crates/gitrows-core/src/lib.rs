//! gitrows core - row schema, predicates and the commit-file index key
//!
//! This crate defines the data shared by the store, the indexer and the CLI:
//! the six-column `Row` of the commit-files relation, `Filter` predicates and
//! the `IndexKey` with its binary encoding.

mod error;
mod filter;
mod hash;
mod key;
mod row;

pub use error::{DecodingError, EncodingError, SchemaError};
pub use filter::Filter;
pub use hash::{hash_hex, is_hash, parse_hash, HASH_HEX_LEN, HASH_LEN, ZERO_HASH};
pub use key::IndexKey;
pub use row::{Column, Row, Value, SCHEMA};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_commit_file_key() {
        let k = IndexKey {
            repository: "repo1".to_string(),
            packfile: ZERO_HASH.to_string(),
            offset: 1234,
            hash: ZERO_HASH.to_string(),
            name: "foo/bar.md".to_string(),
            mode: 5,
            tree: ZERO_HASH.to_string(),
            commit: ZERO_HASH.to_string(),
        };

        let data = k.encode().unwrap();
        let k2 = IndexKey::decode(&data).unwrap();
        assert_eq!(k, k2);
    }

    #[test]
    fn test_is_hash() {
        assert!(is_hash(ZERO_HASH));
        assert!(!is_hash("abc"));
        assert!(!is_hash(&"G".repeat(40)));
    }
}
