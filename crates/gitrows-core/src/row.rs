//! Fixed row schema of the commit-files relation

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::error::SchemaError;

/// Columns of the commit-files relation, in schema order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Column {
    RepositoryId,
    CommitHash,
    FilePath,
    BlobHash,
    TreeHash,
    FileMode,
}

/// Declared schema: every row has exactly these columns in this order
pub const SCHEMA: [Column; 6] = [
    Column::RepositoryId,
    Column::CommitHash,
    Column::FilePath,
    Column::BlobHash,
    Column::TreeHash,
    Column::FileMode,
];

impl Column {
    pub const fn name(self) -> &'static str {
        match self {
            Column::RepositoryId => "repository_id",
            Column::CommitHash => "commit_hash",
            Column::FilePath => "file_path",
            Column::BlobHash => "blob_hash",
            Column::TreeHash => "tree_hash",
            Column::FileMode => "file_mode",
        }
    }

    /// Position of the column inside a row
    pub const fn position(self) -> usize {
        self as usize
    }

    pub const fn is_integer(self) -> bool {
        matches!(self, Column::FileMode)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Column {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SCHEMA
            .iter()
            .copied()
            .find(|c| c.name() == s)
            .ok_or_else(|| SchemaError::UnknownColumn(s.to_string()))
    }
}

/// One cell value
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum Value {
    Text(String),
    Integer(u32),
}

impl Value {
    /// Bytes used to index this value: UTF-8 for text, big-endian for integers
    pub fn index_bytes(&self) -> Vec<u8> {
        match self {
            Value::Text(s) => s.as_bytes().to_vec(),
            Value::Integer(n) => n.to_be_bytes().to_vec(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Integer(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Integer(n)
    }
}

/// One association: a file at a commit of a repository
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Row {
    pub repository_id: String,
    pub commit_hash: String,
    pub file_path: String,
    pub blob_hash: String,
    pub tree_hash: String,
    pub file_mode: u32,
}

impl Row {
    /// Value of a single column
    pub fn get(&self, column: Column) -> Value {
        match column {
            Column::RepositoryId => Value::Text(self.repository_id.clone()),
            Column::CommitHash => Value::Text(self.commit_hash.clone()),
            Column::FilePath => Value::Text(self.file_path.clone()),
            Column::BlobHash => Value::Text(self.blob_hash.clone()),
            Column::TreeHash => Value::Text(self.tree_hash.clone()),
            Column::FileMode => Value::Integer(self.file_mode),
        }
    }

    /// Column values in schema order
    pub fn values(&self) -> Vec<Value> {
        SCHEMA.iter().map(|c| self.get(*c)).collect()
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {:o}",
            self.repository_id,
            self.commit_hash,
            self.file_path,
            self.blob_hash,
            self.tree_hash,
            self.file_mode
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> Row {
        Row {
            repository_id: "repo".to_string(),
            commit_hash: "a".repeat(40),
            file_path: "src/lib.rs".to_string(),
            blob_hash: "b".repeat(40),
            tree_hash: "c".repeat(40),
            file_mode: 0o100644,
        }
    }

    #[test]
    fn test_values_follow_schema_order() {
        let values = row().values();
        assert_eq!(values.len(), SCHEMA.len());
        assert_eq!(values[Column::FilePath.position()], Value::from("src/lib.rs"));
        assert_eq!(values[Column::FileMode.position()], Value::Integer(0o100644));
    }

    #[test]
    fn test_column_parse() {
        assert_eq!("commit_hash".parse::<Column>(), Ok(Column::CommitHash));
        assert!("commit".parse::<Column>().is_err());
    }
}
