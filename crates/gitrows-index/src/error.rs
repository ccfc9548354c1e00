//! Error types for indexing and row iteration

use gitrows_core::{DecodingError, EncodingError, SchemaError};
use gitrows_db::StoreError;
use std::fmt;

/// Where in the repository/commit/file walk an error happened
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Position {
    pub repository: String,
    pub commit: Option<String>,
    pub path: Option<String>,
}

impl Position {
    pub fn repository(id: &str) -> Self {
        Self {
            repository: id.to_string(),
            ..Self::default()
        }
    }

    pub fn commit(id: &str, commit: &str) -> Self {
        Self {
            repository: id.to_string(),
            commit: Some(commit.to_string()),
            path: None,
        }
    }

    pub fn file(id: &str, commit: &str, path: &str) -> Self {
        Self {
            repository: id.to_string(),
            commit: Some(commit.to_string()),
            path: Some(path.to_string()),
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "repository '{}'", self.repository)?;
        if let Some(commit) = &self.commit {
            write!(f, ", commit {}", commit)?;
        }
        if let Some(path) = &self.path {
            write!(f, ", path '{}'", path)?;
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to encode index key at {at}: {source}")]
    Encoding {
        at: Position,
        #[source]
        source: EncodingError,
    },

    #[error("failed to decode index entry: {0}")]
    Decoding(#[from] DecodingError),

    #[error("object {hash} has no physical location ({at})")]
    ObjectResolution { hash: String, at: Position },

    #[error("object store failure at {at}: {source}")]
    Iteration {
        at: Position,
        #[source]
        source: git2::Error,
    },

    #[error("index store failure: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("path is not valid UTF-8 at {0}")]
    InvalidPath(Position),

    #[error("unknown repository '{0}'")]
    UnknownRepository(String),

    #[error("repository id '{0}' is already registered")]
    DuplicateRepository(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("build interrupted at {0}")]
    Interrupted(Position),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Attaches a walk position to object store failures
pub(crate) trait AtPosition<T> {
    fn at(self, position: impl FnOnce() -> Position) -> Result<T>;
}

impl<T> AtPosition<T> for std::result::Result<T, git2::Error> {
    fn at(self, position: impl FnOnce() -> Position) -> Result<T> {
        self.map_err(|source| Error::Iteration {
            at: position(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_display() {
        assert_eq!(Position::repository("a").to_string(), "repository 'a'");
        assert_eq!(
            Position::file("a", "abc", "x/y").to_string(),
            "repository 'a', commit abc, path 'x/y'"
        );
    }
}
