//! Build statistics

use std::time::Duration;

use crate::formatting::{format_duration, format_number};

/// Counters collected while building an index
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub repositories: usize,
    pub commits: usize,
    /// Keys stored by this build
    pub keys_written: usize,
    /// Associations already present in the store
    pub duplicates: usize,
    /// File changes dropped because their object could not be located
    pub skipped: usize,
    pub elapsed: Duration,
}

impl BuildStats {
    /// Every association the build visited
    pub fn associations(&self) -> usize {
        self.keys_written + self.duplicates + self.skipped
    }
}

impl std::fmt::Display for BuildStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Repositories: {} | Commits: {} | Keys: {} written, {} duplicates, {} skipped | Time: {}",
            self.repositories,
            format_number(self.commits),
            format_number(self.keys_written),
            format_number(self.duplicates),
            format_number(self.skipped),
            format_duration(self.elapsed)
        )
    }
}
