//! Commit history walk and per-commit file changes

use git2::{Delta, DiffOptions, ErrorCode, FileMode, Oid, Repository, Sort};

use crate::error::{AtPosition, Error, Position, Result};

/// A file that exists in a commit with new content relative to its first parent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    pub path: String,
    pub blob: Oid,
    pub mode: u32,
}

/// A commit reached by the history walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    pub id: Oid,
    /// Root tree of the commit
    pub tree: Oid,
    pub parents: Vec<Oid>,
}

/// Lazy sequence of a commit's file changes
pub type FileChanges = std::vec::IntoIter<FileChange>;

/// Numeric mode bits as git stores them in trees
pub fn mode_bits(mode: FileMode) -> u32 {
    match mode {
        FileMode::Blob => 0o100644,
        FileMode::BlobExecutable => 0o100755,
        FileMode::BlobGroupWritable => 0o100664,
        FileMode::Link => 0o120000,
        FileMode::Commit => 0o160000,
        FileMode::Tree => 0o040000,
        FileMode::Unreadable => 0,
    }
}

fn is_file(mode: FileMode) -> bool {
    matches!(
        mode,
        FileMode::Blob | FileMode::BlobExecutable | FileMode::BlobGroupWritable | FileMode::Link
    )
}

/// Commits of one repository in history order (newest first).
///
/// The commit ids are collected when the iterator is created; commit objects
/// are only read as the sequence advances. Each call to [`CommitIter::new`]
/// starts a new walk.
#[derive(Debug)]
pub struct CommitIter {
    repository: String,
    oids: std::vec::IntoIter<Oid>,
}

impl CommitIter {
    /// Walks history from HEAD, or from every reference when `all_commits` is set
    pub fn new(repo: &Repository, repository: &str, all_commits: bool) -> Result<Self> {
        let at = || Position::repository(repository);

        let mut revwalk = repo.revwalk().at(at)?;
        revwalk.set_sorting(Sort::TIME).at(at)?;

        // An unborn HEAD is reported by `head()`; `push_head()` only fails generically
        match repo.head() {
            Ok(head) => {
                let commit = head.peel_to_commit().at(at)?;
                revwalk.push(commit.id()).at(at)?;
            }
            Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
                log::debug!("Repository '{}' has no HEAD commit", repository);
            }
            Err(e) => return Err(e).at(at),
        }

        if all_commits {
            for reference in repo.references().at(at)? {
                let reference = reference.at(at)?;
                // Tags may point at trees or blobs
                if let Ok(commit) = reference.peel_to_commit() {
                    revwalk.push(commit.id()).at(at)?;
                }
            }
        }

        let oids = revwalk.collect::<std::result::Result<Vec<_>, _>>().at(at)?;
        log::debug!("Repository '{}': {} commits to walk", repository, oids.len());

        Ok(Self {
            repository: repository.to_string(),
            oids: oids.into_iter(),
        })
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    /// Next commit, or `None` once the walk is exhausted
    pub fn next_commit(&mut self, repo: &Repository) -> Result<Option<CommitInfo>> {
        let Some(id) = self.oids.next() else {
            return Ok(None);
        };
        let at = || Position::commit(&self.repository, &id.to_string());

        let commit = repo.find_commit(id).at(at)?;
        Ok(Some(CommitInfo {
            id,
            tree: commit.tree_id(),
            parents: commit.parent_ids().collect(),
        }))
    }
}

impl CommitInfo {
    /// Files added or modified by this commit, diffed against the first parent.
    ///
    /// Root commits are diffed against the empty tree. Deletions, submodule
    /// entries and trees produce no change. Renames are not detected, so a
    /// renamed file shows up at its new path only. A path that is not valid
    /// UTF-8 is an error.
    pub fn file_changes(&self, repo: &Repository, repository: &str) -> Result<FileChanges> {
        let at = || Position::commit(repository, &self.id.to_string());

        let tree = repo.find_tree(self.tree).at(at)?;
        let parent_tree = match self.parents.first() {
            Some(parent) => Some(repo.find_commit(*parent).and_then(|c| c.tree()).at(at)?),
            None => None,
        };

        let mut opts = DiffOptions::new();
        opts.ignore_submodules(true);
        let diff = repo
            .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), Some(&mut opts))
            .at(at)?;

        let mut changes = Vec::with_capacity(diff.deltas().len());
        for delta in diff.deltas() {
            if delta.status() == Delta::Deleted {
                continue;
            }
            let new = delta.new_file();
            if !is_file(new.mode()) {
                continue;
            }
            let Some(path) = new.path_bytes() else {
                continue;
            };
            let path = std::str::from_utf8(path).map_err(|_| {
                Error::InvalidPath(Position::file(
                    repository,
                    &self.id.to_string(),
                    &String::from_utf8_lossy(path),
                ))
            })?;
            changes.push(FileChange {
                path: path.to_string(),
                blob: new.id(),
                mode: mode_bits(new.mode()),
            });
        }
        Ok(changes.into_iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_bits() {
        assert_eq!(mode_bits(FileMode::Blob), 0o100644);
        assert_eq!(mode_bits(FileMode::BlobExecutable), 0o100755);
        assert_eq!(mode_bits(FileMode::Link), 0o120000);
        assert!(!is_file(FileMode::Commit));
        assert!(!is_file(FileMode::Tree));
    }
}
