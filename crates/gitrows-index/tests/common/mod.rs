// Shared git fixtures for integration tests
#![allow(dead_code)]

use git2::{Oid, Repository, Signature};
use gitrows_index::RepositoryPool;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Create a temporary git repository with a configured user
pub fn create_test_repo() -> (TempDir, PathBuf, Repository) {
    let dir = TempDir::new().unwrap();
    let repo_path = dir.path().to_path_buf();
    let repo = init_repo(&repo_path);
    (dir, repo_path, repo)
}

pub fn init_repo(path: &Path) -> Repository {
    let repo = Repository::init(path).unwrap();
    let mut config = repo.config().unwrap();
    config.set_str("user.name", "Test User").unwrap();
    config.set_str("user.email", "test@example.com").unwrap();
    repo
}

/// Write files to the work tree and commit them on HEAD
pub fn add_commit(repo: &Repository, files: &[(&str, &[u8])], message: &str) -> Oid {
    let mut index = repo.index().unwrap();

    for (path, content) in files {
        let full_path = repo.workdir().unwrap().join(path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&full_path, content).unwrap();
        index.add_path(Path::new(path)).unwrap();
    }

    index.write().unwrap();
    commit_index(repo, &mut index, message)
}

/// Remove a file from the work tree and commit the removal
pub fn remove_file_commit(repo: &Repository, path: &str, message: &str) -> Oid {
    let full_path = repo.workdir().unwrap().join(path);
    if full_path.exists() {
        std::fs::remove_file(&full_path).unwrap();
    }

    let mut index = repo.index().unwrap();
    index.remove_path(Path::new(path)).unwrap();
    index.write().unwrap();
    commit_index(repo, &mut index, message)
}

fn commit_index(repo: &Repository, index: &mut git2::Index, message: &str) -> Oid {
    let sig = Signature::now("Test User", "test@example.com").unwrap();
    let tree_id = index.write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();

    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&git2::Commit> = parent.iter().collect();

    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .unwrap()
}

/// Commit the tree of `base` plus top-level `entries`, leaving the work tree alone
pub fn commit_entries(
    repo: &Repository,
    update_ref: &str,
    base: Oid,
    parents: &[Oid],
    entries: &[(&[u8], &[u8])],
    message: &str,
) -> Oid {
    let sig = Signature::now("Test User", "test@example.com").unwrap();
    let base_tree = repo.find_commit(base).unwrap().tree().unwrap();
    let mut builder = repo.treebuilder(Some(&base_tree)).unwrap();
    for (name, content) in entries {
        let blob = repo.blob(content).unwrap();
        builder.insert(name.to_vec(), blob, 0o100644).unwrap();
    }
    let tree = repo.find_tree(builder.write().unwrap()).unwrap();

    let parents: Vec<git2::Commit> = parents
        .iter()
        .map(|id| repo.find_commit(*id).unwrap())
        .collect();
    let parents: Vec<&git2::Commit> = parents.iter().collect();
    repo.commit(Some(update_ref), &sig, &sig, message, &tree, &parents)
        .unwrap()
}

/// Root tree of a commit, as hex
pub fn tree_of(repo: &Repository, commit: Oid) -> String {
    repo.find_commit(commit).unwrap().tree_id().to_string()
}

/// Blob id of `path` in a commit, as hex
pub fn blob_of(repo: &Repository, commit: Oid, path: &str) -> String {
    let tree = repo.find_commit(commit).unwrap().tree().unwrap();
    tree.get_path(Path::new(path)).unwrap().id().to_string()
}

/// Write every object reachable from HEAD into a pack under `objects/pack`
pub fn pack_head(repo: &Repository) {
    let mut builder = repo.packbuilder().unwrap();
    let mut walk = repo.revwalk().unwrap();
    walk.push_head().unwrap();
    builder.insert_walk(&mut walk).unwrap();

    let mut buf = git2::Buf::new();
    builder.write_buf(&mut buf).unwrap();

    let odb = repo.odb().unwrap();
    let mut writer = odb.packwriter().unwrap();
    writer.write_all(&buf).unwrap();
    writer.commit().unwrap();
}

/// History used by most tests:
///
/// 1. add `README.md`, `go/example.go`
/// 2. modify `README.md`, add `php/crappy.php`
/// 3. remove `go/example.go`
pub struct Fixture {
    pub dir: TempDir,
    pub path: PathBuf,
    pub repo: Repository,
    pub commits: [Oid; 3],
}

pub fn fixture() -> Fixture {
    let (dir, path, repo) = create_test_repo();
    let c1 = add_commit(
        &repo,
        &[
            ("README.md", b"# example\n"),
            ("go/example.go", b"package main\n"),
        ],
        "initial",
    );
    let c2 = add_commit(
        &repo,
        &[
            ("README.md", b"# example\n\nmore\n"),
            ("php/crappy.php", b"<?php\n"),
        ],
        "second",
    );
    let c3 = remove_file_commit(&repo, "go/example.go", "drop go");
    Fixture {
        dir,
        path,
        repo,
        commits: [c1, c2, c3],
    }
}

/// Second repository with a single commit
pub fn small_fixture() -> (TempDir, PathBuf, Repository, Oid) {
    let (dir, path, repo) = create_test_repo();
    let c = add_commit(&repo, &[("LICENSE", b"MIT\n")], "license");
    (dir, path, repo, c)
}

pub fn pool_of<P: AsRef<Path>>(repos: &[(&str, P)]) -> RepositoryPool {
    let mut pool = RepositoryPool::new();
    for (id, path) in repos {
        pool.add(id, path).unwrap();
    }
    pool
}
