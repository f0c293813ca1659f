//! Integration tests for the engine
//!
//! These tests drive a real git repository from diff to hook file.

#![allow(clippy::unwrap_used, clippy::panic)]

use deopt_engine::reconcile::declared_directories;
use deopt_engine::{
    Git2Provider, HookDirectory, HookFileStore, ResolveRequest, resolve_hook_set, select_base_ref,
};
use git2::{Commit, IndexAddOption, Repository, Signature};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

struct Checkout {
    dir: TempDir,
    repo: Repository,
}

impl Checkout {
    fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let repo = Repository::init(dir.path()).expect("Failed to init repository");
        repo.set_head("refs/heads/central").unwrap();
        Self { dir, repo }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn write(&self, rel: &str, content: &str) {
        let path = self.root().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn commit_all(&self, message: &str) {
        let mut index = self.repo.index().unwrap();
        index
            .add_all(["*"].iter(), IndexAddOption::DEFAULT, None)
            .unwrap();
        index.write().unwrap();
        let tree = self.repo.find_tree(index.write_tree().unwrap()).unwrap();
        let sig = Signature::now("deopt", "deopt@example.com").unwrap();
        let parents: Vec<Commit<'_>> = self
            .repo
            .head()
            .ok()
            .map(|h| h.peel_to_commit().unwrap())
            .into_iter()
            .collect();
        let parent_refs: Vec<&Commit<'_>> = parents.iter().collect();
        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parent_refs)
            .unwrap();
    }

    fn start_feature_branch(&self) {
        let head = self.repo.head().unwrap().peel_to_commit().unwrap();
        self.repo.branch("feature", &head, false).unwrap();
        self.repo.set_head("refs/heads/feature").unwrap();
    }
}

fn names<'a>(dirs: impl IntoIterator<Item = &'a HookDirectory>) -> Vec<&'a str> {
    dirs.into_iter().map(HookDirectory::as_str).collect()
}

#[test]
fn test_changed_directories_minus_ignored() {
    let checkout = Checkout::new();
    checkout.write("a/x.cpp", "int x;\n");
    checkout.write("README.md", "readme\n");
    checkout.commit_all("initial");
    checkout.start_feature_branch();

    checkout.write("a/x.cpp", "int x = 1;\n");
    checkout.write("b/c/y.cpp", "int y;\n");
    checkout.commit_all("work");
    checkout.write("README.md", "changed\n");

    let vcs = Git2Provider::discover(checkout.root()).unwrap();
    let request = ResolveRequest {
        base_ref: "central".to_string(),
        include: vec![],
        ignore: vec!["b/c".to_string()],
    };
    let set = resolve_hook_set(&vcs, &request).unwrap();
    assert_eq!(names(&set), ["a"]);
}

#[test]
fn test_resolve_then_sync_is_idempotent() {
    let checkout = Checkout::new();
    checkout.write("dom/base/nsFoo.cpp", "1\n");
    checkout.commit_all("initial");
    checkout.start_feature_branch();
    checkout.write("dom/base/nsFoo.cpp", "2\n");
    checkout.write("layout/generic/frame.cpp", "3\n");
    checkout.commit_all("work");
    checkout.write("dom/base/nsFoo.cpp", "4\n");

    let vcs = Git2Provider::discover(checkout.root()).unwrap();
    let base_ref = select_base_ref(&vcs, None, Some("central")).unwrap();
    let request = ResolveRequest {
        base_ref,
        include: vec!["gfx".to_string()],
        ignore: vec![],
    };

    let store = HookFileStore::new(HookFileStore::default_path(vcs.git_dir()));

    let set = resolve_hook_set(&vcs, &request).unwrap();
    let first = store.sync(&set).unwrap();
    assert!(first.changed);
    let declared = declared_directories(&first.content).unwrap().unwrap();
    assert_eq!(names(&declared), ["dom/base", "gfx", "layout/generic"]);

    let set = resolve_hook_set(&vcs, &request).unwrap();
    let second = store.sync(&set).unwrap();
    assert!(!second.changed);
    assert_eq!(second.content, first.content);
}

#[test]
fn test_on_base_branch_compares_against_upstream() {
    let checkout = Checkout::new();
    checkout.write("a/x.cpp", "1\n");
    checkout.commit_all("initial");

    let vcs = Git2Provider::discover(checkout.root()).unwrap();
    let base_ref = select_base_ref(&vcs, None, Some("central")).unwrap();
    assert_eq!(base_ref, "origin/central");

    let err = resolve_hook_set(
        &vcs,
        &ResolveRequest {
            base_ref,
            ..ResolveRequest::default()
        },
    )
    .unwrap_err();
    assert!(err.to_string().contains("origin/central"));
}

#[test]
fn test_failed_resolution_leaves_hook_file_alone() {
    let checkout = Checkout::new();
    checkout.write("a/x.cpp", "1\n");
    checkout.commit_all("initial");

    let vcs = Git2Provider::discover(checkout.root()).unwrap();
    let store = HookFileStore::new(HookFileStore::default_path(vcs.git_dir()));

    let request = ResolveRequest {
        base_ref: "does-not-exist".to_string(),
        ..ResolveRequest::default()
    };
    assert!(resolve_hook_set(&vcs, &request).is_err());
    assert!(!store.path().exists());
}

#[test]
fn test_ignored_subdirectory_of_changed_directory_is_excluded_in_hook() {
    let checkout = Checkout::new();
    checkout.write("dom/a.cpp", "1\n");
    checkout.write("dom/base/b.cpp", "1\n");
    checkout.commit_all("initial");
    checkout.start_feature_branch();
    checkout.write("dom/a.cpp", "2\n");
    checkout.write("dom/base/b.cpp", "2\n");

    let vcs = Git2Provider::discover(checkout.root()).unwrap();
    let request = ResolveRequest {
        base_ref: "central".to_string(),
        include: vec![],
        ignore: vec!["dom/base".to_string()],
    };
    let set = resolve_hook_set(&vcs, &request).unwrap();
    assert_eq!(names(&set), ["dom"]);
    assert_eq!(names(set.excluded()), ["dom/base"]);

    let store = HookFileStore::new(HookFileStore::default_path(vcs.git_dir()));
    let outcome = store.sync(&set).unwrap();
    assert!(outcome.content.contains("NOOPT_DIRS = [\n    \"dom\",\n]\n"));
    assert!(outcome.content.contains("NOOPT_EXCLUDE = [\n    \"dom/base\",\n]\n"));
    assert!(!set.deoptimizes(&HookDirectory::parse("dom/base").unwrap()));
}

#[test]
fn test_repository_without_commits_reports_empty_history() {
    let checkout = Checkout::new();
    checkout.write("a/x.cpp", "1\n");

    let vcs = Git2Provider::discover(checkout.root()).unwrap();
    let request = ResolveRequest {
        base_ref: "central".to_string(),
        ..ResolveRequest::default()
    };
    let err = resolve_hook_set(&vcs, &request).unwrap_err();
    assert!(err.to_string().contains("no commits"), "got {err}");
}
