//! Black-box: a real local git repository fetched, filtered, and projected
//! onto a folder, end to end through the public API only.

use git2kube::sink::{FolderSink, Sink};
use git2kube::{Fetcher, Selector};
use std::path::Path;

fn commit_file(repo: &git2::Repository, path: &str, content: &[u8]) -> git2::Oid {
    let full = repo.workdir().unwrap().join(path);
    if let Some(parent) = full.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&full, content).unwrap();

    let mut index = repo.index().unwrap();
    index.add_path(Path::new(path)).unwrap();
    index.write().unwrap();
    let tree_oid = index.write_tree().unwrap();
    let tree = repo.find_tree(tree_oid).unwrap();
    let sig = git2::Signature::now("pipeline-test", "test@example.com").unwrap();

    let parent_commit = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&git2::Commit<'_>> = parent_commit.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, "update", &tree, &parents)
        .unwrap()
}

#[tokio::test]
async fn fetch_filter_and_project_onto_a_folder() {
    let origin_dir = tempfile::tempdir().unwrap();
    let repo = git2::Repository::init(origin_dir.path()).unwrap();
    commit_file(&repo, "app.yaml", b"replicas: 3\n");
    commit_file(&repo, ".env", b"SECRET=1\n");
    commit_file(&repo, "nested/child.yaml", b"nested: true\n");

    let branch = repo.head().unwrap().shorthand().unwrap().to_string();

    let cache_dir = tempfile::tempdir().unwrap();
    let fetcher = Fetcher::new(
        origin_dir.path().to_str().unwrap(),
        branch,
        cache_dir.path().join("mirror"),
        None,
    );
    let selector = Selector::new(&Selector::default_includes(), &Selector::default_excludes()).unwrap();

    let target_dir = tempfile::tempdir().unwrap();
    let mut sink = FolderSink::new(target_dir.path());

    let handle = fetcher.fetch().unwrap();
    let files: Vec<_> = handle.files().unwrap().filter(|f| selector.keep(&f.path)).collect();
    let filtered: git2kube::sink::FileIterBox<'_> = Box::new(files.into_iter());
    sink.upload(handle.id(), filtered).await.unwrap();

    assert_eq!(
        std::fs::read(target_dir.path().join("app.yaml")).unwrap(),
        b"replicas: 3\n"
    );
    assert_eq!(
        std::fs::read(target_dir.path().join("nested/child.yaml")).unwrap(),
        b"nested: true\n"
    );
    assert!(!target_dir.path().join(".env").exists(), "dotfiles are excluded by default");

    // a second refresh after removing a file from origin must remove it locally too
    std::fs::remove_file(origin_dir.path().join("app.yaml")).unwrap();
    let mut index = repo.index().unwrap();
    index.remove_path(Path::new("app.yaml")).unwrap();
    index.write().unwrap();
    let tree_oid = index.write_tree().unwrap();
    let tree = repo.find_tree(tree_oid).unwrap();
    let sig = git2::Signature::now("pipeline-test", "test@example.com").unwrap();
    let parent = repo.head().unwrap().peel_to_commit().unwrap();
    repo.commit(Some("HEAD"), &sig, &sig, "remove app.yaml", &tree, &[&parent])
        .unwrap();

    let handle2 = fetcher.fetch().unwrap();
    let files2: Vec<_> = handle2.files().unwrap().filter(|f| selector.keep(&f.path)).collect();
    let filtered2: git2kube::sink::FileIterBox<'_> = Box::new(files2.into_iter());
    sink.upload(handle2.id(), filtered2).await.unwrap();

    assert!(!target_dir.path().join("app.yaml").exists(), "stale file removed after refresh");
    assert!(target_dir.path().join("nested/child.yaml").exists());
}
