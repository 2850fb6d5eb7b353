//! Shallow mirror of a single branch, exposed as a walkable commit tree.
//!
//! The algorithm: open the cache directory as a repository; if it doesn't
//! exist yet, or its `origin` doesn't match the configured URL, wipe it and
//! clone fresh. Otherwise fetch `origin/<branch>` and hard-reset onto it.
//! Either way we end up with the working tree and `HEAD` sitting on the
//! latest remote commit, matching the way `EmbarkStudios-cargo-fetcher`'s
//! `fetch::git::via_git` treats a cache directory as disposable state that
//! gets reconciled rather than diffed.

mod git;

use std::path::{Path, PathBuf};

#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("authentication error: {0}")]
    Auth(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("could not read file content: {0}")]
    Content(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Git's three blob modes that the sinks care about; everything else
/// (submodules, symlinks) is skipped during the tree walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileMode {
    Regular,
    Executable,
}

impl FileMode {
    fn from_git(mode: i32) -> Option<Self> {
        match mode {
            0o100644 => Some(FileMode::Regular),
            0o100755 => Some(FileMode::Executable),
            _ => None,
        }
    }
}

/// One blob in the tree, with its content fetched lazily on demand.
pub struct FileEntry<'a> {
    pub path: String,
    pub mode: FileMode,
    oid: git2::Oid,
    repo: &'a git2::Repository,
}

impl<'a> FileEntry<'a> {
    pub fn content(&self) -> Result<Vec<u8>, FetchError> {
        let blob = self
            .repo
            .find_blob(self.oid)
            .map_err(|e| FetchError::Content(format!("{}: {e}", self.path)))?;
        Ok(blob.content().to_vec())
    }
}

/// A finite, single-pass walk over the files of a `CommitHandle`'s tree.
pub struct FileIter<'a> {
    repo: &'a git2::Repository,
    entries: std::vec::IntoIter<(String, FileMode, git2::Oid)>,
}

impl<'a> Iterator for FileIter<'a> {
    type Item = FileEntry<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.entries.next().map(|(path, mode, oid)| FileEntry {
            path,
            mode,
            oid,
            repo: self.repo,
        })
    }
}

fn walk_tree(
    repo: &git2::Repository,
    tree: &git2::Tree<'_>,
    prefix: &str,
    out: &mut Vec<(String, FileMode, git2::Oid)>,
) -> Result<(), FetchError> {
    for entry in tree.iter() {
        let name = match entry.name() {
            Some(n) => n,
            None => continue, // non-UTF8 name, cannot be represented as a key anyway
        };
        let path = if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{prefix}/{name}")
        };

        match entry.kind() {
            Some(git2::ObjectType::Tree) => {
                let subtree = entry
                    .to_object(repo)
                    .and_then(|o| o.peel_to_tree())
                    .map_err(|e| FetchError::Content(format!("{path}: {e}")))?;
                walk_tree(repo, &subtree, &path, out)?;
            }
            Some(git2::ObjectType::Blob) => {
                if let Some(mode) = FileMode::from_git(entry.filemode()) {
                    out.push((path, mode, entry.id()));
                }
            }
            _ => {}
        }
    }
    Ok(())
}

/// The commit a `Fetcher` most recently landed on.
pub struct CommitHandle {
    id: String,
    repo: git2::Repository,
    tree_oid: git2::Oid,
}

impl CommitHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn files(&self) -> Result<FileIter<'_>, FetchError> {
        let tree = self
            .repo
            .find_tree(self.tree_oid)
            .map_err(|e| FetchError::Content(e.to_string()))?;
        let mut entries = Vec::new();
        walk_tree(&self.repo, &tree, "", &mut entries)?;
        Ok(FileIter {
            repo: &self.repo,
            entries: entries.into_iter(),
        })
    }
}

/// Keeps a local cache directory mirroring one branch of a remote repository.
#[derive(Clone)]
pub struct Fetcher {
    url: String,
    branch: String,
    cache_dir: PathBuf,
    ssh_key: Option<PathBuf>,
}

impl Fetcher {
    pub fn new(
        url: impl Into<String>,
        branch: impl Into<String>,
        cache_dir: impl Into<PathBuf>,
        ssh_key: Option<PathBuf>,
    ) -> Self {
        Self {
            url: url.into(),
            branch: branch.into(),
            cache_dir: cache_dir.into(),
            ssh_key,
        }
    }

    fn fetch_options(&self) -> Result<git2::FetchOptions<'static>, FetchError> {
        let creds = git::select(&self.url, self.ssh_key.as_deref())?;
        let mut opts = git2::FetchOptions::new();
        opts.remote_callbacks(git::remote_callbacks(creds));
        opts.download_tags(git2::AutotagOption::None);
        Ok(opts)
    }

    fn open_matching(&self) -> Option<git2::Repository> {
        let repo = git2::Repository::open(&self.cache_dir).ok()?;
        let origin_url = repo.find_remote("origin").ok()?.url()?.to_string();
        if origin_url == self.url {
            Some(repo)
        } else {
            None
        }
    }

    fn clone_fresh(&self) -> Result<git2::Repository, FetchError> {
        if self.cache_dir.exists() {
            std::fs::remove_dir_all(&self.cache_dir)?;
        }
        std::fs::create_dir_all(&self.cache_dir)?;

        let mut builder = git2::build::RepoBuilder::new();
        builder.branch(&self.branch);
        builder.fetch_options(self.fetch_options()?);
        builder
            .clone(&self.url, &self.cache_dir)
            .map_err(|e| FetchError::Transport(e.to_string()))
    }

    /// Brings the cache directory up to date with `origin/<branch>` and
    /// returns a handle onto the resulting `HEAD` commit.
    pub fn fetch(&self) -> Result<CommitHandle, FetchError> {
        let repo = match self.open_matching() {
            Some(repo) => repo,
            None => self.clone_fresh()?,
        };

        {
            let mut remote = repo
                .find_remote("origin")
                .map_err(|e| FetchError::Transport(e.to_string()))?;
            remote
                .fetch(&[self.branch.as_str()], Some(&mut self.fetch_options()?), None)
                .map_err(|e| FetchError::Transport(e.to_string()))?;
        }

        let target = {
            let remote_ref = repo
                .find_reference(&format!("refs/remotes/origin/{}", self.branch))
                .map_err(|e| FetchError::Transport(format!("unknown branch '{}': {e}", self.branch)))?;
            remote_ref
                .target()
                .ok_or_else(|| FetchError::Transport(format!("branch '{}' is symbolic", self.branch)))?
        };

        {
            let object = repo
                .find_object(target, None)
                .map_err(|e| FetchError::Transport(e.to_string()))?;
            repo.reset(&object, git2::ResetType::Hard, None)
                .map_err(|e| FetchError::Transport(e.to_string()))?;
        }

        let (id, tree_oid) = {
            let commit = repo
                .head()
                .and_then(|h| h.peel_to_commit())
                .map_err(|e| FetchError::Transport(e.to_string()))?;
            (commit.id().to_string(), commit.tree_id())
        };

        Ok(CommitHandle { id, repo, tree_oid })
    }
}
