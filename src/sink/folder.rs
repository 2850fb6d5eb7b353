//! Folder sink: writes the filtered tree straight onto the local
//! filesystem, preserving directory structure instead of flattening paths
//! with dots. Always behaves like `MergeType::Delete`: files left over from
//! a previous commit that the new tree no longer has are removed.

use super::{FileIterBox, Sink, SinkError};
use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};

const COPY_CHUNK: usize = 1024;

pub struct FolderSink {
    target_dir: PathBuf,
}

impl FolderSink {
    pub fn new(target_dir: impl Into<PathBuf>) -> Self {
        Self {
            target_dir: target_dir.into(),
        }
    }
}

fn write_chunked(dest: &Path, content: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::File::create(dest)?;
    for chunk in content.chunks(COPY_CHUNK) {
        file.write_all(chunk)?;
    }
    Ok(())
}

#[async_trait::async_trait(?Send)]
impl Sink for FolderSink {
    async fn upload(&mut self, _commit_id: &str, files: FileIterBox<'_>) -> Result<(), SinkError> {
        std::fs::create_dir_all(&self.target_dir)?;

        let mut kept = BTreeSet::new();
        for entry in files {
            let content = entry.content()?;
            let dest = self.target_dir.join(&entry.path);
            write_chunked(&dest, &content)?;
            kept.insert(entry.path);
        }

        for walked in walkdir::WalkDir::new(&self.target_dir)
            .into_iter()
            .filter_map(Result::ok)
        {
            if !walked.file_type().is_file() {
                continue;
            }
            let rel = walked
                .path()
                .strip_prefix(&self.target_dir)
                .expect("walked entry is under target_dir")
                .to_string_lossy()
                .replace(std::path::MAIN_SEPARATOR, "/");
            if !kept.contains(&rel) {
                let _ = std::fs::remove_file(walked.path());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::fetch::{FileEntry, FileMode};

    // `FileEntry` ties its content lookup to a live `git2::Repository`, so
    // these tests exercise the filesystem half (chunked write + stale-file
    // cleanup) directly rather than through the `Sink` trait.

    #[test]
    fn write_chunked_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("sub/deep/file.yaml");
        write_chunked(&dest, b"hello").unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"hello");
    }

    #[test]
    fn write_chunked_handles_content_larger_than_one_chunk() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("big.bin");
        let content = vec![7u8; COPY_CHUNK * 3 + 17];
        write_chunked(&dest, &content).unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), content);
    }

    #[tokio::test]
    async fn stale_files_are_removed_after_upload_of_an_empty_tree() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("stale.yaml"), b"old").unwrap();

        let mut sink = FolderSink::new(dir.path());
        let empty: FileIterBox<'_> = Box::new(std::iter::empty::<FileEntry<'_>>());
        sink.upload("deadbeef", empty).await.unwrap();

        assert!(!dir.path().join("stale.yaml").exists(), "stale file must be removed");
    }

    #[tokio::test]
    async fn upload_creates_target_dir_when_missing() {
        let parent = tempfile::tempdir().unwrap();
        let target = parent.path().join("nested/projected");

        let mut sink = FolderSink::new(&target);
        let empty: FileIterBox<'_> = Box::new(std::iter::empty::<FileEntry<'_>>());
        sink.upload("deadbeef", empty).await.unwrap();

        assert!(target.is_dir());
        let _ = FileMode::Regular;
    }
}
