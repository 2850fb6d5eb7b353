//! Upload targets. `Sink` is the three-variant analogue of
//! `EmbarkStudios-cargo-fetcher`'s `trait Backend`: one async contract,
//! one implementation per destination, boxed and driven by the scheduler
//! without it needing to know which kind it holds.

mod configmap;
mod folder;
mod k8s;
mod secret;

pub use configmap::ConfigMapSink;
pub use folder::FolderSink;
pub use secret::SecretSink;

use crate::fetch::FileEntry;
use std::collections::BTreeMap;
use std::str::FromStr;

#[derive(thiserror::Error, Debug)]
pub enum SinkError {
    #[error("target error: {0}")]
    Target(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Fetch(#[from] crate::fetch::FetchError),

    #[error("kubernetes api error: {0}")]
    Kube(String),

    /// Two distinct paths collapsed onto the same dotted key. A data-shape
    /// defect, not a transient fault, so it aborts the cycle rather than
    /// silently overwriting one file's content with the other's.
    #[error("duplicate key '{key}': both '{first}' and '{second}' map to it")]
    DuplicateKey {
        key: String,
        first: String,
        second: String,
    },
}

/// Annotation git2kube stamps on every ConfigMap/Secret it writes, recording
/// the commit it was built from.
pub const REF_ANNOTATION: &str = "git2kube.github.com/ref";

/// How a sink reconciles its existing payload with the freshly fetched one.
///
/// The folder sink ignores this and always behaves like `Delete`, since a
/// directory has no separate "existing keys the tool doesn't own" concept
/// the way a ConfigMap's `data` map does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeType {
    /// Replace the payload outright: keys absent from the new tree are dropped.
    #[default]
    Delete,
    /// Keep existing keys the new tree doesn't mention, overwrite the rest.
    Upsert,
}

impl FromStr for MergeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "delete" => Ok(MergeType::Delete),
            "upsert" => Ok(MergeType::Upsert),
            other => Err(format!("unknown merge type '{other}', expected delete or upsert")),
        }
    }
}

/// Target-agnostic configuration shared by the ConfigMap and Secret sinks.
#[derive(Debug, Clone)]
pub struct UploaderOptions {
    pub namespace: String,
    pub name: String,
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
    pub merge_type: MergeType,
}

/// Boxed so `Sink` stays object-safe: the scheduler holds one trait object
/// regardless of which concrete sink the CLI selected.
pub type FileIterBox<'a> = Box<dyn Iterator<Item = FileEntry<'a>> + 'a>;

#[async_trait::async_trait(?Send)]
pub trait Sink {
    /// Replaces the target's payload with the given commit's filtered file
    /// tree. `commit_id` is stamped as the ref annotation on every sink that
    /// supports annotations.
    async fn upload(&mut self, commit_id: &str, files: FileIterBox<'_>) -> Result<(), SinkError>;
}

fn dotted_key(path: &str) -> String {
    path.replace('/', ".")
}

/// Reads every file in `files` into a UTF-8 payload map, keyed by dotted
/// path. Files that aren't valid UTF-8 are skipped and returned separately
/// rather than failing the whole upload, since a single binary asset
/// shouldn't block an otherwise-valid ConfigMap.
pub(crate) fn materialize_text(
    files: FileIterBox<'_>,
) -> Result<(BTreeMap<String, String>, Vec<String>), SinkError> {
    let mut data = BTreeMap::new();
    let mut sources: BTreeMap<String, String> = BTreeMap::new();
    let mut skipped = Vec::new();

    for entry in files {
        let bytes = entry.content()?;
        match String::from_utf8(bytes) {
            Ok(text) => {
                let key = dotted_key(&entry.path);
                if let Some(first) = sources.insert(key.clone(), entry.path.clone()) {
                    return Err(SinkError::DuplicateKey {
                        key,
                        first,
                        second: entry.path,
                    });
                }
                data.insert(key, text);
            }
            Err(_) => skipped.push(entry.path),
        }
    }

    Ok((data, skipped))
}

/// Reads every file in `files` into a byte payload map, keyed by dotted
/// path. Unlike `materialize_text`, nothing is skipped: Secrets store raw
/// bytes and have no encoding to fail against.
pub(crate) fn materialize_bytes(
    files: FileIterBox<'_>,
) -> Result<BTreeMap<String, Vec<u8>>, SinkError> {
    let mut data = BTreeMap::new();
    let mut sources: BTreeMap<String, String> = BTreeMap::new();

    for entry in files {
        let key = dotted_key(&entry.path);
        let content = entry.content()?;
        if let Some(first) = sources.insert(key.clone(), entry.path.clone()) {
            return Err(SinkError::DuplicateKey {
                key,
                first,
                second: entry.path,
            });
        }
        data.insert(key, content);
    }
    Ok(data)
}

/// Builds the annotation map for an upload from scratch, rather than
/// mutating the caller's map in place, so the same `UploaderOptions` can be
/// reused across refresh cycles without accumulating stale ref values.
pub(crate) fn build_annotations(
    base: &BTreeMap<String, String>,
    commit_id: &str,
) -> BTreeMap<String, String> {
    let mut out = base.clone();
    out.insert(REF_ANNOTATION.to_string(), commit_id.to_string());
    out
}

/// Reconciles `existing` target data with the freshly materialized
/// `desired` data according to `merge_type`. Pure and cluster-free so it
/// can be tested without standing up a fake Kubernetes API.
pub(crate) fn merge_data<V: Clone>(
    existing: &BTreeMap<String, V>,
    desired: &BTreeMap<String, V>,
    merge_type: MergeType,
) -> BTreeMap<String, V> {
    match merge_type {
        MergeType::Delete => desired.clone(),
        MergeType::Upsert => {
            let mut out = existing.clone();
            for (k, v) in desired {
                out.insert(k.clone(), v.clone());
            }
            out
        }
    }
}

/// Keys present in `existing` but absent from `final_map`. A JSON merge
/// patch leaves any key it doesn't mention untouched server-side, so a
/// caller building one must emit an explicit `null` for each of these to
/// actually delete them (plain serialization of `final_map` alone cannot
/// express removal).
pub(crate) fn removed_keys<V>(
    existing: &BTreeMap<String, V>,
    final_map: &BTreeMap<String, V>,
) -> Vec<String> {
    existing
        .keys()
        .filter(|k| !final_map.contains_key(k.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn dotted_key_replaces_slashes() {
        assert_eq!(dotted_key("sub/dir/file.yaml"), "sub.dir.file.yaml");
        assert_eq!(dotted_key("top.yaml"), "top.yaml");
    }

    #[test]
    fn delete_merge_drops_keys_absent_from_desired() {
        let existing = map(&[("a", "1"), ("b", "2")]);
        let desired = map(&[("b", "20"), ("c", "3")]);
        let merged = merge_data(&existing, &desired, MergeType::Delete);
        assert_eq!(merged, map(&[("b", "20"), ("c", "3")]));
    }

    #[test]
    fn upsert_merge_keeps_keys_absent_from_desired() {
        let existing = map(&[("a", "1"), ("b", "2")]);
        let desired = map(&[("b", "20"), ("c", "3")]);
        let merged = merge_data(&existing, &desired, MergeType::Upsert);
        assert_eq!(merged, map(&[("a", "1"), ("b", "20"), ("c", "3")]));
    }

    #[test]
    fn removed_keys_finds_keys_dropped_by_a_delete_merge() {
        let existing = map(&[("a", "1"), ("b", "2")]);
        let desired = map(&[("b", "20"), ("c", "3")]);
        let final_map = merge_data(&existing, &desired, MergeType::Delete);
        assert_eq!(removed_keys(&existing, &final_map), vec!["a".to_string()]);
    }

    #[test]
    fn removed_keys_is_empty_after_an_upsert_merge() {
        let existing = map(&[("a", "1"), ("b", "2")]);
        let desired = map(&[("b", "20"), ("c", "3")]);
        let final_map = merge_data(&existing, &desired, MergeType::Upsert);
        assert!(removed_keys(&existing, &final_map).is_empty());
    }

    #[test]
    fn build_annotations_does_not_mutate_base() {
        let base = map(&[("team", "platform")]);
        let stamped = build_annotations(&base, "deadbeef");
        assert_eq!(base.len(), 1, "base map must be left untouched");
        assert_eq!(stamped.get(REF_ANNOTATION).unwrap(), "deadbeef");
        assert_eq!(stamped.get("team").unwrap(), "platform");
    }

    #[test]
    fn build_annotations_overrides_a_caller_supplied_ref() {
        let base = map(&[(REF_ANNOTATION, "stale")]);
        let stamped = build_annotations(&base, "fresh");
        assert_eq!(stamped.get(REF_ANNOTATION).unwrap(), "fresh");
    }

    #[test]
    fn merge_type_parses_case_insensitively() {
        assert_eq!("Delete".parse::<MergeType>().unwrap(), MergeType::Delete);
        assert_eq!("UPSERT".parse::<MergeType>().unwrap(), MergeType::Upsert);
        assert!("bogus".parse::<MergeType>().is_err());
    }

    /// `a/b.yaml` and `a.b.yaml` both dot down to the same key; that
    /// collision must abort the cycle instead of letting one silently
    /// clobber the other.
    #[test]
    fn materialize_text_rejects_a_dotted_key_collision() {
        let dir = tempfile::tempdir().unwrap();
        let repo = git2::Repository::init(dir.path()).unwrap();

        for path in ["a/b.yaml", "a.b.yaml"] {
            let full = dir.path().join(path);
            if let Some(parent) = full.parent() {
                std::fs::create_dir_all(parent).unwrap();
            }
            std::fs::write(&full, b"x").unwrap();
            let mut index = repo.index().unwrap();
            index.add_path(std::path::Path::new(path)).unwrap();
            index.write().unwrap();
        }

        let mut index = repo.index().unwrap();
        let tree_oid = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_oid).unwrap();
        let sig = git2::Signature::now("test", "test@example.com").unwrap();
        repo.commit(Some("HEAD"), &sig, &sig, "init", &tree, &[])
            .unwrap();

        let fetcher = crate::fetch::Fetcher::new(
            dir.path().to_str().unwrap(),
            repo.head().unwrap().shorthand().unwrap().to_string(),
            dir.path().join(".cache-mirror"),
            None,
        );
        let handle = fetcher.fetch().unwrap();
        let files: FileIterBox<'_> = Box::new(handle.files().unwrap());

        let err = materialize_text(files).unwrap_err();
        assert!(matches!(err, SinkError::DuplicateKey { key, .. } if key == "a.b.yaml"));
    }
}
