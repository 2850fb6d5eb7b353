//! Turns parsed CLI args into the core types, keeping `git2kube::{fetch,
//! selector, sink}` entirely unaware of clap.

use crate::cli::{CommonArgs, ConfigMapArgs, FolderArgs, SecretArgs, TargetCmd};
use git2kube::sink::{ConfigMapSink, FolderSink, SecretSink, Sink};
use git2kube::{Fetcher, MergeType, Selector, UploaderOptions};
use std::collections::BTreeMap;

pub fn build_fetcher(common: &CommonArgs) -> Fetcher {
    Fetcher::new(
        common.git.clone(),
        common.branch.clone(),
        common.cache_folder.clone(),
        common.ssh_key.clone(),
    )
}

pub fn build_selector(common: &CommonArgs) -> anyhow::Result<Selector> {
    Ok(Selector::new(&common.include, &common.exclude)?)
}

fn parse_pairs(raw: &[String]) -> anyhow::Result<BTreeMap<String, String>> {
    raw.iter()
        .map(|s| git2kube::util::parse_key_value(s).map_err(anyhow::Error::msg))
        .collect()
}

fn uploader_options(
    namespace: String,
    name: String,
    labels: &[String],
    annotations: &[String],
    merge_type: &str,
) -> anyhow::Result<UploaderOptions> {
    Ok(UploaderOptions {
        namespace,
        name,
        labels: parse_pairs(labels)?,
        annotations: parse_pairs(annotations)?,
        merge_type: merge_type
            .parse::<MergeType>()
            .map_err(anyhow::Error::msg)?,
    })
}

pub async fn build_sink(target: &TargetCmd) -> anyhow::Result<Box<dyn Sink>> {
    match target {
        TargetCmd::Configmap(ConfigMapArgs {
            kubeconfig,
            namespace,
            name,
            labels,
            annotations,
            merge_type,
        }) => {
            let options = uploader_options(
                namespace.clone(),
                name.clone(),
                labels,
                annotations,
                merge_type,
            )?;
            let sink = ConfigMapSink::new(*kubeconfig, options).await?;
            Ok(Box::new(sink))
        }
        TargetCmd::Secret(SecretArgs {
            kubeconfig,
            namespace,
            name,
            labels,
            annotations,
            merge_type,
        }) => {
            let options = uploader_options(
                namespace.clone(),
                name.clone(),
                labels,
                annotations,
                merge_type,
            )?;
            let sink = SecretSink::new(*kubeconfig, options).await?;
            Ok(Box::new(sink))
        }
        TargetCmd::Folder(FolderArgs { target_folder }) => {
            Ok(Box::new(FolderSink::new(target_folder.clone())))
        }
    }
}
