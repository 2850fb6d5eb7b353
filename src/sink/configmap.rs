//! ConfigMap sink: text-only payload, upserted or recreated through the
//! Kubernetes API.
//!
//! Grounded on `pkg/upload/upload.go`'s `Upload`/`patchConfigMap`/
//! `createConfigMap`: get the existing object, patch it if present, create
//! it if not. The patch path is a hand-built JSON merge patch rather than a
//! typed `Patch::Strategic(&ConfigMap)`, because a merge patch only ever
//! *adds or overwrites* keys it mentions — it never removes one absent from
//! the patch body. Deleting a stale key (`MergeType::Delete`) requires an
//! explicit `null` entry for it, the same reason `patchConfigMap` computes a
//! two-way diff instead of serializing the desired end state.

use super::{
    build_annotations, k8s, materialize_text, merge_data, removed_keys, FileIterBox, SinkError,
    UploaderOptions,
};
use crate::sink::{MergeType, Sink};
use k8s_openapi::api::core::v1::ConfigMap;
use kube::api::{Api, ObjectMeta, Patch, PatchParams, PostParams};
use serde_json::json;

pub struct ConfigMapSink {
    api: Api<ConfigMap>,
    options: UploaderOptions,
}

impl ConfigMapSink {
    pub async fn new(local_kubeconfig: bool, options: UploaderOptions) -> Result<Self, SinkError> {
        let client = k8s::build_client(local_kubeconfig).await?;
        let api = Api::namespaced(client, &options.namespace);
        Ok(Self { api, options })
    }
}

#[async_trait::async_trait(?Send)]
impl Sink for ConfigMapSink {
    async fn upload(&mut self, commit_id: &str, files: FileIterBox<'_>) -> Result<(), SinkError> {
        let (desired, skipped) = materialize_text(files)?;
        for path in &skipped {
            tracing::warn!(%path, "skipping non-UTF8 file for configmap sink");
        }

        match self.api.get(&self.options.name).await {
            Ok(existing) => {
                let existing_data = existing.data.clone().unwrap_or_default();
                let final_data = merge_data(&existing_data, &desired, self.options.merge_type);
                let dropped = removed_keys(&existing_data, &final_data);

                let existing_annotations = existing.metadata.annotations.clone().unwrap_or_default();
                let merged_annotations =
                    merge_data(&existing_annotations, &self.options.annotations, MergeType::Upsert);
                let final_annotations = build_annotations(&merged_annotations, commit_id);

                let existing_labels = existing.metadata.labels.clone().unwrap_or_default();
                let final_labels = merge_data(&existing_labels, &self.options.labels, MergeType::Upsert);

                let mut data_patch = serde_json::Map::new();
                for (k, v) in &final_data {
                    data_patch.insert(k.clone(), json!(v));
                }
                for key in dropped {
                    data_patch.insert(key, serde_json::Value::Null);
                }

                let patch = json!({
                    "metadata": {
                        "labels": final_labels,
                        "annotations": final_annotations,
                    },
                    "data": serde_json::Value::Object(data_patch),
                });

                self.api
                    .patch(&self.options.name, &PatchParams::default(), &Patch::Merge(&patch))
                    .await
                    .map_err(|e| SinkError::Kube(e.to_string()))?;
            }
            Err(kube::Error::Api(e)) if e.code == 404 => {
                let fresh = ConfigMap {
                    metadata: ObjectMeta {
                        name: Some(self.options.name.clone()),
                        namespace: Some(self.options.namespace.clone()),
                        labels: Some(self.options.labels.clone()),
                        annotations: Some(build_annotations(&self.options.annotations, commit_id)),
                        ..Default::default()
                    },
                    data: Some(desired),
                    ..Default::default()
                };
                self.api
                    .create(&PostParams::default(), &fresh)
                    .await
                    .map_err(|e| SinkError::Kube(e.to_string()))?;
            }
            Err(e) => return Err(SinkError::Kube(e.to_string())),
        }

        Ok(())
    }
}
