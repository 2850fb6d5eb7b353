//! Secret sink: byte payload, no application-layer base64 (the Kubernetes
//! API already base64-encodes `data` on the wire via `ByteString`).
//!
//! The patch path mirrors `configmap.rs`'s hand-built JSON merge patch: a
//! typed `Patch::Strategic(&Secret)` can only ever add or overwrite keys it
//! mentions, never remove one, so `MergeType::Delete` needs explicit `null`
//! entries for the keys `merge_data` dropped.

use super::{
    build_annotations, k8s, materialize_bytes, merge_data, removed_keys, FileIterBox, SinkError,
    UploaderOptions,
};
use crate::sink::{MergeType, Sink};
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::ByteString;
use kube::api::{Api, ObjectMeta, Patch, PatchParams, PostParams};
use serde_json::json;
use std::collections::BTreeMap;

pub struct SecretSink {
    api: Api<Secret>,
    options: UploaderOptions,
}

impl SecretSink {
    pub async fn new(local_kubeconfig: bool, options: UploaderOptions) -> Result<Self, SinkError> {
        let client = k8s::build_client(local_kubeconfig).await?;
        let api = Api::namespaced(client, &options.namespace);
        Ok(Self { api, options })
    }
}

fn to_byte_strings(data: BTreeMap<String, Vec<u8>>) -> BTreeMap<String, ByteString> {
    data.into_iter().map(|(k, v)| (k, ByteString(v))).collect()
}

fn from_byte_strings(data: &BTreeMap<String, ByteString>) -> BTreeMap<String, Vec<u8>> {
    data.iter().map(|(k, v)| (k.clone(), v.0.clone())).collect()
}

#[async_trait::async_trait(?Send)]
impl Sink for SecretSink {
    async fn upload(&mut self, commit_id: &str, files: FileIterBox<'_>) -> Result<(), SinkError> {
        let desired = materialize_bytes(files)?;

        match self.api.get(&self.options.name).await {
            Ok(existing) => {
                let existing_data = existing
                    .data
                    .as_ref()
                    .map(from_byte_strings)
                    .unwrap_or_default();
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
                    let encoded = serde_json::to_value(ByteString(v.clone()))
                        .map_err(|e| SinkError::Target(format!("encoding secret value: {e}")))?;
                    data_patch.insert(k.clone(), encoded);
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
                let fresh = Secret {
                    metadata: ObjectMeta {
                        name: Some(self.options.name.clone()),
                        namespace: Some(self.options.namespace.clone()),
                        labels: Some(self.options.labels.clone()),
                        annotations: Some(build_annotations(&self.options.annotations, commit_id)),
                        ..Default::default()
                    },
                    data: Some(to_byte_strings(desired)),
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
