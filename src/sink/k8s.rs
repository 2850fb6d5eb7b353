//! Kubernetes client construction shared by the ConfigMap and Secret sinks.

use super::SinkError;

/// `local_kubeconfig = true` reads `~/.kube/config` (or `$KUBECONFIG`);
/// `false` uses the in-cluster service account, mirroring the Go client's
/// `rest.InClusterConfig()` fallback for an unset `--kubeconfig` flag.
pub(super) async fn build_client(local_kubeconfig: bool) -> Result<kube::Client, SinkError> {
    let config = if local_kubeconfig {
        kube::Config::from_kubeconfig(&kube::config::KubeConfigOptions::default())
            .await
            .map_err(|e| SinkError::Target(format!("loading local kubeconfig: {e}")))?
    } else {
        kube::Config::incluster_env()
            .map_err(|e| SinkError::Target(format!("in-cluster config: {e}")))?
    };

    kube::Client::try_from(config).map_err(|e| SinkError::Kube(e.to_string()))
}
