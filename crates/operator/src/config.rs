//! Environment-driven operator configuration and client construction.
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::Client;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct OperatorConfig {
    /// Namespace watched by the controllers and the informer.
    pub namespace: String,
    /// Explicit kubeconfig path; `None` falls back to the ambient default.
    pub kubeconfig: Option<PathBuf>,
    /// Use the in-cluster service account instead of a kubeconfig.
    pub in_cluster: bool,
    /// Full resync interval for the shadow informer.
    pub resync_interval: Duration,
    /// Delay for requeued reconcile keys.
    pub requeue_after: Duration,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            namespace: "default".to_string(),
            kubeconfig: None,
            in_cluster: false,
            resync_interval: Duration::from_secs(10),
            requeue_after: Duration::from_secs(1),
        }
    }
}

impl OperatorConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let namespace = std::env::var("FRONTEND_OPERATOR_NAMESPACE")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.namespace);
        let kubeconfig = std::env::var("FRONTEND_OPERATOR_KUBECONFIG")
            .ok()
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        let in_cluster = std::env::var("FRONTEND_OPERATOR_IN_CLUSTER")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        let resync_interval =
            duration_from_env("FRONTEND_OPERATOR_RESYNC_SECS", defaults.resync_interval);
        let requeue_after =
            duration_from_env("FRONTEND_OPERATOR_REQUEUE_SECS", defaults.requeue_after);
        let cfg = Self {
            namespace,
            kubeconfig,
            in_cluster,
            resync_interval,
            requeue_after,
        };
        debug!(?cfg, "config.loaded");
        cfg
    }
}

fn duration_from_env(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}

/// Builds a Kubernetes client for the configured connection type:
/// in-cluster service account, explicit kubeconfig path, or ambient default.
pub async fn build_client(cfg: &OperatorConfig) -> Result<Client> {
    let client_config = if cfg.in_cluster {
        kube::Config::incluster().context("in-cluster config")?
    } else if let Some(path) = &cfg.kubeconfig {
        let kubeconfig =
            Kubeconfig::read_from(path).with_context(|| format!("read kubeconfig {path:?}"))?;
        kube::Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
            .await
            .context("load kubeconfig")?
    } else {
        kube::Config::infer().await.context("infer kube config")?
    };
    Client::try_from(client_config).context("build kube client")
}
