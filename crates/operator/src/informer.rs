//! Shadow-state informer: a long-lived watch over Deployments that mirrors
//! lifecycle transitions into companion ConfigMaps carrying an update
//! counter. The mirror is best-effort; write failures are logged, never
//! retried, so cache availability wins over strict mirror consistency.
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::Utc;
use futures_util::{pin_mut, StreamExt};
use k8s_openapi::api::apps::v1::Deployment;
use kube::{Api, Client, ResourceExt};
use kube_runtime::watcher::{watcher, Config, Event};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::builders;
use crate::store::ObjectStore;

/// Local indexed cache of watched Deployments (name -> resource version).
/// Owned by the informer, readable by external callers without a cluster
/// round trip.
#[derive(Clone, Default)]
pub struct DeploymentCache {
    inner: Arc<RwLock<HashMap<String, String>>>,
}

impl DeploymentCache {
    pub fn deployment_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.read().unwrap().keys().cloned().collect();
        names.sort();
        names
    }

    fn get(&self, name: &str) -> Option<String> {
        self.inner.read().unwrap().get(name).cloned()
    }

    fn insert(&self, name: String, resource_version: String) {
        self.inner.write().unwrap().insert(name, resource_version);
    }

    fn remove(&self, name: &str) {
        self.inner.write().unwrap().remove(name);
    }

    fn snapshot(&self) -> HashMap<String, String> {
        self.inner.read().unwrap().clone()
    }
}

pub struct ShadowInformer {
    store: Arc<dyn ObjectStore>,
    namespace: String,
    cache: DeploymentCache,
    resync_interval: Duration,
}

impl ShadowInformer {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        namespace: impl Into<String>,
        resync_interval: Duration,
    ) -> Self {
        Self {
            store,
            namespace: namespace.into(),
            cache: DeploymentCache::default(),
            resync_interval,
        }
    }

    /// Handle for the read path; cheap to clone.
    pub fn cache(&self) -> DeploymentCache {
        self.cache.clone()
    }

    /// Blocks until the shutdown signal fires. Incremental watch events are
    /// folded into the cache; a periodic full resync replays anything the
    /// watch missed.
    pub async fn run(&self, client: Client, mut shutdown: watch::Receiver<bool>) {
        let api: Api<Deployment> = Api::namespaced(client, &self.namespace);
        let stream = watcher(api, Config::default());
        pin_mut!(stream);
        let mut resync = tokio::time::interval(self.resync_interval);
        info!(namespace = %self.namespace, "shadow informer started");
        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                _ = resync.tick() => self.resync().await,
                ev = stream.next() => match ev {
                    Some(Ok(Event::Applied(dep))) => self.apply(&dep).await,
                    Some(Ok(Event::Deleted(dep))) => self.forget(&dep.name_any()).await,
                    Some(Ok(Event::Restarted(deps))) => self.sync_full(&deps).await,
                    Some(Err(err)) => warn!(error = %err, "deployment watch error"),
                    None => break,
                },
            }
        }
        info!("shadow informer stopped");
    }

    /// Folds an observed Deployment into the cache, dispatching the add or
    /// update mirror path. An unchanged resource version is a duplicate
    /// delivery and must not touch the mirror.
    pub async fn apply(&self, dep: &Deployment) {
        let name = dep.name_any();
        let rv = dep.resource_version().unwrap_or_default();
        match self.cache.get(&name) {
            None => {
                self.cache.insert(name.clone(), rv);
                self.mirror_add(&name).await;
            }
            Some(old) if old == rv => {
                debug!(name = %name, "resource version unchanged, skipping");
            }
            Some(_) => {
                self.cache.insert(name.clone(), rv);
                self.mirror_update(&name).await;
            }
        }
    }

    /// Drops a Deployment from the cache and deletes its companion.
    pub async fn forget(&self, name: &str) {
        self.cache.remove(name);
        match self.store.delete_config_map(&self.namespace, name).await {
            Ok(()) => info!(name = %name, "shadow ConfigMap deleted"),
            // Tolerates the ConfigMap already being gone.
            Err(err) => warn!(error = %err, name = %name, "failed to delete shadow ConfigMap"),
        }
    }

    /// Reconciles the cache against a full listing, replaying adds, updates,
    /// and deletes the watch may have missed.
    pub async fn sync_full(&self, deps: &[Deployment]) {
        let live: HashMap<String, String> = deps
            .iter()
            .map(|d| (d.name_any(), d.resource_version().unwrap_or_default()))
            .collect();
        let cached = self.cache.snapshot();
        for (name, rv) in &live {
            match cached.get(name) {
                None => {
                    self.cache.insert(name.clone(), rv.clone());
                    self.mirror_add(name).await;
                }
                Some(old) if old != rv => {
                    self.cache.insert(name.clone(), rv.clone());
                    self.mirror_update(name).await;
                }
                _ => {}
            }
        }
        for name in cached.keys() {
            if !live.contains_key(name) {
                self.forget(name).await;
            }
        }
    }

    async fn resync(&self) {
        match self.store.list_deployments(&self.namespace).await {
            Ok(deps) => self.sync_full(&deps).await,
            Err(err) => warn!(error = %err, "resync list failed"),
        }
    }

    async fn mirror_add(&self, name: &str) {
        let cm = builders::shadow_config_map(name, &self.namespace, 0, Utc::now());
        match self.store.create_config_map(&self.namespace, &cm).await {
            Ok(_) => info!(name = %name, "shadow ConfigMap created"),
            Err(err) => warn!(error = %err, name = %name, "failed to create shadow ConfigMap"),
        }
    }

    async fn mirror_update(&self, name: &str) {
        match self.store.get_config_map(&self.namespace, name).await {
            // The informer missed the add event (e.g. it restarted).
            Ok(None) => self.mirror_add(name).await,
            Ok(Some(existing)) => {
                let count = existing
                    .data
                    .as_ref()
                    .and_then(|d| d.get("updateCount"))
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(0);
                let mut cm = builders::shadow_config_map(name, &self.namespace, count + 1, Utc::now());
                cm.metadata.resource_version = existing.metadata.resource_version.clone();
                match self.store.update_config_map(&self.namespace, &cm).await {
                    Ok(_) => info!(name = %name, count = count + 1, "shadow ConfigMap updated"),
                    Err(err) => {
                        warn!(error = %err, name = %name, "failed to update shadow ConfigMap")
                    }
                }
            }
            Err(err) => warn!(error = %err, name = %name, "failed to read shadow ConfigMap"),
        }
    }
}
