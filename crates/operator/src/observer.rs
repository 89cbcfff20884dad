//! Read-only Deployment observer. Mirrors the watch stream into log entries
//! through the event filter; never mutates cluster state. Events are
//! processed strictly sequentially (effective concurrency of one).
use std::collections::HashMap;
use std::sync::Arc;

use futures_util::{pin_mut, StreamExt};
use k8s_openapi::api::apps::v1::Deployment;
use kube::{Api, Client, ResourceExt};
use kube_runtime::watcher::{watcher, Config, Event};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::filter::EventFilter;
use crate::store::ObjectStore;

pub struct DeploymentObserver {
    store: Arc<dyn ObjectStore>,
    filter: Arc<dyn EventFilter>,
    namespace: String,
}

impl DeploymentObserver {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        namespace: impl Into<String>,
        filter: Arc<dyn EventFilter>,
    ) -> Self {
        Self {
            store,
            filter,
            namespace: namespace.into(),
        }
    }

    pub async fn run(&self, client: Client, mut shutdown: watch::Receiver<bool>) {
        let api: Api<Deployment> = Api::namespaced(client, &self.namespace);
        let stream = watcher(api, Config::default());
        pin_mut!(stream);
        // Last seen resource version per name, to tell creates from updates.
        let mut seen: HashMap<String, String> = HashMap::new();
        info!(namespace = %self.namespace, "deployment observer started");
        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                ev = stream.next() => match ev {
                    Some(Ok(Event::Applied(dep))) => {
                        let name = dep.name_any();
                        let rv = dep.resource_version().unwrap_or_default();
                        let admitted = match seen.insert(name.clone(), rv) {
                            None => self.filter.admit_create(&self.namespace, &name),
                            Some(_) => self.filter.admit_update(&self.namespace, &name),
                        };
                        if admitted {
                            self.observe(&name).await;
                        }
                    }
                    Some(Ok(Event::Deleted(dep))) => {
                        let name = dep.name_any();
                        seen.remove(&name);
                        if self.filter.admit_delete(&self.namespace, &name) {
                            self.observe(&name).await;
                        }
                    }
                    Some(Ok(Event::Restarted(deps))) => {
                        // Restart backlog is not replayed; just reseed the map.
                        seen = deps
                            .iter()
                            .map(|d| (d.name_any(), d.resource_version().unwrap_or_default()))
                            .collect();
                    }
                    Some(Err(err)) => warn!(error = %err, "deployment watch error"),
                    None => break,
                },
            }
        }
        info!("deployment observer stopped");
    }

    /// Observation point only: fetch and log, never converge.
    pub async fn observe(&self, name: &str) {
        match self.store.get_deployment(&self.namespace, name).await {
            Ok(Some(dep)) => {
                let replicas = dep.spec.as_ref().and_then(|s| s.replicas).unwrap_or(0);
                info!(
                    namespace = %self.namespace,
                    name = %name,
                    replicas = replicas,
                    "deployment exists"
                );
            }
            Ok(None) => {
                info!(namespace = %self.namespace, name = %name, "deployment gone");
            }
            Err(err) => {
                warn!(error = %err, namespace = %self.namespace, name = %name, "failed to fetch deployment");
            }
        }
    }
}
