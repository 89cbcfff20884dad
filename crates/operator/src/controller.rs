//! Reconciliation engine for the FrontendPage resource graph.
//!
//! One reconcile pass converges the owned Service, ConfigMap, and Deployment
//! toward the builder output for the current spec. Ordering follows the
//! dependency chain: the Deployment mounts the ConfigMap, so a ConfigMap
//! update requeues before the Deployment is evaluated.
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{ConfigMap, Service};
use kube::{Api, Client, ResourceExt};
use kube_runtime::controller::{Action, Controller};
use kube_runtime::watcher;
use tracing::{debug, info, warn};

use crate::builders;
use crate::config::OperatorConfig;
use crate::crd::FrontendPage;
use crate::error::Error;
use crate::owner;
use crate::store::{ObjectStore, StoreError};

/// Result of one reconcile pass.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Everything converged; wait for the next triggering event.
    Done,
    /// Transient condition; the work queue should redeliver the key shortly.
    Requeue,
}

pub async fn reconcile_frontend_page(
    store: &dyn ObjectStore,
    namespace: &str,
    name: &str,
) -> Result<Outcome, Error> {
    let Some(page) = store.get_frontend_page(namespace, name).await? else {
        // Owned objects are cleaned up by the garbage collector via owner refs.
        info!(namespace = %namespace, name = %name, "FrontendPage gone, nothing to reconcile");
        return Ok(Outcome::Done);
    };
    let owner_ref = owner::owner_reference(&page)?;

    let mut desired_svc = builders::service(&page);
    owner::attach(&mut desired_svc.metadata, &owner_ref);
    match store.get_service(namespace, name).await? {
        None => match store.create_service(namespace, &desired_svc).await {
            Ok(_) => info!(namespace = %namespace, name = %name, "created Service"),
            Err(StoreError::AlreadyExists) => return Ok(Outcome::Requeue),
            Err(err) => return Err(err.into()),
        },
        Some(mut existing) => {
            if existing.spec != desired_svc.spec {
                existing.spec = desired_svc.spec.clone();
                store.update_service(namespace, &existing).await?;
                info!(namespace = %namespace, name = %name, "updated Service");
            } else {
                debug!(namespace = %namespace, name = %name, "Service up to date");
            }
        }
    }

    let mut desired_cm = builders::config_map(&page);
    owner::attach(&mut desired_cm.metadata, &owner_ref);
    match store.get_config_map(namespace, name).await? {
        None => match store.create_config_map(namespace, &desired_cm).await {
            Ok(_) => info!(namespace = %namespace, name = %name, "created ConfigMap"),
            Err(StoreError::AlreadyExists) => return Ok(Outcome::Requeue),
            Err(err) => return Err(err.into()),
        },
        Some(mut existing) => {
            if existing.data != desired_cm.data {
                existing.data = desired_cm.data.clone();
                store.update_config_map(namespace, &existing).await?;
                // Content must land before the Deployment that mounts it is
                // evaluated; requeue for a second pass.
                info!(namespace = %namespace, name = %name, "updated ConfigMap, requeueing");
                return Ok(Outcome::Requeue);
            }
            debug!(namespace = %namespace, name = %name, "ConfigMap up to date");
        }
    }

    let mut desired_dep = builders::deployment(&page);
    owner::attach(&mut desired_dep.metadata, &owner_ref);
    match store.get_deployment(namespace, name).await? {
        None => match store.create_deployment(namespace, &desired_dep).await {
            Ok(_) => info!(namespace = %namespace, name = %name, "created Deployment"),
            Err(StoreError::AlreadyExists) => return Ok(Outcome::Requeue),
            Err(err) => return Err(err.into()),
        },
        Some(mut existing) => {
            // Field-scoped comparison: only replicas and the primary
            // container image are owned by this controller. Unrelated drift
            // stays untouched to avoid fighting other writers.
            let mut changed = false;
            let want_replicas = desired_dep.spec.as_ref().and_then(|s| s.replicas);
            let want_image = primary_image(&desired_dep);
            if let Some(spec) = existing.spec.as_mut() {
                if spec.replicas != want_replicas {
                    spec.replicas = want_replicas;
                    changed = true;
                }
                if let Some(container) = spec
                    .template
                    .spec
                    .as_mut()
                    .and_then(|pod| pod.containers.first_mut())
                {
                    if container.image != want_image {
                        container.image = want_image;
                        changed = true;
                    }
                }
            }
            if changed {
                match store.update_deployment(namespace, &existing).await {
                    Ok(_) => info!(namespace = %namespace, name = %name, "updated Deployment"),
                    Err(StoreError::Conflict) => {
                        // Another writer won the optimistic-concurrency race;
                        // the next pass re-reads the latest version.
                        info!(namespace = %namespace, name = %name, "Deployment update conflict, requeueing");
                        return Ok(Outcome::Requeue);
                    }
                    Err(err) => return Err(err.into()),
                }
            } else {
                debug!(namespace = %namespace, name = %name, "Deployment up to date");
            }
        }
    }

    Ok(Outcome::Done)
}

fn primary_image(dep: &Deployment) -> Option<String> {
    dep.spec
        .as_ref()
        .and_then(|s| s.template.spec.as_ref())
        .and_then(|pod| pod.containers.first())
        .and_then(|c| c.image.clone())
}

pub struct Context {
    pub store: Arc<dyn ObjectStore>,
    pub requeue_after: Duration,
}

async fn reconcile(page: Arc<FrontendPage>, ctx: Arc<Context>) -> Result<Action, Error> {
    let namespace = page.namespace().unwrap_or_else(|| "default".to_string());
    let name = page.name_any();
    match reconcile_frontend_page(ctx.store.as_ref(), &namespace, &name).await? {
        Outcome::Done => Ok(Action::await_change()),
        Outcome::Requeue => Ok(Action::requeue(ctx.requeue_after)),
    }
}

fn error_policy(page: Arc<FrontendPage>, err: &Error, ctx: Arc<Context>) -> Action {
    warn!(name = %page.name_any(), error = %err, "reconcile failed, backing off");
    Action::requeue(ctx.requeue_after * 5)
}

/// Runs the FrontendPage controller until a shutdown signal arrives. The
/// controller runtime owns the work queue: keys are deduplicated and at most
/// one reconcile is in flight per FrontendPage.
pub async fn run_frontend_page_controller(
    client: Client,
    store: Arc<dyn ObjectStore>,
    cfg: &OperatorConfig,
) {
    let pages: Api<FrontendPage> = Api::namespaced(client.clone(), &cfg.namespace);
    let services: Api<Service> = Api::namespaced(client.clone(), &cfg.namespace);
    let config_maps: Api<ConfigMap> = Api::namespaced(client.clone(), &cfg.namespace);
    let deployments: Api<Deployment> = Api::namespaced(client, &cfg.namespace);

    Controller::new(pages, watcher::Config::default())
        .owns(services, watcher::Config::default())
        .owns(config_maps, watcher::Config::default())
        .owns(deployments, watcher::Config::default())
        .shutdown_on_signal()
        .run(
            reconcile,
            error_policy,
            Arc::new(Context {
                store,
                requeue_after: cfg.requeue_after,
            }),
        )
        .for_each(|res| async move {
            match res {
                Ok((obj, _)) => debug!(object = %obj, "reconciled"),
                Err(err) => warn!(error = %err, "controller error"),
            }
        })
        .await;
    info!("FrontendPage controller stopped");
}
