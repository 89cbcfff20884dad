//! Binary entrypoint: wires the FrontendPage controller, the Deployment
//! observer, and the shadow-state informer against one shared client.
use std::sync::Arc;

use frontend_operator::config::{build_client, OperatorConfig};
use frontend_operator::controller::run_frontend_page_controller;
use frontend_operator::filter::LogAndAdmit;
use frontend_operator::informer::ShadowInformer;
use frontend_operator::observer::DeploymentObserver;
use frontend_operator::store::{KubeStore, ObjectStore};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let cfg = OperatorConfig::from_env();
    info!(namespace = %cfg.namespace, "frontend-operator starting");
    let client = build_client(&cfg).await?;
    let store: Arc<dyn ObjectStore> = Arc::new(KubeStore::new(client.clone()));

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    let informer = ShadowInformer::new(store.clone(), cfg.namespace.clone(), cfg.resync_interval);
    let cache = informer.cache();
    let informer_task = {
        let client = client.clone();
        let shutdown = shutdown_rx.clone();
        tokio::spawn(async move { informer.run(client, shutdown).await })
    };

    let observer = DeploymentObserver::new(store.clone(), cfg.namespace.clone(), Arc::new(LogAndAdmit));
    let observer_task = {
        let client = client.clone();
        tokio::spawn(async move { observer.run(client, shutdown_rx).await })
    };

    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.expect("install ctrl_c handler");
        info!("received Ctrl+C, shutting down");
        let _ = shutdown_tx.send(true);
    });

    // Runs until the signal above also stops the controller stream.
    run_frontend_page_controller(client, store, &cfg).await;

    let _ = informer_task.await;
    let _ = observer_task.await;
    info!(cached_deployments = cache.deployment_names().len(), "frontend-operator stopped");
    Ok(())
}
