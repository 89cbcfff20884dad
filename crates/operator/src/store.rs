//! Cluster object store: the only collaborator interface the reconcile core
//! and informer depend on. `KubeStore` is the production implementation over
//! `kube::Api`; tests substitute an in-memory fake.
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{ConfigMap, Service};
use kube::api::{DeleteParams, ListParams, PostParams};
use kube::{Api, Client, ResourceExt};
use thiserror::Error;

use crate::crd::FrontendPage;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("object not found")]
    NotFound,
    #[error("object already exists")]
    AlreadyExists,
    #[error("write conflict")]
    Conflict,
    #[error("api error: {0}")]
    Api(kube::Error),
}

fn classify(err: kube::Error) -> StoreError {
    match err {
        kube::Error::Api(ref ae) if ae.code == 404 => StoreError::NotFound,
        kube::Error::Api(ref ae) if ae.code == 409 && ae.reason == "AlreadyExists" => {
            StoreError::AlreadyExists
        }
        kube::Error::Api(ref ae) if ae.code == 409 => StoreError::Conflict,
        other => StoreError::Api(other),
    }
}

fn optional<T>(res: Result<T, kube::Error>) -> Result<Option<T>, StoreError> {
    match res {
        Ok(obj) => Ok(Some(obj)),
        Err(err) => match classify(err) {
            StoreError::NotFound => Ok(None),
            other => Err(other),
        },
    }
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn get_frontend_page(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<FrontendPage>, StoreError>;

    async fn get_service(&self, namespace: &str, name: &str)
        -> Result<Option<Service>, StoreError>;
    async fn create_service(&self, namespace: &str, svc: &Service) -> Result<Service, StoreError>;
    async fn update_service(&self, namespace: &str, svc: &Service) -> Result<Service, StoreError>;

    async fn get_config_map(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ConfigMap>, StoreError>;
    async fn create_config_map(
        &self,
        namespace: &str,
        cm: &ConfigMap,
    ) -> Result<ConfigMap, StoreError>;
    async fn update_config_map(
        &self,
        namespace: &str,
        cm: &ConfigMap,
    ) -> Result<ConfigMap, StoreError>;
    async fn delete_config_map(&self, namespace: &str, name: &str) -> Result<(), StoreError>;

    async fn get_deployment(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Deployment>, StoreError>;
    async fn create_deployment(
        &self,
        namespace: &str,
        dep: &Deployment,
    ) -> Result<Deployment, StoreError>;
    async fn update_deployment(
        &self,
        namespace: &str,
        dep: &Deployment,
    ) -> Result<Deployment, StoreError>;
    async fn list_deployments(&self, namespace: &str) -> Result<Vec<Deployment>, StoreError>;
}

#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl KubeStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn pages(&self, namespace: &str) -> Api<FrontendPage> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn services(&self, namespace: &str) -> Api<Service> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn config_maps(&self, namespace: &str) -> Api<ConfigMap> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn deployments(&self, namespace: &str) -> Api<Deployment> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl ObjectStore for KubeStore {
    async fn get_frontend_page(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<FrontendPage>, StoreError> {
        optional(self.pages(namespace).get(name).await)
    }

    async fn get_service(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Service>, StoreError> {
        optional(self.services(namespace).get(name).await)
    }

    async fn create_service(&self, namespace: &str, svc: &Service) -> Result<Service, StoreError> {
        self.services(namespace)
            .create(&PostParams::default(), svc)
            .await
            .map_err(classify)
    }

    async fn update_service(&self, namespace: &str, svc: &Service) -> Result<Service, StoreError> {
        self.services(namespace)
            .replace(&svc.name_any(), &PostParams::default(), svc)
            .await
            .map_err(classify)
    }

    async fn get_config_map(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ConfigMap>, StoreError> {
        optional(self.config_maps(namespace).get(name).await)
    }

    async fn create_config_map(
        &self,
        namespace: &str,
        cm: &ConfigMap,
    ) -> Result<ConfigMap, StoreError> {
        self.config_maps(namespace)
            .create(&PostParams::default(), cm)
            .await
            .map_err(classify)
    }

    async fn update_config_map(
        &self,
        namespace: &str,
        cm: &ConfigMap,
    ) -> Result<ConfigMap, StoreError> {
        self.config_maps(namespace)
            .replace(&cm.name_any(), &PostParams::default(), cm)
            .await
            .map_err(classify)
    }

    async fn delete_config_map(&self, namespace: &str, name: &str) -> Result<(), StoreError> {
        self.config_maps(namespace)
            .delete(name, &DeleteParams::default())
            .await
            .map(|_| ())
            .map_err(classify)
    }

    async fn get_deployment(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Deployment>, StoreError> {
        optional(self.deployments(namespace).get(name).await)
    }

    async fn create_deployment(
        &self,
        namespace: &str,
        dep: &Deployment,
    ) -> Result<Deployment, StoreError> {
        self.deployments(namespace)
            .create(&PostParams::default(), dep)
            .await
            .map_err(classify)
    }

    async fn update_deployment(
        &self,
        namespace: &str,
        dep: &Deployment,
    ) -> Result<Deployment, StoreError> {
        self.deployments(namespace)
            .replace(&dep.name_any(), &PostParams::default(), dep)
            .await
            .map_err(classify)
    }

    async fn list_deployments(&self, namespace: &str) -> Result<Vec<Deployment>, StoreError> {
        self.deployments(namespace)
            .list(&ListParams::default())
            .await
            .map(|list| list.items)
            .map_err(classify)
    }
}
