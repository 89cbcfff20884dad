//! In-memory object store double for reconcile and informer tests.
//! Records per-operation call counts and supports one-shot injected
//! failures, so tests can assert write behavior and error paths without a
//! cluster.
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{ConfigMap, Service};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::ResourceExt;

use crate::crd::FrontendPage;
use crate::store::{ObjectStore, StoreError};

type Key = (String, String);

#[derive(Default)]
struct FakeState {
    pages: HashMap<Key, FrontendPage>,
    services: HashMap<Key, Service>,
    config_maps: HashMap<Key, ConfigMap>,
    deployments: HashMap<Key, Deployment>,
    next_rv: u64,
    calls: BTreeMap<&'static str, u32>,
    failures: HashMap<&'static str, StoreError>,
}

impl FakeState {
    fn record(&mut self, op: &'static str) -> Result<(), StoreError> {
        *self.calls.entry(op).or_insert(0) += 1;
        match self.failures.remove(op) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn bump_rv(&mut self) -> String {
        self.next_rv += 1;
        self.next_rv.to_string()
    }
}

pub struct FakeStore {
    state: Mutex<FakeState>,
}

fn key(namespace: &str, name: &str) -> Key {
    (namespace.to_string(), name.to_string())
}

impl FakeStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState::default()),
        }
    }

    pub fn put_page(&self, page: FrontendPage) {
        let ns = page.namespace().unwrap_or_else(|| "default".to_string());
        let name = page.name_any();
        self.state.lock().unwrap().pages.insert((ns, name), page);
    }

    pub fn service(&self, namespace: &str, name: &str) -> Option<Service> {
        self.state
            .lock()
            .unwrap()
            .services
            .get(&key(namespace, name))
            .cloned()
    }

    pub fn config_map(&self, namespace: &str, name: &str) -> Option<ConfigMap> {
        self.state
            .lock()
            .unwrap()
            .config_maps
            .get(&key(namespace, name))
            .cloned()
    }

    pub fn deployment(&self, namespace: &str, name: &str) -> Option<Deployment> {
        self.state
            .lock()
            .unwrap()
            .deployments
            .get(&key(namespace, name))
            .cloned()
    }

    /// Direct write bypassing call accounting, i.e. a third-party actor.
    pub fn insert_service(&self, svc: Service) {
        let k = object_key(&svc.metadata);
        self.state.lock().unwrap().services.insert(k, svc);
    }

    /// Direct write bypassing call accounting, i.e. a third-party actor.
    pub fn insert_config_map(&self, cm: ConfigMap) {
        let k = object_key(&cm.metadata);
        self.state.lock().unwrap().config_maps.insert(k, cm);
    }

    /// Direct write bypassing call accounting, i.e. a third-party actor.
    pub fn insert_deployment(&self, dep: Deployment) {
        let k = object_key(&dep.metadata);
        self.state.lock().unwrap().deployments.insert(k, dep);
    }

    pub fn remove_config_map(&self, namespace: &str, name: &str) {
        self.state
            .lock()
            .unwrap()
            .config_maps
            .remove(&key(namespace, name));
    }

    /// Number of calls recorded for one operation name.
    pub fn calls(&self, op: &'static str) -> u32 {
        self.state
            .lock()
            .unwrap()
            .calls
            .get(op)
            .copied()
            .unwrap_or(0)
    }

    /// Total create/update/delete calls since the last reset.
    pub fn write_count(&self) -> u32 {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|(op, _)| {
                op.starts_with("create_") || op.starts_with("update_") || op.starts_with("delete_")
            })
            .map(|(_, n)| n)
            .sum()
    }

    /// Clears every recorded call count, reads included.
    pub fn reset_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    /// Makes the next call to `op` fail with `err`.
    pub fn fail_next(&self, op: &'static str, err: StoreError) {
        self.state.lock().unwrap().failures.insert(op, err);
    }
}

fn object_key(meta: &ObjectMeta) -> Key {
    (
        meta.namespace.clone().unwrap_or_else(|| "default".to_string()),
        meta.name.clone().unwrap_or_default(),
    )
}

/// Minimal Deployment fixture with an explicit resource version.
pub fn deployment(name: &str, namespace: &str, resource_version: &str) -> Deployment {
    Deployment {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            resource_version: Some(resource_version.to_string()),
            ..Default::default()
        },
        ..Default::default()
    }
}

#[async_trait]
impl ObjectStore for FakeStore {
    async fn get_frontend_page(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<FrontendPage>, StoreError> {
        let mut st = self.state.lock().unwrap();
        st.record("get_frontend_page")?;
        Ok(st.pages.get(&key(namespace, name)).cloned())
    }

    async fn get_service(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Service>, StoreError> {
        let mut st = self.state.lock().unwrap();
        st.record("get_service")?;
        Ok(st.services.get(&key(namespace, name)).cloned())
    }

    async fn create_service(&self, namespace: &str, svc: &Service) -> Result<Service, StoreError> {
        let mut st = self.state.lock().unwrap();
        st.record("create_service")?;
        let k = key(namespace, &svc.name_any());
        if st.services.contains_key(&k) {
            return Err(StoreError::AlreadyExists);
        }
        let mut created = svc.clone();
        created.metadata.resource_version = Some(st.bump_rv());
        st.services.insert(k, created.clone());
        Ok(created)
    }

    async fn update_service(&self, namespace: &str, svc: &Service) -> Result<Service, StoreError> {
        let mut st = self.state.lock().unwrap();
        st.record("update_service")?;
        let k = key(namespace, &svc.name_any());
        if !st.services.contains_key(&k) {
            return Err(StoreError::NotFound);
        }
        let mut updated = svc.clone();
        updated.metadata.resource_version = Some(st.bump_rv());
        st.services.insert(k, updated.clone());
        Ok(updated)
    }

    async fn get_config_map(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ConfigMap>, StoreError> {
        let mut st = self.state.lock().unwrap();
        st.record("get_config_map")?;
        Ok(st.config_maps.get(&key(namespace, name)).cloned())
    }

    async fn create_config_map(
        &self,
        namespace: &str,
        cm: &ConfigMap,
    ) -> Result<ConfigMap, StoreError> {
        let mut st = self.state.lock().unwrap();
        st.record("create_config_map")?;
        let k = key(namespace, &cm.name_any());
        if st.config_maps.contains_key(&k) {
            return Err(StoreError::AlreadyExists);
        }
        let mut created = cm.clone();
        created.metadata.resource_version = Some(st.bump_rv());
        st.config_maps.insert(k, created.clone());
        Ok(created)
    }

    async fn update_config_map(
        &self,
        namespace: &str,
        cm: &ConfigMap,
    ) -> Result<ConfigMap, StoreError> {
        let mut st = self.state.lock().unwrap();
        st.record("update_config_map")?;
        let k = key(namespace, &cm.name_any());
        if !st.config_maps.contains_key(&k) {
            return Err(StoreError::NotFound);
        }
        let mut updated = cm.clone();
        updated.metadata.resource_version = Some(st.bump_rv());
        st.config_maps.insert(k, updated.clone());
        Ok(updated)
    }

    async fn delete_config_map(&self, namespace: &str, name: &str) -> Result<(), StoreError> {
        let mut st = self.state.lock().unwrap();
        st.record("delete_config_map")?;
        match st.config_maps.remove(&key(namespace, name)) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound),
        }
    }

    async fn get_deployment(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Deployment>, StoreError> {
        let mut st = self.state.lock().unwrap();
        st.record("get_deployment")?;
        Ok(st.deployments.get(&key(namespace, name)).cloned())
    }

    async fn create_deployment(
        &self,
        namespace: &str,
        dep: &Deployment,
    ) -> Result<Deployment, StoreError> {
        let mut st = self.state.lock().unwrap();
        st.record("create_deployment")?;
        let k = key(namespace, &dep.name_any());
        if st.deployments.contains_key(&k) {
            return Err(StoreError::AlreadyExists);
        }
        let mut created = dep.clone();
        created.metadata.resource_version = Some(st.bump_rv());
        st.deployments.insert(k, created.clone());
        Ok(created)
    }

    async fn update_deployment(
        &self,
        namespace: &str,
        dep: &Deployment,
    ) -> Result<Deployment, StoreError> {
        let mut st = self.state.lock().unwrap();
        st.record("update_deployment")?;
        let k = key(namespace, &dep.name_any());
        if !st.deployments.contains_key(&k) {
            return Err(StoreError::NotFound);
        }
        let mut updated = dep.clone();
        updated.metadata.resource_version = Some(st.bump_rv());
        st.deployments.insert(k, updated.clone());
        Ok(updated)
    }

    async fn list_deployments(&self, namespace: &str) -> Result<Vec<Deployment>, StoreError> {
        let mut st = self.state.lock().unwrap();
        st.record("list_deployments")?;
        Ok(st
            .deployments
            .iter()
            .filter(|((ns, _), _)| ns == namespace)
            .map(|(_, dep)| dep.clone())
            .collect())
    }
}
