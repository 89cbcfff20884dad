//! Desired-state builders: pure mappings from a FrontendPage spec to the
//! object bodies the reconciler converges. No I/O, no validation.
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    ConfigMap, ConfigMapVolumeSource, Container, PodSpec, PodTemplateSpec, Service, ServicePort,
    ServiceSpec, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::ResourceExt;

use crate::crd::FrontendPage;

/// Volume name backing the page content inside the pod.
pub const CONTENT_VOLUME: &str = "content";
/// Mount path of the content volume inside the page container.
pub const CONTENT_MOUNT_PATH: &str = "/data";

fn app_labels(name: &str) -> BTreeMap<String, String> {
    BTreeMap::from([("app".to_string(), name.to_string())])
}

pub fn config_map(page: &FrontendPage) -> ConfigMap {
    ConfigMap {
        metadata: ObjectMeta {
            name: Some(page.name_any()),
            namespace: page.namespace(),
            ..Default::default()
        },
        data: Some(BTreeMap::from([(
            "content".to_string(),
            page.spec.content.clone(),
        )])),
        ..Default::default()
    }
}

pub fn service(page: &FrontendPage) -> Service {
    let name = page.name_any();
    Service {
        metadata: ObjectMeta {
            name: Some(name.clone()),
            namespace: page.namespace(),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            selector: Some(app_labels(&name)),
            ports: Some(vec![ServicePort {
                name: Some("http".to_string()),
                port: page.spec.port,
                target_port: Some(IntOrString::Int(page.spec.port)),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn deployment(page: &FrontendPage) -> Deployment {
    let name = page.name_any();
    let labels = app_labels(&name);
    Deployment {
        metadata: ObjectMeta {
            name: Some(name.clone()),
            namespace: page.namespace(),
            ..Default::default()
        },
        spec: Some(DeploymentSpec {
            replicas: Some(page.spec.replicas),
            selector: LabelSelector {
                match_labels: Some(labels.clone()),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(labels),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    containers: vec![Container {
                        name: name.clone(),
                        image: Some(page.spec.image.clone()),
                        volume_mounts: Some(vec![VolumeMount {
                            name: CONTENT_VOLUME.to_string(),
                            mount_path: CONTENT_MOUNT_PATH.to_string(),
                            ..Default::default()
                        }]),
                        ..Default::default()
                    }],
                    volumes: Some(vec![Volume {
                        name: CONTENT_VOLUME.to_string(),
                        config_map: Some(ConfigMapVolumeSource {
                            name: Some(name),
                            ..Default::default()
                        }),
                        ..Default::default()
                    }]),
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Companion ConfigMap the shadow informer mirrors Deployment lifecycle into.
/// The timestamp is passed in so the mapping stays deterministic.
pub fn shadow_config_map(
    deployment_name: &str,
    namespace: &str,
    count: u64,
    now: DateTime<Utc>,
) -> ConfigMap {
    ConfigMap {
        metadata: ObjectMeta {
            name: Some(deployment_name.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        data: Some(BTreeMap::from([
            ("deploymentName".to_string(), deployment_name.to_string()),
            ("updatedAt".to_string(), now.to_rfc3339()),
            ("updateCount".to_string(), count.to_string()),
        ])),
        ..Default::default()
    }
}
