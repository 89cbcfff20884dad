//! FrontendPage custom resource definition.
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Serialize, Deserialize, Debug, Clone, JsonSchema, PartialEq)]
#[kube(
    group = "frontend.dev",
    version = "v1alpha1",
    kind = "FrontendPage",
    plural = "frontendpages",
    shortname = "fp",
    namespaced,
    status = "FrontendPageStatus",
    printcolumn = r#"{"name":"Status","type":"string","jsonPath":".status.conditions[?(@.type=='Ready')].status"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
pub struct FrontendPageSpec {
    /// Raw HTML payload mounted into the page container.
    pub content: String,
    /// Container image serving the page.
    pub image: String,
    /// Desired pod count. Bounds are enforced by the API server at admission.
    #[schemars(range(min = 0))]
    pub replicas: i32,
    /// Service port and container target port.
    #[schemars(range(min = 1, max = 65535))]
    pub port: i32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, JsonSchema, PartialEq)]
pub struct FrontendPageStatus {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<PageCondition>,
}

/// Free-form condition record; the reconcile core does not validate these.
#[derive(Serialize, Deserialize, Debug, Clone, JsonSchema, PartialEq)]
pub struct PageCondition {
    #[serde(rename = "type")]
    pub type_: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}
