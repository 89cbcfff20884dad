//! Owner-reference linking. Stamping the owning FrontendPage onto a built
//! object delegates cascading deletion to the cluster garbage collector.
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use kube::{Resource, ResourceExt};

use crate::crd::FrontendPage;
use crate::error::Error;

/// Controller owner reference for a FrontendPage. Fails when the page has no
/// name or uid yet (the object never round-tripped through the API server).
pub fn owner_reference(page: &FrontendPage) -> Result<OwnerReference, Error> {
    page.controller_owner_ref(&())
        .ok_or_else(|| Error::MissingOwnerRef(page.name_any()))
}

pub fn attach(meta: &mut ObjectMeta, owner: &OwnerReference) {
    meta.owner_references = Some(vec![owner.clone()]);
}
