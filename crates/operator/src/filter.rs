//! Event filter for the Deployment watch. Structured as a pluggable
//! predicate so a future policy can suppress no-op events; the shipped
//! policy logs every event and admits it.
use tracing::info;

pub trait EventFilter: Send + Sync {
    fn admit_create(&self, namespace: &str, name: &str) -> bool;
    fn admit_update(&self, namespace: &str, name: &str) -> bool;
    fn admit_delete(&self, namespace: &str, name: &str) -> bool;
    fn admit_generic(&self, namespace: &str, name: &str) -> bool;
}

pub struct LogAndAdmit;

impl EventFilter for LogAndAdmit {
    fn admit_create(&self, namespace: &str, name: &str) -> bool {
        info!(namespace = %namespace, name = %name, "deployment created");
        true
    }

    fn admit_update(&self, namespace: &str, name: &str) -> bool {
        info!(namespace = %namespace, name = %name, "deployment updated");
        true
    }

    fn admit_delete(&self, namespace: &str, name: &str) -> bool {
        info!(namespace = %namespace, name = %name, "deployment deleted");
        true
    }

    fn admit_generic(&self, namespace: &str, name: &str) -> bool {
        info!(namespace = %namespace, name = %name, "deployment generic event");
        true
    }
}
