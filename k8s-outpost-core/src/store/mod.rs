use std::fmt::Display;

use async_trait::async_trait;
use k8s_openapi::api::{
    apps::v1::Deployment,
    core::v1::ServiceAccount,
    rbac::v1::RoleBinding,
};
use thiserror::Error;

use crate::resources::crd::v1alpha1::virtual_node::VirtualNode;

pub mod client;

/// Identity of an object in the store, the unit the reconcile queue
/// deduplicates on.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectKey {
    pub namespace: String,
    pub name: String,
}

impl ObjectKey {
    pub fn new(namespace: &str, name: &str) -> Self {
        Self {
            namespace: namespace.to_owned(),
            name: name.to_owned(),
        }
    }
}

impl Display for ObjectKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("'{}' was not found in the store!", .0)]
    NotFound(ObjectKey),
    #[error("'{}' was modified concurrently!", .0)]
    Conflict(ObjectKey),
    #[error("Couldn't reach the store for '{}'! Reason: {}", .0, .1)]
    Unavailable(ObjectKey, kube::Error),
}

impl StoreError {
    pub fn is_retryable(&self) -> bool {
        !matches!(self, StoreError::NotFound(_))
    }
}

/// Typed access to one kind of object in the cluster store. Absence on `get`
/// is a state, not an error; `delete` reports it as `StoreError::NotFound` so
/// callers can decide whether "already gone" is acceptable.
#[async_trait]
pub trait ObjectStore<K>: Send + Sync {
    async fn get(&self, key: &ObjectKey) -> Result<Option<K>, StoreError>;
    async fn list(&self, namespace: &str, label_selector: &str) -> Result<Vec<K>, StoreError>;
    async fn create(&self, object: &K) -> Result<K, StoreError>;
    async fn update(&self, object: &K) -> Result<K, StoreError>;
    async fn delete(&self, key: &ObjectKey) -> Result<(), StoreError>;
}

#[async_trait]
pub trait StatusStore<K>: Send + Sync {
    async fn update_status(&self, object: &K) -> Result<K, StoreError>;
}

/// Everything the reconciler needs from the store, in one bound.
pub trait ResourceStore:
    ObjectStore<VirtualNode>
    + ObjectStore<Deployment>
    + ObjectStore<ServiceAccount>
    + ObjectStore<RoleBinding>
    + StatusStore<VirtualNode>
    + Send
    + Sync
{
}

impl<T> ResourceStore for T where
    T: ObjectStore<VirtualNode>
        + ObjectStore<Deployment>
        + ObjectStore<ServiceAccount>
        + ObjectStore<RoleBinding>
        + StatusStore<VirtualNode>
        + Send
        + Sync
{
}
