use std::fmt::Debug;

use async_trait::async_trait;
use k8s_openapi::NamespaceResourceScope;
use kube::{
    api::{DeleteParams, ListParams, Patch, PatchParams, PostParams},
    Api, Client, Resource,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;

use crate::resources::crd::v1alpha1::virtual_node::VirtualNode;

use super::{ObjectKey, ObjectStore, StatusStore, StoreError};

/// Store implementation backed by the cluster API server.
#[derive(Clone)]
pub struct ClientStore {
    client: Client,
}

impl ClientStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn namespaced_api<K>(&self, namespace: &str) -> Api<K>
    where
        K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>,
    {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl<K> ObjectStore<K> for ClientStore
where
    K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
        + Clone
        + DeserializeOwned
        + Serialize
        + Debug
        + Send
        + Sync,
{
    async fn get(&self, key: &ObjectKey) -> Result<Option<K>, StoreError> {
        self.namespaced_api::<K>(&key.namespace)
            .get_opt(&key.name)
            .await
            .map_err(|error| classify_error(error, key))
    }

    async fn list(&self, namespace: &str, label_selector: &str) -> Result<Vec<K>, StoreError> {
        let list_params = ListParams::default().labels(label_selector);

        Ok(self
            .namespaced_api::<K>(namespace)
            .list(&list_params)
            .await
            .map_err(|error| classify_error(error, &ObjectKey::new(namespace, "")))?
            .items)
    }

    async fn create(&self, object: &K) -> Result<K, StoreError> {
        let key = metadata_key(object);

        self.namespaced_api::<K>(&key.namespace)
            .create(&PostParams::default(), object)
            .await
            .map_err(|error| classify_error(error, &key))
    }

    async fn update(&self, object: &K) -> Result<K, StoreError> {
        let key = metadata_key(object);

        self.namespaced_api::<K>(&key.namespace)
            .replace(&key.name, &PostParams::default(), object)
            .await
            .map_err(|error| classify_error(error, &key))
    }

    async fn delete(&self, key: &ObjectKey) -> Result<(), StoreError> {
        self.namespaced_api::<K>(&key.namespace)
            .delete(&key.name, &DeleteParams::default())
            .await
            .map(|_| ())
            .map_err(|error| classify_error(error, key))
    }
}

#[async_trait]
impl StatusStore<VirtualNode> for ClientStore {
    async fn update_status(&self, object: &VirtualNode) -> Result<VirtualNode, StoreError> {
        let key = metadata_key(object);
        let patch = Patch::Merge(json!({ "status": &object.status }));

        self.namespaced_api::<VirtualNode>(&key.namespace)
            .patch_status(&key.name, &PatchParams::default(), &patch)
            .await
            .map_err(|error| classify_error(error, &key))
    }
}

fn metadata_key<K: Resource>(object: &K) -> ObjectKey {
    ObjectKey::new(
        object.meta().namespace.as_deref().unwrap_or_default(),
        object.meta().name.as_deref().unwrap_or_default(),
    )
}

fn classify_error(error: kube::Error, key: &ObjectKey) -> StoreError {
    match error {
        kube::Error::Api(response) if response.code == 404 => StoreError::NotFound(key.clone()),
        kube::Error::Api(response) if response.code == 409 => StoreError::Conflict(key.clone()),
        error => StoreError::Unavailable(key.clone(), error),
    }
}

#[cfg(test)]
mod tests {
    use kube::core::ErrorResponse;

    use crate::store::{ObjectKey, StoreError};

    use super::classify_error;

    #[test]
    fn missing_objects_classify_as_not_found() {
        let error = api_error(404, "NotFound");

        let classified = classify_error(error, &key());

        assert!(matches!(classified, StoreError::NotFound(_)));
        assert!(!classified.is_retryable());
    }

    #[test]
    fn write_collisions_classify_as_conflict() {
        let error = api_error(409, "Conflict");

        let classified = classify_error(error, &key());

        assert!(matches!(classified, StoreError::Conflict(_)));
        assert!(classified.is_retryable());
    }

    #[test]
    fn other_api_failures_classify_as_unavailable() {
        let error = api_error(500, "InternalError");

        let classified = classify_error(error, &key());

        assert!(matches!(classified, StoreError::Unavailable(_, _)));
        assert!(classified.is_retryable());
    }

    fn key() -> ObjectKey {
        ObjectKey::new("default", "vn-a")
    }

    fn api_error(code: u16, reason: &str) -> kube::Error {
        kube::Error::Api(ErrorResponse {
            status: "Failure".to_owned(),
            message: reason.to_owned(),
            reason: reason.to_owned(),
            code,
        })
    }
}
