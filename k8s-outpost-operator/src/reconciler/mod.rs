use k8s_outpost_core::{helpers::RequireMetadata, store::ObjectKey};
use kube::Resource;

use self::error::ReconcilerError;

pub mod context;
pub mod error;
pub mod virtual_node;


pub fn object_key<K: Resource>(object: &K) -> Result<ObjectKey, ReconcilerError> {
    Ok(ObjectKey::new(
        object.require_namespace_or(ReconcilerError::MissingObjectMetadata)?,
        object.require_name_or(ReconcilerError::MissingObjectMetadata)?,
    ))
}
