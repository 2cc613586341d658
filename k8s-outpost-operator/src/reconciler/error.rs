use k8s_outpost_core::{
    resources::{
        node_agent::{NodeAgentReleaseBuilderError, NodeAgentReleaseValidationError},
        ResourceGenerationError,
    },
    store::StoreError,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcilerError {
    #[error("Object is missing metadata!")]
    MissingObjectMetadata,
    #[error("Couldn't access the resource store! Reason: {}", .0)]
    StoreError(StoreError),
    #[error("Couldn't prepare a node agent release! Reason: {}", .0)]
    NodeAgentReleaseBuilderError(NodeAgentReleaseBuilderError),
    #[error("Couldn't generate a release resource! Reason: {}", .0)]
    NodeAgentReleaseResourceError(ResourceGenerationError),
    #[error("The release resource is invalid! Details: {}", .0)]
    NodeAgentReleaseValidationError(NodeAgentReleaseValidationError),
    #[error("Couldn't serialize a resource for comparison! Reason: {}", .0)]
    SerializationError(serde_json::Error),
}
