use k8s_openapi::api::{
    core::v1::ServiceAccount,
    rbac::v1::{RoleBinding, RoleRef, Subject},
};

use crate::{
    helpers::RequireMetadata, resources::ResourceGenerationError, NODE_AGENT_CLUSTERROLE_NAME,
};

use super::NodeAgentRelease;

impl NodeAgentRelease {
    pub fn generate_service_account(&self) -> ServiceAccount {
        ServiceAccount {
            metadata: self.generate_metadata(),
            automount_service_account_token: Some(true),
            ..Default::default()
        }
    }

    pub fn generate_role_binding(
        &self,
        account: &ServiceAccount,
    ) -> Result<RoleBinding, ResourceGenerationError> {
        Ok(RoleBinding {
            metadata: self.generate_metadata(),
            role_ref: RoleRef {
                kind: "ClusterRole".to_owned(),
                name: NODE_AGENT_CLUSTERROLE_NAME.to_owned(),
                ..Default::default()
            },
            subjects: Some(vec![Subject {
                kind: "ServiceAccount".to_owned(),
                name: account
                    .require_name_or(ResourceGenerationError::DependentMissingMetadataName)?
                    .to_owned(),
                namespace: Some(
                    account
                        .require_namespace_or(
                            ResourceGenerationError::DependentMissingMetadataNamespace,
                        )?
                        .to_owned(),
                ),
                ..Default::default()
            }]),
        })
    }
}
