use std::collections::BTreeMap;

use derive_builder::Builder;
use k8s_openapi::api::{
    apps::v1::Deployment,
    core::v1::ServiceAccount,
    rbac::v1::RoleBinding,
};
use kube::core::ObjectMeta;
use thiserror::Error;

use crate::{
    helpers::RequireMetadata,
    store::ObjectKey,
};

use super::{
    crd::v1alpha1::virtual_node::VirtualNode, labels::get_owner_labels, operator::OperatorRelease,
    ResourceGenerationError,
};

pub mod deployment;
pub mod rbac;

/// Fully resolved parameters from which the node agent manifests are forged.
/// Construction is the only place the virtual node spec and the operator
/// release meet; everything downstream is a pure function of this struct.
#[derive(Debug, Clone, Builder)]
pub struct NodeAgentRelease {
    pub name: String,
    pub namespace: String,
    pub cluster_id: String,
    pub endpoint: String,
    pub agent_image: String,
    pub replicas: i32,
    pub node_labels: BTreeMap<String, String>,
}

#[derive(Debug, Error)]
pub enum NodeAgentReleaseValidationError {
    #[error("The remote endpoint is empty!")]
    EmptyEndpoint,
    #[error("The replica count ({}) is negative!", .0)]
    NegativeReplicaCount(i32),
}

pub struct NodeAgentDependents {
    pub service_account: ServiceAccount,
    pub role_binding: RoleBinding,
    pub deployment: Deployment,
}

impl NodeAgentReleaseBuilder {
    pub fn with_operator(&mut self, release: &OperatorRelease) -> &mut Self {
        self.agent_image(release.get_agent_image())
    }

    pub fn with_virtual_node(
        &mut self,
        virtual_node: &VirtualNode,
    ) -> Result<&mut Self, ResourceGenerationError> {
        let name = virtual_node
            .require_name_or(ResourceGenerationError::MissingData("metadata.name".into()))?
            .to_owned();
        let namespace = virtual_node
            .require_namespace_or(ResourceGenerationError::MissingData(
                "metadata.namespace".into(),
            ))?
            .to_owned();
        let spec = &virtual_node.spec;

        self.name(name)
            .namespace(namespace)
            .cluster_id(spec.cluster_id.to_owned())
            .endpoint(spec.endpoint.to_owned())
            .replicas(spec.replicas.unwrap_or(1))
            .node_labels(spec.node_labels.clone().unwrap_or_default());

        if let Some(image) = &spec.agent_image {
            self.agent_image(image.to_owned());
        }

        Ok(self)
    }
}

impl NodeAgentRelease {
    pub fn validated(self) -> Result<Self, NodeAgentReleaseValidationError> {
        if self.endpoint.is_empty() {
            return Err(NodeAgentReleaseValidationError::EmptyEndpoint);
        }

        if self.replicas < 0 {
            return Err(NodeAgentReleaseValidationError::NegativeReplicaCount(
                self.replicas,
            ));
        }

        Ok(self)
    }

    pub fn get_name(&self) -> String {
        format!("outpost-node-agent-{}", self.name)
    }

    pub fn get_owner_key(&self) -> ObjectKey {
        ObjectKey::new(&self.namespace, &self.name)
    }

    pub fn generate_metadata(&self) -> ObjectMeta {
        ObjectMeta {
            labels: Some(get_owner_labels(&self.get_owner_key())),
            namespace: Some(self.namespace.to_owned()),
            name: Some(self.get_name()),
            ..Default::default()
        }
    }

    pub fn generate_dependents(&self) -> Result<NodeAgentDependents, ResourceGenerationError> {
        let service_account = self.generate_service_account();
        let role_binding = self.generate_role_binding(&service_account)?;
        let deployment = self.generate_deployment(&service_account)?;

        Ok(NodeAgentDependents {
            service_account,
            role_binding,
            deployment,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use kube::core::ObjectMeta;
    use serde_json::Value;

    use crate::resources::{
        crd::v1alpha1::virtual_node::{VirtualNode, VirtualNodeSpec},
        labels::{VIRTUAL_NODE_LABEL, VIRTUAL_NODE_NAMESPACE_LABEL},
        operator::OperatorRelease,
    };

    use super::{NodeAgentRelease, NodeAgentReleaseBuilder, NodeAgentReleaseValidationError};

    #[test]
    fn forged_manifests_are_deterministic() {
        let release = release(1);

        let first = serde_json::to_value(release.generate_dependents().unwrap().deployment).unwrap();
        let second =
            serde_json::to_value(release.generate_dependents().unwrap().deployment).unwrap();

        assert_eq!(first, second);

        let first = serde_json::to_value(release.generate_dependents().unwrap().role_binding).unwrap();
        let second =
            serde_json::to_value(release.generate_dependents().unwrap().role_binding).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn replica_count_is_the_only_difference_between_replica_variants() {
        let first =
            serde_json::to_value(release(1).generate_dependents().unwrap().deployment).unwrap();
        let mut second =
            serde_json::to_value(release(3).generate_dependents().unwrap().deployment).unwrap();

        assert_eq!(second["spec"]["replicas"], Value::from(3));

        second["spec"]["replicas"] = Value::from(1);

        assert_eq!(first, second);
    }

    #[test]
    fn all_dependents_carry_the_owner_labels() {
        let dependents = release(1).generate_dependents().unwrap();
        let all_metadata = [
            dependents.service_account.metadata,
            dependents.role_binding.metadata,
            dependents.deployment.metadata,
        ];

        for metadata in all_metadata {
            let labels = metadata.labels.unwrap();

            assert_eq!(labels.get(VIRTUAL_NODE_LABEL), Some(&"vn-a".to_owned()));
            assert_eq!(
                labels.get(VIRTUAL_NODE_NAMESPACE_LABEL),
                Some(&"default".to_owned())
            );
            assert_eq!(metadata.name, Some("outpost-node-agent-vn-a".to_owned()));
        }
    }

    #[test]
    fn role_binding_subject_points_at_the_service_account() {
        let dependents = release(1).generate_dependents().unwrap();
        let subject = &dependents.role_binding.subjects.unwrap()[0];

        assert_eq!(subject.kind, "ServiceAccount");
        assert_eq!(subject.name, "outpost-node-agent-vn-a");
        assert_eq!(subject.namespace, Some("default".to_owned()));
    }

    #[test]
    fn deployment_runs_under_the_service_account() {
        let dependents = release(1).generate_dependents().unwrap();
        let pod_spec = dependents
            .deployment
            .spec
            .unwrap()
            .template
            .spec
            .unwrap();

        assert_eq!(
            pod_spec.service_account_name,
            Some("outpost-node-agent-vn-a".to_owned())
        );
    }

    #[test]
    fn spec_image_overrides_the_operator_default() {
        let mut virtual_node = virtual_node(1);
        virtual_node.spec.agent_image = Some("registry.local/custom-agent:v9".to_owned());

        let release = NodeAgentReleaseBuilder::default()
            .with_operator(&operator_release())
            .with_virtual_node(&virtual_node)
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(release.agent_image, "registry.local/custom-agent:v9");
    }

    #[test]
    fn empty_endpoint_fails_validation() {
        let mut virtual_node = virtual_node(1);
        virtual_node.spec.endpoint = String::new();

        let result = build_release(&virtual_node).validated();

        assert!(matches!(
            result,
            Err(NodeAgentReleaseValidationError::EmptyEndpoint)
        ));
    }

    #[test]
    fn negative_replica_count_fails_validation() {
        let virtual_node = virtual_node(-2);

        let result = build_release(&virtual_node).validated();

        assert!(matches!(
            result,
            Err(NodeAgentReleaseValidationError::NegativeReplicaCount(-2))
        ));
    }

    fn release(replicas: i32) -> NodeAgentRelease {
        build_release(&virtual_node(replicas)).validated().unwrap()
    }

    fn build_release(virtual_node: &VirtualNode) -> NodeAgentRelease {
        NodeAgentReleaseBuilder::default()
            .with_operator(&operator_release())
            .with_virtual_node(virtual_node)
            .unwrap()
            .build()
            .unwrap()
    }

    fn operator_release() -> OperatorRelease {
        OperatorRelease {
            agent_image_name: "registry.local/outpost-node-agent".to_owned(),
            agent_image_tag: "v1".to_owned(),
        }
    }

    fn virtual_node(replicas: i32) -> VirtualNode {
        VirtualNode {
            metadata: ObjectMeta {
                name: Some("vn-a".to_owned()),
                namespace: Some("default".to_owned()),
                ..Default::default()
            },
            spec: VirtualNodeSpec {
                cluster_id: "remote-1".to_owned(),
                endpoint: "https://10.0.0.1:6443".to_owned(),
                agent_image: None,
                replicas: Some(replicas),
                node_labels: Some(BTreeMap::from([(
                    "topology.kubernetes.io/region".to_owned(),
                    "remote".to_owned(),
                )])),
            },
            status: None,
        }
    }
}
