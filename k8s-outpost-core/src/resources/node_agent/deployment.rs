use k8s_openapi::{
    api::{
        apps::v1::{Deployment, DeploymentSpec},
        core::v1::{
            Container, EnvVar, EnvVarSource, ObjectFieldSelector, PodSpec, PodTemplateSpec,
            ServiceAccount,
        },
    },
    apimachinery::pkg::apis::meta::v1::LabelSelector,
};
use kube::core::ObjectMeta;

use crate::{helpers::RequireMetadata, resources::ResourceGenerationError};

use super::NodeAgentRelease;

impl NodeAgentRelease {
    pub fn generate_deployment(
        &self,
        account: &ServiceAccount,
    ) -> Result<Deployment, ResourceGenerationError> {
        let metadata = self.generate_metadata();
        let labels = metadata.labels.to_owned();
        let metadata_name = self.get_name();
        let account_name = account
            .require_name_or(ResourceGenerationError::DependentMissingMetadataName)?
            .to_owned();

        Ok(Deployment {
            metadata,
            spec: Some(DeploymentSpec {
                replicas: Some(self.replicas),
                selector: LabelSelector {
                    match_expressions: None,
                    match_labels: labels.to_owned(),
                },
                template: PodTemplateSpec {
                    metadata: Some(ObjectMeta {
                        labels,
                        ..Default::default()
                    }),
                    spec: Some(PodSpec {
                        automount_service_account_token: Some(true),
                        service_account_name: Some(account_name),
                        containers: vec![Container {
                            env: Some(self.generate_agent_env()),
                            image: Some(self.agent_image.to_owned()),
                            image_pull_policy: Some("Always".to_owned()),
                            name: metadata_name,
                            ..Default::default()
                        }],
                        ..Default::default()
                    }),
                },
                ..Default::default()
            }),
            ..Default::default()
        })
    }

    fn generate_agent_env(&self) -> Vec<EnvVar> {
        let node_labels = self
            .node_labels
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<String>>()
            .join(",");

        vec![
            plain_env("VIRTUAL_NODE_NAME", &self.name),
            plain_env("VIRTUAL_NODE_NAMESPACE", &self.namespace),
            plain_env("REMOTE_ENDPOINT", &self.endpoint),
            plain_env("CLUSTER_ID", &self.cluster_id),
            plain_env("NODE_LABELS", &node_labels),
            downward_env("POD_IP", "status.podIP"),
            downward_env("NODE_NAME", "spec.nodeName"),
        ]
    }
}

fn plain_env(name: &str, value: &str) -> EnvVar {
    EnvVar {
        name: name.to_owned(),
        value: Some(value.to_owned()),
        ..Default::default()
    }
}

fn downward_env(name: &str, field_path: &str) -> EnvVar {
    EnvVar {
        name: name.to_owned(),
        value_from: Some(EnvVarSource {
            field_ref: Some(ObjectFieldSelector {
                field_path: field_path.to_owned(),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}
