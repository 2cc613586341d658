use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const CLEANUP_FINALIZER: &str = "virtualnodes.k8s-outpost.dev/cleanup";

#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, JsonSchema)]
#[kube(
    group = "k8s-outpost.dev",
    version = "v1alpha1",
    kind = "VirtualNode",
    namespaced,
    status = "VirtualNodeStatus"
)]
pub struct VirtualNodeSpec {
    /// identifier of the remote cluster this node represents
    pub cluster_id: String,
    /// address of the remote cluster endpoint
    pub endpoint: String,
    /// node agent image override (the operator release default is used when unset)
    pub agent_image: Option<String>,
    /// node agent replica count (1 when unset)
    pub replicas: Option<i32>,
    /// extra labels handed over to the provisioned node
    pub node_labels: Option<BTreeMap<String, String>>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema, PartialEq)]
pub struct VirtualNodeStatus {
    /// virtual node state
    pub state: VirtualNodeState,
    /// dependent resource conditions
    pub conditions: Option<Vec<VirtualNodeCondition>>,
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, JsonSchema, PartialEq, Eq)]
pub enum VirtualNodeState {
    #[default]
    Unknown,
    Provisioned,
    ErrorInvalidSpec,
    ErrorInsufficientPermissions,
    UnknownError,
}

#[derive(Deserialize, Serialize, Clone, Debug, JsonSchema, PartialEq)]
pub struct VirtualNodeCondition {
    #[serde(rename = "type")]
    pub condition_type: VirtualNodeConditionType,
    pub status: ConditionStatus,
    pub reason: Option<String>,
    pub message: Option<String>,
    pub last_transition_time: Option<DateTime<Utc>>,
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, JsonSchema, PartialEq, Eq)]
pub enum VirtualNodeConditionType {
    DependentsReady,
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, JsonSchema, PartialEq, Eq)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

impl VirtualNode {
    pub fn has_cleanup_finalizer(&self) -> bool {
        self.metadata
            .finalizers
            .as_ref()
            .map(|finalizers| finalizers.iter().any(|marker| marker == CLEANUP_FINALIZER))
            .unwrap_or(false)
    }

    pub fn is_terminating(&self) -> bool {
        self.metadata.deletion_timestamp.is_some()
    }

    pub fn add_cleanup_finalizer(&mut self) {
        if self.has_cleanup_finalizer() {
            return;
        }

        self.metadata
            .finalizers
            .get_or_insert_with(Vec::new)
            .push(CLEANUP_FINALIZER.to_owned());
    }

    pub fn remove_cleanup_finalizer(&mut self) {
        if let Some(finalizers) = self.metadata.finalizers.as_mut() {
            finalizers.retain(|marker| marker != CLEANUP_FINALIZER);
        }
    }
}

impl VirtualNodeStatus {
    pub fn provisioned(now: DateTime<Utc>) -> Self {
        Self {
            state: VirtualNodeState::Provisioned,
            conditions: Some(vec![VirtualNodeCondition {
                condition_type: VirtualNodeConditionType::DependentsReady,
                status: ConditionStatus::True,
                reason: Some("DependentsApplied".to_owned()),
                message: Some("Node agent resources match the desired state".to_owned()),
                last_transition_time: Some(now),
            }]),
        }
    }

    pub fn degraded(state: VirtualNodeState, message: &str, now: DateTime<Utc>) -> Self {
        Self {
            state,
            conditions: Some(vec![VirtualNodeCondition {
                condition_type: VirtualNodeConditionType::DependentsReady,
                status: ConditionStatus::False,
                reason: Some("ReconcileFailed".to_owned()),
                message: Some(message.to_owned()),
                last_transition_time: Some(now),
            }]),
        }
    }

    /// Compares two statuses ignoring condition transition times, so a status
    /// write happens only on a material change.
    pub fn matches(&self, other: &Self) -> bool {
        if self.state != other.state {
            return false;
        }

        let own_conditions = self.conditions.as_deref().unwrap_or_default();
        let other_conditions = other.conditions.as_deref().unwrap_or_default();

        if own_conditions.len() != other_conditions.len() {
            return false;
        }

        own_conditions
            .iter()
            .zip(other_conditions)
            .all(|(own, other)| {
                own.condition_type == other.condition_type
                    && own.status == other.status
                    && own.reason == other.reason
                    && own.message == other.message
            })
    }

    /// Carries over the previous transition time for every condition whose
    /// status value did not change.
    pub fn preserving_transition_times(mut self, previous: &Self) -> Self {
        let previous_conditions = previous.conditions.as_deref().unwrap_or_default();

        if let Some(conditions) = self.conditions.as_mut() {
            for condition in conditions {
                let unchanged = previous_conditions.iter().find(|previous| {
                    previous.condition_type == condition.condition_type
                        && previous.status == condition.status
                });

                if let Some(previous) = unchanged {
                    condition.last_transition_time = previous.last_transition_time;
                }
            }
        }

        self
    }
}
