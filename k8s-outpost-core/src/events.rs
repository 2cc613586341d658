use async_trait::async_trait;
use k8s_openapi::api::core::v1::ObjectReference;
use kube::{
    runtime::events::{Event, EventType, Recorder, Reporter},
    Client, Resource,
};
use log::warn;

use crate::{
    resources::crd::v1alpha1::virtual_node::VirtualNode,
    store::ObjectKey,
};

/// Cluster events the operator emits on a `VirtualNode`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutpostEvent {
    DependentsApplied,
    CleanedUp,
    ReconcileFailed(String),
}

impl OutpostEvent {
    fn to_cluster_event(&self) -> Event {
        match self {
            OutpostEvent::DependentsApplied => Event {
                type_: EventType::Normal,
                reason: "DependentsApplied".to_owned(),
                note: Some("Node agent resources were applied to the cluster".to_owned()),
                action: "Reconcile".to_owned(),
                secondary: None,
            },
            OutpostEvent::CleanedUp => Event {
                type_: EventType::Normal,
                reason: "CleanedUp".to_owned(),
                note: Some("Node agent resources were removed from the cluster".to_owned()),
                action: "Cleanup".to_owned(),
                secondary: None,
            },
            OutpostEvent::ReconcileFailed(reason) => Event {
                type_: EventType::Warning,
                reason: "ReconcileFailed".to_owned(),
                note: Some(reason.to_owned()),
                action: "Reconcile".to_owned(),
                secondary: None,
            },
        }
    }
}

/// Fire-and-forget event publication. Implementations log failures and never
/// propagate them; a dropped event must not fail a reconcile pass.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn publish(&self, key: &ObjectKey, event: OutpostEvent);
}

pub struct ClientEventSink {
    client: Client,
    reporter: Reporter,
}

impl ClientEventSink {
    pub fn new(client: Client, controller_name: &str) -> Self {
        Self {
            client,
            reporter: Reporter {
                controller: controller_name.to_owned(),
                instance: None,
            },
        }
    }
}

#[async_trait]
impl EventSink for ClientEventSink {
    async fn publish(&self, key: &ObjectKey, event: OutpostEvent) {
        let reference = ObjectReference {
            api_version: Some(VirtualNode::api_version(&()).into_owned()),
            kind: Some(VirtualNode::kind(&()).into_owned()),
            name: Some(key.name.to_owned()),
            namespace: Some(key.namespace.to_owned()),
            ..Default::default()
        };
        let recorder = Recorder::new(self.client.clone(), self.reporter.clone(), reference);

        if let Err(error) = recorder.publish(event.to_cluster_event()).await {
            warn!("Couldn't publish a cluster event for '{key}'! Reason: {error:?}");
        }
    }
}
