use std::collections::BTreeMap;

use k8s_outpost_core::{
    resources::{
        crd::v1alpha1::virtual_node::VirtualNode,
        labels::{VIRTUAL_NODE_LABEL, VIRTUAL_NODE_NAMESPACE_LABEL},
    },
    store::ObjectKey,
};
use k8s_openapi::api::apps::v1::Deployment;
use kube::runtime::reflector::ObjectRef;
use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Applied,
    Deleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependentKind {
    Deployment,
    ServiceAccount,
    RoleBinding,
}

/// A change notification on a dependent resource, detached from whatever
/// watch mechanism delivered it.
#[derive(Debug, Clone)]
pub struct DependentEvent {
    pub change: ChangeKind,
    pub kind: DependentKind,
    pub key: ObjectKey,
    pub labels: BTreeMap<String, String>,
}

/// Maps a dependent change back to its owner's reconcile key. The result
/// depends only on the owner labels — a dependent without them is not one
/// this controller manages and maps to nothing.
pub fn map_dependent_event(event: &DependentEvent) -> Option<ObjectKey> {
    let name = event
        .labels
        .get(VIRTUAL_NODE_LABEL)
        .filter(|value| !value.is_empty())?;
    let namespace = event
        .labels
        .get(VIRTUAL_NODE_NAMESPACE_LABEL)
        .filter(|value| !value.is_empty())?;

    Some(ObjectKey::new(namespace, name))
}

pub fn map_node_agent_deployment(deployment: Deployment) -> Option<ObjectRef<VirtualNode>> {
    let key = ObjectKey::new(
        deployment.metadata.namespace.as_deref()?,
        deployment.metadata.name.as_deref()?,
    );
    // the watch stream collapses create/update into a single applied event
    let change = match deployment.metadata.deletion_timestamp {
        Some(_) => ChangeKind::Deleted,
        None => ChangeKind::Applied,
    };
    let event = DependentEvent {
        change,
        kind: DependentKind::Deployment,
        key,
        labels: deployment.metadata.labels.unwrap_or_default(),
    };

    debug!("Mapping a dependent change: {event:?}");

    map_dependent_event(&event)
        .map(|owner| ObjectRef::new(&owner.name).within(&owner.namespace))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use k8s_outpost_core::{
        resources::labels::{get_owner_labels, get_node_agent_labels},
        store::ObjectKey,
    };
    use k8s_openapi::api::apps::v1::Deployment;
    use kube::core::ObjectMeta;

    use super::{
        map_dependent_event, map_node_agent_deployment, ChangeKind, DependentEvent, DependentKind,
    };

    #[test]
    fn owner_labels_map_to_the_owner_key() {
        let owner = ObjectKey::new("default", "vn-a");
        let event = event(ChangeKind::Applied, get_owner_labels(&owner));

        assert_eq!(map_dependent_event(&event), Some(owner));
    }

    #[test]
    fn mapping_ignores_the_change_kind() {
        let owner = ObjectKey::new("default", "vn-a");
        let applied = event(ChangeKind::Applied, get_owner_labels(&owner));
        let deleted = event(ChangeKind::Deleted, get_owner_labels(&owner));

        assert_eq!(map_dependent_event(&applied), map_dependent_event(&deleted));
    }

    #[test]
    fn mapping_ignores_the_dependent_kind() {
        let owner = ObjectKey::new("default", "vn-a");
        let labels = get_owner_labels(&owner);

        for kind in [
            DependentKind::Deployment,
            DependentKind::ServiceAccount,
            DependentKind::RoleBinding,
        ] {
            let mut event = event(ChangeKind::Applied, labels.clone());
            event.kind = kind;

            assert_eq!(map_dependent_event(&event), Some(owner.clone()));
        }
    }

    #[test]
    fn missing_owner_labels_map_to_nothing() {
        let event = event(ChangeKind::Applied, get_node_agent_labels());

        assert_eq!(map_dependent_event(&event), None);
    }

    #[test]
    fn empty_owner_labels_map_to_nothing() {
        let owner = ObjectKey::new("default", "");
        let event = event(ChangeKind::Applied, get_owner_labels(&owner));

        assert_eq!(map_dependent_event(&event), None);
    }

    #[test]
    fn labeled_deployments_map_to_their_owner() {
        let owner = ObjectKey::new("default", "vn-a");
        let deployment = deployment(Some(get_owner_labels(&owner)));

        let reference = map_node_agent_deployment(deployment).unwrap();

        assert_eq!(reference.name, "vn-a");
        assert_eq!(reference.namespace, Some("default".to_owned()));
    }

    #[test]
    fn unlabeled_deployments_map_to_nothing() {
        assert!(map_node_agent_deployment(deployment(None)).is_none());
    }

    fn event(change: ChangeKind, labels: BTreeMap<String, String>) -> DependentEvent {
        DependentEvent {
            change,
            kind: DependentKind::Deployment,
            key: ObjectKey::new("default", "outpost-node-agent-vn-a"),
            labels,
        }
    }

    fn deployment(labels: Option<BTreeMap<String, String>>) -> Deployment {
        Deployment {
            metadata: ObjectMeta {
                name: Some("outpost-node-agent-vn-a".to_owned()),
                namespace: Some("default".to_owned()),
                labels,
                ..Default::default()
            },
            ..Default::default()
        }
    }
}
