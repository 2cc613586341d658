use std::collections::BTreeMap;

use crate::store::ObjectKey;

use super::operator::OPERATOR_RELEASE_NAME;

pub const VIRTUAL_NODE_LABEL: &str = "k8s-outpost.dev/virtual-node";
pub const VIRTUAL_NODE_NAMESPACE_LABEL: &str = "k8s-outpost.dev/virtual-node-namespace";

pub fn get_node_agent_labels() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("app.kubernetes.io/name".to_owned(), "k8s-outpost".to_owned()),
        ("app.kubernetes.io/component".to_owned(), "node-agent".to_owned()),
        ("app.kubernetes.io/managed-by".to_owned(), OPERATOR_RELEASE_NAME.to_owned()),
    ])
}

pub fn get_joined_node_agent_labels() -> String {
    "app.kubernetes.io/component=node-agent,\
    app.kubernetes.io/managed-by=k8s-outpost-operator,\
    app.kubernetes.io/name=k8s-outpost"
        .to_owned()
}

pub fn get_owner_labels(owner: &ObjectKey) -> BTreeMap<String, String> {
    let mut labels = get_node_agent_labels();
    labels.insert(VIRTUAL_NODE_LABEL.to_owned(), owner.name.to_owned());
    labels.insert(
        VIRTUAL_NODE_NAMESPACE_LABEL.to_owned(),
        owner.namespace.to_owned(),
    );

    labels
}

pub fn get_joined_owner_labels(owner: &ObjectKey) -> String {
    format!(
        "{},{VIRTUAL_NODE_LABEL}={},{VIRTUAL_NODE_NAMESPACE_LABEL}={}",
        get_joined_node_agent_labels(),
        owner.name,
        owner.namespace
    )
}
