use std::sync::Arc;

use futures::StreamExt;
use k8s_outpost_core::{
    resources::{crd::v1alpha1::virtual_node::VirtualNode, labels::get_joined_node_agent_labels},
    store::client::ClientStore,
};
use k8s_openapi::api::apps::v1::Deployment;
use kube::{
    runtime::{watcher::Config, Controller},
    Api, Client,
};
use log::info;

use crate::{
    controller::mapper::map_node_agent_deployment,
    helpers::log_reconciliation_outcome,
    reconciler::{
        context::ReconcilerContext,
        virtual_node::{reconcile_virtual_node, reconcile_virtual_node_error},
    },
};

pub mod mapper;

pub async fn start_virtual_node_controller(
    client: Client,
    context: Arc<ReconcilerContext<ClientStore>>,
) {
    info!("Creating virtual node controller...");

    let dependent_watcher_config = Config::default().labels(&get_joined_node_agent_labels());
    let controller = Controller::new(Api::<VirtualNode>::all(client.clone()), Config::default())
        .watches(
            Api::<Deployment>::all(client),
            dependent_watcher_config,
            map_node_agent_deployment,
        )
        .shutdown_on_signal()
        .run(reconcile_virtual_node, reconcile_virtual_node_error, context)
        .for_each(log_reconciliation_outcome);

    info!("Virtual node controller created!");

    controller.await
}
