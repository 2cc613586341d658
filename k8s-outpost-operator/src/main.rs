use std::{error::Error, process::exit, sync::Arc};

use k8s_outpost_core::{
    events::ClientEventSink,
    resources::operator::{OperatorRelease, OPERATOR_RELEASE_NAME},
    store::client::ClientStore,
};
use kube::Client;

use crate::{controller::start_virtual_node_controller, reconciler::context::ReconcilerContext};

mod controller;
mod helpers;
mod reconciler;

#[tokio::main()]
async fn main() -> Result<(), Box<dyn Error>> {
    configure_logger();

    let release = get_release();
    let client = create_client().await;

    let context = ReconcilerContext {
        store: ClientStore::new(client.clone()),
        events: Box::new(ClientEventSink::new(client.clone(), OPERATOR_RELEASE_NAME)),
        release,
    };

    start_virtual_node_controller(client, Arc::new(context)).await;

    Ok(())
}

async fn create_client() -> Client {
    match Client::try_default().await {
        Ok(client) => client,
        Err(error) => {
            log::error!("Couldn't create client! {error:?}");
            exit(6)
        }
    }
}

fn get_release() -> OperatorRelease {
    match OperatorRelease::from_env() {
        Ok(release) => release,
        Err(error) => {
            log::error!("Couldn't retrieve release info! {error:?}");
            exit(7)
        }
    }
}

fn configure_logger() {
    env_logger::builder()
        .default_format()
        .format_module_path(false)
        .filter_level(log::LevelFilter::Info)
        .init()
}
