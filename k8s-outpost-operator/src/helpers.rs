use std::fmt::Debug;
use std::future::{ready, Ready};

use k8s_outpost_core::helpers::pretty_type_name;
use kube::{
    runtime::{
        controller::{Action, Error as ControllerError},
        reflector::ObjectRef,
        watcher::Error as WatcherError,
    },
    Resource,
};
use log::{error, info, warn};

/// Logs the outcome of a single reconciliation round and completes.
/// Fed to the controller stream so that every round leaves a trace.
pub fn log_reconciliation_outcome<T, E>(
    result: Result<(ObjectRef<T>, Action), ControllerError<E, WatcherError>>,
) -> Ready<()>
where
    T: Resource,
    E: Debug,
{
    let kind = pretty_type_name::<T>().to_lowercase();

    match result {
        Ok((object, action)) => {
            info!("Reconciled {kind} '{}'. Next action: {action:?}", key(&object))
        }
        // the object vanished mid-flight, nothing left to reconcile
        Err(ControllerError::ObjectNotFound(_)) => (),
        Err(ControllerError::ReconcilerFailed(error, object)) => {
            warn!("Couldn't reconcile {kind} '{}'! Reason: {error:#?}", key(&object))
        }
        Err(ControllerError::QueueError(error)) => {
            error!("Couldn't watch the cluster for changes! Reason: {error:#?}")
        }
    }

    ready(())
}

fn key<T: Resource>(object: &ObjectRef<T>) -> String {
    match object.namespace.as_deref() {
        Some(namespace) => format!("{namespace}/{}", object.name),
        None => object.name.clone(),
    }
}
