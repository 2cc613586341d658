use std::{sync::Arc, time::Duration};

use chrono::Utc;
use k8s_outpost_core::{
    events::OutpostEvent,
    resources::{
        crd::v1alpha1::virtual_node::{VirtualNode, VirtualNodeState, VirtualNodeStatus},
        diff::requires_update,
        labels::get_joined_owner_labels,
        node_agent::{NodeAgentRelease, NodeAgentReleaseBuilder},
    },
    store::{ObjectKey, ObjectStore, ResourceStore, StatusStore, StoreError},
};
use k8s_openapi::api::{
    apps::v1::Deployment,
    core::v1::ServiceAccount,
    rbac::v1::RoleBinding,
};
use kube::{runtime::controller::Action, Resource};
use log::debug;
use serde::Serialize;

use super::{context::ReconcilerContext, error::ReconcilerError, object_key};

const SUCCESS_REQUEUE_SECS: u64 = 60 * 5;

const CONFLICT_REQUEUE_SECS: u64 = 1;
const DEFAULT_ERROR_REQUEUE_SECS: u64 = 10;
const VALIDATION_ERROR_REQUEUE_SECS: u64 = 60 * 5;

pub async fn reconcile_virtual_node<S: ResourceStore>(
    object: Arc<VirtualNode>,
    context: Arc<ReconcilerContext<S>>,
) -> Result<Action, ReconcilerError> {
    let key = object_key(object.as_ref())?;
    let reconcile_result = try_reconcile(&key, &context).await;

    match reconcile_result {
        Ok(action) => Ok(action),
        // a concurrent writer won, the quick requeue re-reads and retries;
        // conflicts never reach the status surface or the event stream
        Err(error @ ReconcilerError::StoreError(StoreError::Conflict(_))) => {
            debug!("Write conflict on '{key}', retrying...");

            Err(error)
        }
        Err(error) => {
            let _ = apply_degraded_status(&key, &error, &context).await;
            context
                .events
                .publish(&key, OutpostEvent::ReconcileFailed(error.to_string()))
                .await;

            Err(error)
        }
    }
}

pub fn reconcile_virtual_node_error<S: ResourceStore>(
    _object: Arc<VirtualNode>,
    error: &ReconcilerError,
    _context: Arc<ReconcilerContext<S>>,
) -> Action {
    Action::requeue(match error {
        ReconcilerError::StoreError(StoreError::Conflict(_)) => {
            Duration::from_secs(CONFLICT_REQUEUE_SECS)
        }
        ReconcilerError::NodeAgentReleaseValidationError(_) => {
            Duration::from_secs(VALIDATION_ERROR_REQUEUE_SECS)
        }
        _ => Duration::from_secs(DEFAULT_ERROR_REQUEUE_SECS),
    })
}

async fn try_reconcile<S: ResourceStore>(
    key: &ObjectKey,
    context: &ReconcilerContext<S>,
) -> Result<Action, ReconcilerError> {
    // every pass starts from a fresh read, the queued object may be stale
    let virtual_node = ObjectStore::<VirtualNode>::get(&context.store, key)
        .await
        .map_err(ReconcilerError::StoreError)?;

    let Some(virtual_node) = virtual_node else {
        // already gone or never existed, the expected end state after removal
        return Ok(Action::await_change());
    };

    if virtual_node.is_terminating() {
        if !virtual_node.has_cleanup_finalizer() {
            return Ok(Action::await_change());
        }

        return cleanup(key, virtual_node, context).await;
    }

    if !virtual_node.has_cleanup_finalizer() {
        return register_finalizer(virtual_node, context).await;
    }

    converge(key, &virtual_node, context).await
}

/// Persists the cleanup finalizer and nothing else. Dependents are created on
/// the next pass, which the update itself triggers; that way the finalizer is
/// durably recorded before any dependent can exist.
async fn register_finalizer<S: ResourceStore>(
    mut virtual_node: VirtualNode,
    context: &ReconcilerContext<S>,
) -> Result<Action, ReconcilerError> {
    virtual_node.add_cleanup_finalizer();

    ObjectStore::<VirtualNode>::update(&context.store, &virtual_node)
        .await
        .map_err(ReconcilerError::StoreError)?;

    Ok(Action::await_change())
}

async fn converge<S: ResourceStore>(
    key: &ObjectKey,
    virtual_node: &VirtualNode,
    context: &ReconcilerContext<S>,
) -> Result<Action, ReconcilerError> {
    let release = build_release(virtual_node, context)?;
    let dependents = release
        .generate_dependents()
        .map_err(ReconcilerError::NodeAgentReleaseResourceError)?;

    let mut written = apply_dependent(&context.store, &dependents.service_account).await?;
    written |= apply_dependent(&context.store, &dependents.role_binding).await?;
    written |= apply_dependent(&context.store, &dependents.deployment).await?;

    if written {
        context
            .events
            .publish(key, OutpostEvent::DependentsApplied)
            .await;
    }

    apply_status(virtual_node, VirtualNodeStatus::provisioned(Utc::now()), context).await?;

    Ok(Action::requeue(Duration::from_secs(SUCCESS_REQUEUE_SECS)))
}

/// Removes the dependents, then (and only then) the finalizer. A failed
/// delete aborts the pass with the finalizer still in place, so the owner
/// stays visible as terminating until a later pass completes the teardown.
async fn cleanup<S: ResourceStore>(
    key: &ObjectKey,
    mut virtual_node: VirtualNode,
    context: &ReconcilerContext<S>,
) -> Result<Action, ReconcilerError> {
    delete_owned::<S, Deployment>(&context.store, key).await?;
    delete_owned::<S, RoleBinding>(&context.store, key).await?;
    delete_owned::<S, ServiceAccount>(&context.store, key).await?;

    virtual_node.remove_cleanup_finalizer();

    ObjectStore::<VirtualNode>::update(&context.store, &virtual_node)
        .await
        .map_err(ReconcilerError::StoreError)?;

    context.events.publish(key, OutpostEvent::CleanedUp).await;

    Ok(Action::await_change())
}

fn build_release<S: ResourceStore>(
    virtual_node: &VirtualNode,
    context: &ReconcilerContext<S>,
) -> Result<NodeAgentRelease, ReconcilerError> {
    NodeAgentReleaseBuilder::default()
        .with_operator(&context.release)
        .with_virtual_node(virtual_node)
        .map_err(ReconcilerError::NodeAgentReleaseResourceError)?
        .build()
        .map_err(ReconcilerError::NodeAgentReleaseBuilderError)?
        .validated()
        .map_err(ReconcilerError::NodeAgentReleaseValidationError)
}

/// Converges one dependent: absent means create it, drifted means update it,
/// matching means leave it alone. Returns whether a write happened.
async fn apply_dependent<S, K>(store: &S, desired: &K) -> Result<bool, ReconcilerError>
where
    S: ObjectStore<K> + ?Sized,
    K: Resource + Serialize + Clone + Sync,
{
    let key = object_key(desired)?;

    match store.get(&key).await.map_err(ReconcilerError::StoreError)? {
        None => {
            store
                .create(desired)
                .await
                .map_err(ReconcilerError::StoreError)?;

            Ok(true)
        }
        Some(observed) => {
            if !requires_update(desired, &observed).map_err(ReconcilerError::SerializationError)? {
                return Ok(false);
            }

            let mut updated = desired.clone();
            updated.meta_mut().resource_version = observed.meta().resource_version.to_owned();

            store
                .update(&updated)
                .await
                .map_err(ReconcilerError::StoreError)?;

            Ok(true)
        }
    }
}

async fn delete_owned<S, K>(store: &S, owner: &ObjectKey) -> Result<(), ReconcilerError>
where
    S: ObjectStore<K> + ?Sized,
    K: Resource,
{
    let selector = get_joined_owner_labels(owner);
    let owned = store
        .list(&owner.namespace, &selector)
        .await
        .map_err(ReconcilerError::StoreError)?;

    for object in owned {
        let key = object_key(&object)?;

        match store.delete(&key).await {
            Ok(()) => (),
            Err(StoreError::NotFound(_)) => (), // already gone
            Err(error) => return Err(ReconcilerError::StoreError(error)),
        }
    }

    Ok(())
}

async fn apply_status<S: ResourceStore>(
    virtual_node: &VirtualNode,
    desired: VirtualNodeStatus,
    context: &ReconcilerContext<S>,
) -> Result<(), ReconcilerError> {
    let current = virtual_node.status.clone().unwrap_or_default();

    if desired.matches(&current) {
        return Ok(());
    }

    let mut updated = virtual_node.clone();
    updated.status = Some(desired.preserving_transition_times(&current));

    StatusStore::<VirtualNode>::update_status(&context.store, &updated)
        .await
        .map_err(ReconcilerError::StoreError)?;

    Ok(())
}

async fn apply_degraded_status<S: ResourceStore>(
    key: &ObjectKey,
    error: &ReconcilerError,
    context: &ReconcilerContext<S>,
) -> Result<(), ReconcilerError> {
    let Ok(Some(virtual_node)) = ObjectStore::<VirtualNode>::get(&context.store, key).await else {
        return Ok(());
    };

    if virtual_node.is_terminating() {
        return Ok(());
    }

    let status = VirtualNodeStatus::degraded(get_error_state(error), &error.to_string(), Utc::now());

    apply_status(&virtual_node, status, context).await
}

fn get_error_state(error: &ReconcilerError) -> VirtualNodeState {
    match error {
        ReconcilerError::NodeAgentReleaseBuilderError(_)
        | ReconcilerError::NodeAgentReleaseResourceError(_)
        | ReconcilerError::NodeAgentReleaseValidationError(_) => VirtualNodeState::ErrorInvalidSpec,
        ReconcilerError::StoreError(StoreError::Unavailable(_, err)) => match err {
            kube::Error::Auth(_) => VirtualNodeState::ErrorInsufficientPermissions,
            kube::Error::Api(response) if response.code == 403 => {
                VirtualNodeState::ErrorInsufficientPermissions
            }
            _ => VirtualNodeState::UnknownError,
        },
        _ => VirtualNodeState::UnknownError,
    }
}
