use k8s_outpost_core::{events::EventSink, resources::operator::OperatorRelease};

/// Collaborators of the reconciler, injected at startup. The store is a type
/// parameter so the test suite can run against an in-memory double.
pub struct ReconcilerContext<S> {
    pub store: S,
    pub events: Box<dyn EventSink>,
    pub release: OperatorRelease,
}
