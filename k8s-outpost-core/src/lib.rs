pub mod environment;
pub mod events;
pub mod helpers;
pub mod ip;
pub mod resources;
pub mod store;

pub const NODE_AGENT_CLUSTERROLE_NAME: &str = "k8s-outpost-node-agent";
