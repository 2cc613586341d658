use std::env::var;

use thiserror::Error;

pub const OPERATOR_RELEASE_NAME: &str = "k8s-outpost-operator";

/// Release parameters the operator process is deployed with.
#[derive(Debug, Clone)]
pub struct OperatorRelease {
    pub agent_image_name: String,
    pub agent_image_tag: String,
}

#[derive(Debug, Error)]
pub enum FromEnvError {
    #[error("Env var unavailable: {}", .0)]
    VarUnset(std::env::VarError),
}

impl OperatorRelease {
    pub fn from_env() -> Result<Self, FromEnvError> {
        Ok(Self {
            agent_image_name: var("KUBE_OUTPOST_AGENT_IMAGE_NAME").map_err(FromEnvError::VarUnset)?,
            agent_image_tag: var("KUBE_OUTPOST_AGENT_IMAGE_TAG").map_err(FromEnvError::VarUnset)?,
        })
    }

    pub fn get_agent_image(&self) -> String {
        format!("{}:{}", self.agent_image_name, self.agent_image_tag)
    }
}
