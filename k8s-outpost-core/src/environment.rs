use std::{
    env::{var, VarError},
    net::IpAddr,
};

use ipnet::IpNet;
use thiserror::Error;

pub const NODE_NAME_ENV: &str = "NODE_NAME";
pub const POD_IP_ENV: &str = "POD_IP";
pub const POD_CIDR_ENV: &str = "POD_CIDR";
pub const OVERLAY_CIDR_ENV: &str = "OVERLAY_CIDR";

#[derive(Debug, Error)]
pub enum EnvironmentError {
    #[error("Env var '{}' unavailable: {}", .0, .1)]
    VarUnset(&'static str, VarError),
    #[error("Env var '{}' couldn't be parsed as an IP address!", .0)]
    InvalidAddress(&'static str),
    #[error("Env var '{}' couldn't be parsed as a CIDR!", .0)]
    InvalidCidr(&'static str),
}

pub fn current_node_name() -> Result<String, EnvironmentError> {
    var(NODE_NAME_ENV).map_err(|error| EnvironmentError::VarUnset(NODE_NAME_ENV, error))
}

pub fn current_pod_address() -> Result<IpAddr, EnvironmentError> {
    address_from_var(POD_IP_ENV)
}

pub fn cluster_pod_cidr() -> Result<IpNet, EnvironmentError> {
    net_from_var(POD_CIDR_ENV)
}

pub fn overlay_cidr() -> Result<IpNet, EnvironmentError> {
    net_from_var(OVERLAY_CIDR_ENV)
}

fn address_from_var(name: &'static str) -> Result<IpAddr, EnvironmentError> {
    var(name)
        .map_err(|error| EnvironmentError::VarUnset(name, error))?
        .parse()
        .map_err(|_| EnvironmentError::InvalidAddress(name))
}

fn net_from_var(name: &'static str) -> Result<IpNet, EnvironmentError> {
    var(name)
        .map_err(|error| EnvironmentError::VarUnset(name, error))?
        .parse()
        .map_err(|_| EnvironmentError::InvalidCidr(name))
}
