//! Endpoint resource and the endpoint data embedded in gateway status

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Key in `backend_config` carrying the tunnel UDP port
pub const UDP_PORT_CONFIG: &str = "udp-port";

/// Connectivity endpoint of one cluster
///
/// Field names are snake_case on the wire, unlike most Kubernetes types.
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "submariner.io",
    version = "v1",
    kind = "Endpoint",
    plural = "endpoints",
    namespaced
)]
pub struct EndpointSpec {
    #[serde(default)]
    pub cluster_id: String,

    #[serde(default)]
    pub cable_name: String,

    #[serde(default)]
    pub hostname: String,

    #[serde(default)]
    pub subnets: Vec<String>,

    #[serde(default)]
    pub private_ip: String,

    #[serde(default)]
    pub public_ip: String,

    #[serde(default)]
    pub nat_enabled: bool,

    #[serde(default)]
    pub backend: String,

    #[serde(default)]
    pub backend_config: BTreeMap<String, String>,
}

impl EndpointSpec {
    /// Tunnel UDP port advertised by the cable driver, if any
    pub fn udp_port(&self) -> Option<u16> {
        self.backend_config
            .get(UDP_PORT_CONFIG)
            .and_then(|p| p.parse().ok())
    }
}

/// High-availability role of a gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaStatus {
    Active,
    Passive,
    Unknown,
}

impl HaStatus {
    pub fn parse(value: &str) -> Self {
        match value {
            "active" => HaStatus::Active,
            "passive" => HaStatus::Passive,
            _ => HaStatus::Unknown,
        }
    }
}

impl fmt::Display for HaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HaStatus::Active => write!(f, "active"),
            HaStatus::Passive => write!(f, "passive"),
            HaStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// State of a tunnel to one remote cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connecting,
    Connected,
    Error,
    Unknown,
}

impl ConnectionStatus {
    pub fn parse(value: &str) -> Self {
        match value {
            "connecting" => ConnectionStatus::Connecting,
            "connected" => ConnectionStatus::Connected,
            "error" => ConnectionStatus::Error,
            _ => ConnectionStatus::Unknown,
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Connecting => write!(f, "connecting"),
            ConnectionStatus::Connected => write!(f, "connected"),
            ConnectionStatus::Error => write!(f, "error"),
            ConnectionStatus::Unknown => write!(f, "unknown"),
        }
    }
}
