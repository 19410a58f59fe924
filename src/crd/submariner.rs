//! Submariner resource (submariner.io/v1alpha1)

use super::endpoint::{ConnectionStatus, EndpointSpec, HaStatus};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Desired configuration of a Submariner deployment
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "submariner.io",
    version = "v1alpha1",
    kind = "Submariner",
    plural = "submariners",
    status = "SubmarinerStatus",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct SubmarinerSpec {
    #[serde(default, rename = "clusterID")]
    pub cluster_id: String,

    #[serde(default)]
    pub namespace: String,

    #[serde(default)]
    pub service_discovery_enabled: bool,

    /// Non-empty when Globalnet is in use
    #[serde(default, rename = "globalCIDR")]
    pub global_cidr: String,

    #[serde(default, rename = "ceIPSecNATTPort", skip_serializing_if = "Option::is_none")]
    pub ce_ipsec_natt_port: Option<u16>,

    #[serde(default)]
    pub cable_driver: String,
}

/// Observed state reported by the operator
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubmarinerStatus {
    #[serde(default, rename = "clusterID")]
    pub cluster_id: String,

    #[serde(default)]
    pub network_plugin: String,

    #[serde(default, rename = "clusterCIDR")]
    pub cluster_cidr: String,

    #[serde(default, rename = "serviceCIDR")]
    pub service_cidr: String,

    #[serde(default, rename = "globalCIDR")]
    pub global_cidr: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateways: Option<Vec<GatewayStatus>>,
}

/// Status of one gateway as mirrored into the Submariner resource
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GatewayStatus {
    #[serde(default)]
    pub version: String,

    #[serde(default)]
    pub ha_status: String,

    #[serde(default)]
    pub local_endpoint: EndpointSpec,

    #[serde(default)]
    pub status_failure: String,

    #[serde(default)]
    pub connections: Vec<Connection>,
}

impl GatewayStatus {
    pub fn ha(&self) -> HaStatus {
        HaStatus::parse(&self.ha_status)
    }

    pub fn is_active(&self) -> bool {
        self.ha() == HaStatus::Active
    }
}

/// A tunnel from a gateway to one remote cluster
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    #[serde(default)]
    pub status: String,

    #[serde(default)]
    pub status_message: String,

    #[serde(default)]
    pub endpoint: EndpointSpec,

    #[serde(default, rename = "usingIP", skip_serializing_if = "Option::is_none")]
    pub using_ip: Option<String>,
}

impl Connection {
    pub fn state(&self) -> ConnectionStatus {
        ConnectionStatus::parse(&self.status)
    }
}

impl Submariner {
    /// Cluster ID, preferring the spec over the reported status
    pub fn cluster_id(&self) -> Option<&str> {
        if !self.spec.cluster_id.is_empty() {
            return Some(&self.spec.cluster_id);
        }
        self.status
            .as_ref()
            .map(|s| s.cluster_id.as_str())
            .filter(|id| !id.is_empty())
    }

    pub fn network_plugin(&self) -> &str {
        self.status.as_ref().map(|s| s.network_plugin.as_str()).unwrap_or("")
    }

    pub fn gateways(&self) -> &[GatewayStatus] {
        self.status
            .as_ref()
            .and_then(|s| s.gateways.as_deref())
            .unwrap_or(&[])
    }

    pub fn active_gateways(&self) -> impl Iterator<Item = &GatewayStatus> {
        self.gateways().iter().filter(|g| g.is_active())
    }

    pub fn globalnet_enabled(&self) -> bool {
        !self.spec.global_cidr.is_empty()
    }

    /// Address the remote side of an active connection uses to reach `cluster_id`
    pub fn address_of_peer(&self, cluster_id: &str) -> Option<String> {
        self.active_gateways()
            .flat_map(|g| g.connections.iter())
            .find(|c| c.endpoint.cluster_id == cluster_id)
            .and_then(|c| {
                let candidates = [
                    c.using_ip.as_deref().unwrap_or(""),
                    c.endpoint.public_ip.as_str(),
                    c.endpoint.private_ip.as_str(),
                ];
                candidates
                    .into_iter()
                    .find(|ip| !ip.is_empty())
                    .map(String::from)
            })
    }
}
