//! CNI plugin compatibility, including Calico IPPool configuration

use super::{finish, require_submariner, ClusterCheck};
use crate::cluster::ClusterContext;
use crate::crd::{GatewayStatus, Submariner};
use crate::error::{Result, SubctlError};
use crate::reporter::Reporter;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::ConfigMap;
use kube::api::{ApiResource, DynamicObject, GroupVersionKind, ListParams};
use kube::Api;

/// Network plugins Submariner is known to work with
pub const SUPPORTED_NETWORK_PLUGINS: [&str; 6] = [
    "generic",
    "canal-flannel",
    "weave-net",
    "OpenShiftSDN",
    "OVNKubernetes",
    "Calico",
];

const CALICO_CONFIG: &str = "calico-config";
const CALICO_NAMESPACE: &str = "kube-system";

pub struct Cni;

#[async_trait]
impl ClusterCheck for Cni {
    fn name(&self) -> &'static str {
        "cni"
    }

    async fn check(&self, cluster: &ClusterContext, status: &mut Reporter) -> bool {
        let Some(submariner) = require_submariner(cluster.submariner(), status) else {
            return true;
        };

        status.start("Checking Submariner support for the CNI network plugin");
        evaluate_network_plugin(submariner.network_plugin(), status);
        let mut success = finish(status);

        match calico_installed(cluster).await {
            Ok(true) => success = check_calico_pools(cluster, submariner, status).await && success,
            Ok(false) => {}
            Err(e) => {
                status.start("Checking Calico IPPool configuration");
                status.queue_failure(format!("Error looking up ConfigMap {:?}: {}", CALICO_CONFIG, e));
                success = finish(status) && success;
            }
        }

        success
    }
}

pub fn is_supported_plugin(plugin: &str) -> bool {
    SUPPORTED_NETWORK_PLUGINS.contains(&plugin)
}

/// Queue the verdict for a detected plugin name
pub fn evaluate_network_plugin(plugin: &str, status: &mut Reporter) {
    if plugin.is_empty() {
        status.queue_failure("Unable to determine the CNI network plugin");
    } else if is_supported_plugin(plugin) {
        status.queue_success(format!("The detected CNI network plugin ({:?}) is supported", plugin));
    } else {
        status.queue_failure(format!(
            "The detected CNI network plugin ({:?}) is not supported",
            plugin
        ));
    }
}

async fn calico_installed(cluster: &ClusterContext) -> Result<bool> {
    let api: Api<ConfigMap> = cluster.namespaced(CALICO_NAMESPACE);
    Ok(api.get_opt(CALICO_CONFIG).await?.is_some())
}

/// The fields of a Calico IPPool the check needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpPool {
    pub name: String,
    pub cidr: String,
    pub disabled: bool,
}

impl IpPool {
    fn from_dynamic(obj: &DynamicObject) -> Result<Self> {
        let name = obj.metadata.name.clone().unwrap_or_default();
        let spec = obj
            .data
            .get("spec")
            .ok_or_else(|| SubctlError::Serialization(format!("IPPool {} has no spec", name)))?;
        let cidr = spec
            .get("cidr")
            .and_then(|c| c.as_str())
            .unwrap_or_default()
            .to_string();
        let disabled = spec.get("disabled").and_then(|d| d.as_bool()).unwrap_or(false);
        Ok(Self { name, cidr, disabled })
    }
}

async fn list_ip_pools(cluster: &ClusterContext) -> Result<Vec<IpPool>> {
    let gvk = GroupVersionKind::gvk("crd.projectcalico.org", "v1", "IPPool");
    let resource = ApiResource::from_gvk_with_plural(&gvk, "ippools");
    let api: Api<DynamicObject> = Api::all_with(cluster.client().clone(), &resource);

    api.list(&ListParams::default())
        .await?
        .items
        .iter()
        .map(IpPool::from_dynamic)
        .collect()
}

async fn check_calico_pools(cluster: &ClusterContext, submariner: &Submariner, status: &mut Reporter) -> bool {
    status.start("Checking Calico IPPool configuration");

    match list_ip_pools(cluster).await {
        Ok(pools) => evaluate_calico_pools(submariner.gateways(), &pools, status),
        Err(e) => status.queue_failure(format!("Error listing Calico IPPools: {}", e)),
    }

    finish(status)
}

/// Every remote subnet of an active gateway must have a disabled IPPool
pub fn evaluate_calico_pools(gateways: &[GatewayStatus], pools: &[IpPool], status: &mut Reporter) {
    let mut failed = false;

    for gateway in gateways.iter().filter(|g| g.is_active()) {
        for connection in &gateway.connections {
            let remote = &connection.endpoint;
            for subnet in &remote.subnets {
                let problem = match pools.iter().find(|p| &p.cidr == subnet) {
                    None => format!(
                        "Could not find any IPPool with CIDR {:?} for remote cluster {:?}",
                        subnet, remote.cluster_id
                    ),
                    Some(pool) if !pool.disabled => format!(
                        "The IPPool {:?} with CIDR {:?} for remote cluster {:?} has disabled set to false",
                        pool.name, subnet, remote.cluster_id
                    ),
                    Some(_) => continue,
                };
                failed = true;
                status.queue_failure(problem);
            }
        }
    }

    if !failed {
        status.queue_success("The Calico IPPools are configured correctly for the remote clusters");
    }
}
