//! Can non-gateway nodes reach the VXLAN port of the gateway?

use super::{run_capture, udp_client_command, udp_sniffer_command, verify_capture, verify_nodes, VXLAN_PORT};
use crate::cluster::ClusterContext;
use crate::config::DiagnoseOptions;
use crate::diagnose::{finish, require_submariner, ClusterCheck};
use crate::error::SubctlError;
use crate::pods::{NetworkPodConfig, Networking, Scheduling};
use crate::reporter::Reporter;
use async_trait::async_trait;

/// Plugin that routes intra-cluster traffic without the VXLAN overlay
pub const OVN_KUBERNETES: &str = "OVNKubernetes";

pub struct FirewallIntraCluster {
    options: DiagnoseOptions,
}

impl FirewallIntraCluster {
    pub fn new(options: DiagnoseOptions) -> Self {
        Self { options }
    }
}

#[async_trait]
impl ClusterCheck for FirewallIntraCluster {
    fn name(&self) -> &'static str {
        "firewall-intra-cluster"
    }

    async fn check(&self, cluster: &ClusterContext, status: &mut Reporter) -> bool {
        let Some(submariner) = require_submariner(cluster.submariner(), status) else {
            return true;
        };

        status.start(format!(
            "Checking the firewall configuration to determine if intra-cluster VXLAN traffic (port {}) is allowed",
            VXLAN_PORT
        ));

        if submariner.network_plugin() == OVN_KUBERNETES {
            status.queue_success(format!(
                "This check is not necessary with the {} network plugin",
                OVN_KUBERNETES
            ));
            return finish(status);
        }

        if !verify_nodes(cluster, status).await {
            return finish(status);
        }

        let opts = &self.options;
        let sniffer = NetworkPodConfig {
            name_prefix: "validate-vxlan-sniffer".to_string(),
            namespace: opts.namespace.clone(),
            image: opts.image.clone(),
            command: udp_sniffer_command(opts.validation_timeout, VXLAN_PORT),
            scheduling: Scheduling::GatewayNode,
            networking: Networking::HostNetwork,
            timeout: opts.pod_deadline(),
        };

        let result = run_capture(cluster.client(), &sniffer, cluster.client(), |sniffer_pod| {
            let target = sniffer_pod.host_ip().ok_or_else(|| {
                SubctlError::InvalidArgument(format!("sniffer pod {} has no host IP", sniffer_pod.name()))
            })?;
            Ok(NetworkPodConfig {
                name_prefix: "validate-vxlan-client".to_string(),
                command: udp_client_command(target, VXLAN_PORT),
                scheduling: Scheduling::NonGatewayNode,
                ..sniffer.clone()
            })
        })
        .await;

        match result {
            Ok(output) => {
                if verify_capture(
                    &output,
                    output.client_host_ip.as_deref(),
                    "UDP",
                    VXLAN_PORT,
                    opts.verbose,
                    status,
                ) {
                    status.queue_success("The firewall configuration allows intra-cluster VXLAN traffic");
                }
            }
            Err(e) => status.queue_failure(format!("Error running the VXLAN validation pods: {}", e)),
        }

        finish(status)
    }
}
