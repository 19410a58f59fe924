//! Can non-gateway nodes reach the gateway metrics ports?

use super::{
    run_capture, tcp_client_command, tcp_sniffer_command, verify_capture, verify_nodes, GLOBALNET_METRICS_PORT,
    METRICS_PORT,
};
use crate::cluster::ClusterContext;
use crate::config::DiagnoseOptions;
use crate::diagnose::{finish, require_submariner, ClusterCheck};
use crate::error::SubctlError;
use crate::pods::{NetworkPodConfig, Networking, Scheduling};
use crate::reporter::Reporter;
use async_trait::async_trait;

pub struct FirewallMetrics {
    options: DiagnoseOptions,
}

impl FirewallMetrics {
    pub fn new(options: DiagnoseOptions) -> Self {
        Self { options }
    }

    /// Ports checked on the gateway node
    pub fn ports(globalnet: bool) -> Vec<u16> {
        if globalnet {
            vec![METRICS_PORT, GLOBALNET_METRICS_PORT]
        } else {
            vec![METRICS_PORT]
        }
    }

    async fn check_port(&self, cluster: &ClusterContext, port: u16, status: &mut Reporter) -> bool {
        let opts = &self.options;
        let sniffer = NetworkPodConfig {
            name_prefix: "validate-metrics-sniffer".to_string(),
            namespace: opts.namespace.clone(),
            image: opts.image.clone(),
            command: tcp_sniffer_command(opts.validation_timeout, port),
            scheduling: Scheduling::GatewayNode,
            networking: Networking::HostNetwork,
            timeout: opts.pod_deadline(),
        };

        let result = run_capture(cluster.client(), &sniffer, cluster.client(), |sniffer_pod| {
            let target = sniffer_pod.host_ip().ok_or_else(|| {
                SubctlError::InvalidArgument(format!("sniffer pod {} has no host IP", sniffer_pod.name()))
            })?;
            Ok(NetworkPodConfig {
                name_prefix: "validate-metrics-client".to_string(),
                command: tcp_client_command(target, port),
                scheduling: Scheduling::NonGatewayNode,
                ..sniffer.clone()
            })
        })
        .await;

        match result {
            Ok(output) => verify_capture(
                &output,
                output.client_host_ip.as_deref(),
                "TCP",
                port,
                opts.verbose,
                status,
            ),
            Err(e) => {
                status.queue_failure(format!("Error running the metrics validation pods: {}", e));
                false
            }
        }
    }
}

#[async_trait]
impl ClusterCheck for FirewallMetrics {
    fn name(&self) -> &'static str {
        "firewall-metrics"
    }

    async fn check(&self, cluster: &ClusterContext, status: &mut Reporter) -> bool {
        let Some(submariner) = require_submariner(cluster.submariner(), status) else {
            return true;
        };

        let ports = Self::ports(submariner.globalnet_enabled());
        let listed: Vec<String> = ports.iter().map(u16::to_string).collect();
        status.start(format!(
            "Checking the firewall configuration to determine if the metrics port(s) ({}) are allowed",
            listed.join(", ")
        ));

        if !verify_nodes(cluster, status).await {
            return finish(status);
        }

        let mut allowed = true;
        for port in ports {
            allowed = self.check_port(cluster, port, status).await && allowed;
        }
        if allowed {
            status.queue_success("The firewall configuration allows metrics to be retrieved from the gateway nodes");
        }

        finish(status)
    }
}
