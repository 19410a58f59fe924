//! kube-proxy mode detection

use super::{finish, require_submariner, ClusterCheck};
use crate::cluster::ClusterContext;
use crate::config::DiagnoseOptions;
use crate::pods::{NetworkPod, NetworkPodConfig, Networking, Scheduling};
use crate::reporter::Reporter;
use async_trait::async_trait;

/// Lists the interface kube-proxy creates in IPVS mode
pub const KUBE_IPVS_COMMAND: &str = "ip a s kube-ipvs0";

const MISSING_INTERFACE: &str = "does not exist";

pub struct KubeProxyMode {
    options: DiagnoseOptions,
}

impl KubeProxyMode {
    pub fn new(options: DiagnoseOptions) -> Self {
        Self { options }
    }

    fn pod_config(&self) -> NetworkPodConfig {
        NetworkPodConfig {
            name_prefix: "query-iface-list".to_string(),
            namespace: self.options.namespace.clone(),
            image: self.options.image.clone(),
            command: KUBE_IPVS_COMMAND.to_string(),
            scheduling: Scheduling::GatewayNode,
            networking: Networking::HostNetwork,
            timeout: self.options.pod_deadline(),
        }
    }
}

#[async_trait]
impl ClusterCheck for KubeProxyMode {
    fn name(&self) -> &'static str {
        "kube-proxy-mode"
    }

    async fn check(&self, cluster: &ClusterContext, status: &mut Reporter) -> bool {
        if require_submariner(cluster.submariner(), status).is_none() {
            return true;
        }

        status.start("Checking Submariner support for the kube-proxy mode");

        match NetworkPod::schedule(cluster.client(), &self.pod_config()).await {
            Ok(mut pod) => {
                let name = pod.name().to_string();
                match pod.await_completion().await {
                    Ok(output) => evaluate_interface_output(output, status),
                    Err(e) => status.queue_failure(format!("Error waiting for the pod {:?}: {}", name, e)),
                }
                pod.delete().await;
            }
            Err(e) => status.queue_failure(format!("Error spawning the network pod: {}", e)),
        }

        finish(status)
    }
}

/// No `kube-ipvs0` interface means kube-proxy runs in iptables mode
pub fn evaluate_interface_output(output: &str, status: &mut Reporter) {
    if output.contains(MISSING_INTERFACE) {
        status.queue_success("The kube-proxy mode is supported");
    } else {
        status.queue_failure("The cluster is deployed with kube-proxy ipvs mode which Submariner does not support");
    }
}
