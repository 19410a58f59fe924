//! Can a remote cluster reach the tunnel port of the local gateway?

use super::{new_token, run_capture, token_client_command, token_sniffer_command, tunnel_port, verify_capture};
use crate::cluster::ClusterContext;
use crate::config::DiagnoseOptions;
use crate::crd::{Endpoint, OPERATOR_NAMESPACE};
use crate::diagnose::{finish, NOT_INSTALLED};
use crate::pods::{NetworkPodConfig, Networking, Scheduling};
use crate::reporter::Reporter;
use kube::api::ListParams;
use kube::Api;

/// The endpoint a cluster publishes for itself
pub fn local_endpoint<'a>(endpoints: &'a [Endpoint], cluster_id: &str) -> Option<&'a Endpoint> {
    endpoints.iter().find(|ep| ep.spec.cluster_id == cluster_id)
}

/// Send a token from a pod in `remote` to the active gateway of `local`
pub async fn check_inter_cluster(
    local: &ClusterContext,
    remote: &ClusterContext,
    options: &DiagnoseOptions,
    status: &mut Reporter,
) -> bool {
    status.start(format!(
        "Checking if tunnels can be setup on the gateway node of cluster {:?}",
        local.name()
    ));

    let (Some(local_sub), Some(remote_sub)) = (local.submariner(), remote.submariner()) else {
        for cluster in [local, remote].iter().filter(|c| c.submariner().is_none()) {
            status.queue_warning(format!("{} on cluster {:?}", NOT_INSTALLED, cluster.name()));
        }
        return finish(status);
    };

    let api: Api<Endpoint> = local.namespaced(OPERATOR_NAMESPACE);
    let endpoints = match api.list(&ListParams::default()).await {
        Ok(list) => list.items,
        Err(e) => {
            status.queue_failure(format!("Error listing the Endpoints: {}", e));
            return finish(status);
        }
    };

    let local_id = local.cluster_id();
    let Some(endpoint) = local_endpoint(&endpoints, local_id) else {
        status.queue_failure(format!("Could not find the local Endpoint for cluster {:?}", local_id));
        return finish(status);
    };

    let Some(target) = remote_sub.address_of_peer(local_id) else {
        status.queue_failure(format!(
            "Cluster {:?} has no active gateway connection to cluster {:?}",
            remote.name(),
            local_id
        ));
        return finish(status);
    };

    let port = tunnel_port(Some(&endpoint.spec), local_sub);
    let token = new_token();
    tracing::debug!(local = %local.name(), remote = %remote.name(), %target, port, "checking tunnel port");

    let sniffer = NetworkPodConfig {
        name_prefix: "validate-tunnel-sniffer".to_string(),
        namespace: options.namespace.clone(),
        image: options.image.clone(),
        command: token_sniffer_command(options.validation_timeout, port, &token),
        scheduling: Scheduling::NamedNode(endpoint.spec.hostname.clone()),
        networking: Networking::HostNetwork,
        timeout: options.pod_deadline(),
    };
    let client = NetworkPodConfig {
        name_prefix: "validate-tunnel-client".to_string(),
        command: token_client_command(&target, port, &token),
        scheduling: Scheduling::NonGatewayNode,
        networking: Networking::PodNetwork,
        ..sniffer.clone()
    };

    match run_capture(local.client(), &sniffer, remote.client(), |_| Ok(client)).await {
        Ok(output) => {
            if verify_capture(&output, Some(&token), "UDP", port, options.verbose, status) {
                status.queue_success(format!(
                    "Tunnels can be successfully established on the gateway node of cluster {:?}",
                    local.name()
                ));
            }
        }
        Err(e) => status.queue_failure(format!("Error running the tunnel validation pods: {}", e)),
    }

    finish(status)
}
