//! Firewall validation using cooperating sniffer and client pods
//!
//! A sniffer pod with host networking captures traffic on the target node
//! while a client pod elsewhere sends traffic to it. The check passes when the
//! capture contains a marker only the client could have produced.

pub mod inter_cluster;
pub mod intra_cluster;
pub mod metrics;

use crate::cluster::ClusterContext;
use crate::crd::{EndpointSpec, Submariner, GATEWAY_LABEL};
use crate::error::Result;
use crate::pods::{NetworkPod, NetworkPodConfig};
use crate::reporter::Reporter;
use k8s_openapi::api::core::v1::Node;
use kube::api::ListParams;
use kube::{Api, Client};

/// Source port of all client traffic, so the sniffer can filter on it
pub const CLIENT_SOURCE_PORT: u16 = 9898;
pub const METRICS_PORT: u16 = 8080;
pub const GLOBALNET_METRICS_PORT: u16 = 8081;
pub const VXLAN_PORT: u16 = 4800;
pub const DEFAULT_TUNNEL_PORT: u16 = 4500;

pub const SINGLE_NODE_WARNING: &str = "Skipping this check as it's a single node cluster";

/// Outputs collected from one sniffer/client run
#[derive(Debug, Clone, Default)]
pub struct CaptureOutput {
    pub sniffer: String,
    pub client: String,
    pub sniffer_node: String,
    pub client_host_ip: Option<String>,
}

/// Queue the verdict on node counts; `true` when the check can run
pub fn evaluate_nodes(gateways: usize, non_gateways: usize, status: &mut Reporter) -> bool {
    if gateways == 0 {
        status.queue_failure("There are no gateway nodes");
        return false;
    }
    if non_gateways == 0 {
        status.queue_warning(SINGLE_NODE_WARNING);
        return false;
    }
    true
}

/// Count gateway and non-gateway nodes and check whether the capture can run
pub async fn verify_nodes(cluster: &ClusterContext, status: &mut Reporter) -> bool {
    let api: Api<Node> = cluster.cluster_scoped();

    let counts = async {
        let gateways = api
            .list(&ListParams::default().labels(&format!("{}=true", GATEWAY_LABEL)))
            .await?;
        let others = api
            .list(&ListParams::default().labels(&format!("{}!=true", GATEWAY_LABEL)))
            .await?;
        Ok::<_, kube::Error>((gateways.items.len(), others.items.len()))
    }
    .await;

    match counts {
        Ok((gateways, others)) => {
            tracing::debug!(cluster = %cluster.name(), gateways, others, "listed nodes");
            evaluate_nodes(gateways, others, status)
        }
        Err(e) => {
            status.queue_failure(format!("Error listing the nodes: {}", e));
            false
        }
    }
}

/// Run the sniffer, then the client, and collect both outputs.
///
/// `client_config` receives the running sniffer so it can target its host.
/// Both pods are deleted however the run ends.
pub async fn run_capture<F>(
    sniffer_client: &Client,
    sniffer_config: &NetworkPodConfig,
    client_client: &Client,
    client_config: F,
) -> Result<CaptureOutput>
where
    F: FnOnce(&NetworkPod) -> Result<NetworkPodConfig>,
{
    let mut sniffer = NetworkPod::schedule(sniffer_client, sniffer_config).await?;

    let result = match client_config(&sniffer) {
        Ok(config) => run_client(&mut sniffer, client_client, &config).await,
        Err(e) => Err(e),
    };

    sniffer.delete().await;
    result
}

async fn run_client(sniffer: &mut NetworkPod, client: &Client, config: &NetworkPodConfig) -> Result<CaptureOutput> {
    let mut client_pod = NetworkPod::schedule(client, config).await?;
    let result = collect_outputs(sniffer, &mut client_pod).await;
    client_pod.delete().await;
    result
}

async fn collect_outputs(sniffer: &mut NetworkPod, client_pod: &mut NetworkPod) -> Result<CaptureOutput> {
    let client = client_pod.await_completion().await?.to_string();
    let sniffer_output = sniffer.await_completion().await?.to_string();

    Ok(CaptureOutput {
        sniffer: sniffer_output,
        client,
        sniffer_node: sniffer.node_name().unwrap_or_default().to_string(),
        client_host_ip: client_pod.host_ip().map(String::from),
    })
}

pub fn capture_contains(capture: &str, marker: &str) -> bool {
    !marker.is_empty() && capture.contains(marker)
}

/// Queue the verdict for a capture, with pod output as detail when verbose
pub fn verify_capture(
    output: &CaptureOutput,
    marker: Option<&str>,
    protocol: &str,
    port: u16,
    verbose: bool,
    status: &mut Reporter,
) -> bool {
    if verbose {
        status.queue_success(format!("tcpdump output from the sniffer pod:\n{}", output.sniffer));
        status.queue_success(format!("Output from the client pod:\n{}", output.client));
    }

    let Some(marker) = marker else {
        status.queue_failure("Unable to determine the address of the client pod");
        return false;
    };

    if capture_contains(&output.sniffer, marker) {
        true
    } else {
        status.queue_failure(format!(
            "The tcpdump output from the sniffer pod does not contain the expected traffic. \
             Please check that your firewall allows {} traffic on port {} of node {:?}",
            protocol, port, output.sniffer_node
        ));
        false
    }
}

/// UDP port the tunnel of a cluster listens on
pub fn tunnel_port(endpoint: Option<&EndpointSpec>, submariner: &Submariner) -> u16 {
    endpoint
        .and_then(EndpointSpec::udp_port)
        .or(submariner.spec.ce_ipsec_natt_port)
        .unwrap_or(DEFAULT_TUNNEL_PORT)
}

/// Capture TCP SYNs from the client source port
pub fn tcp_sniffer_command(timeout: u64, port: u16) -> String {
    format!(
        "timeout {} tcpdump -ln -c 5 -i any tcp and src port {} and dst port {} and 'tcp[tcpflags] == tcp-syn'",
        timeout, CLIENT_SOURCE_PORT, port
    )
}

pub fn tcp_client_command(target: &str, port: u16) -> String {
    format!(
        "for i in $(seq 10); do nc -w 1 -p {} {} {}; done",
        CLIENT_SOURCE_PORT, target, port
    )
}

/// Capture UDP datagrams from the client source port
pub fn udp_sniffer_command(timeout: u64, port: u16) -> String {
    format!(
        "timeout {} tcpdump -ln -c 5 -i any udp and src port {} and dst port {}",
        timeout, CLIENT_SOURCE_PORT, port
    )
}

pub fn udp_client_command(target: &str, port: u16) -> String {
    format!(
        "for i in $(seq 10); do echo submariner | nc -u -w 1 -p {} {} {}; done",
        CLIENT_SOURCE_PORT, target, port
    )
}

/// Capture payloads on the tunnel port until the token shows up
pub fn token_sniffer_command(timeout: u64, port: u16, token: &str) -> String {
    format!(
        "timeout {} sh -c \"tcpdump -ln -A -i any udp and dst port {} | grep -m 1 {}\"",
        timeout, port, token
    )
}

pub fn token_client_command(target: &str, port: u16, token: &str) -> String {
    format!(
        "for i in $(seq 10); do echo {} | nc -u -w 1 {} {}; done",
        token, target, port
    )
}

/// Short random payload identifying one validation run
pub fn new_token() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}
