// Common test utilities and helpers

use k8s_openapi::api::apps::v1::{DaemonSet, DaemonSetStatus, Deployment, DeploymentSpec, DeploymentStatus};
use k8s_openapi::api::core::v1::{ContainerStatus, Pod, PodStatus};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use subctl::cluster::ClusterContext;
use subctl::crd::{
    Connection, Endpoint, EndpointSpec, GatewayStatus, Submariner, SubmarinerSpec, SubmarinerStatus,
    OPERATOR_NAMESPACE,
};

fn meta(name: &str) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: Some(OPERATOR_NAMESPACE.to_string()),
        ..Default::default()
    }
}

/// Create a mock Submariner resource with the given network plugin and gateways
pub fn create_mock_submariner(cluster_id: &str, plugin: &str, gateways: Vec<GatewayStatus>) -> Submariner {
    let mut submariner = Submariner::new(
        "submariner",
        SubmarinerSpec {
            cluster_id: cluster_id.to_string(),
            namespace: "submariner-operator".to_string(),
            ..Default::default()
        },
    );
    submariner.metadata.namespace = Some(OPERATOR_NAMESPACE.to_string());
    submariner.status = Some(SubmarinerStatus {
        cluster_id: cluster_id.to_string(),
        network_plugin: plugin.to_string(),
        gateways: Some(gateways),
        ..Default::default()
    });
    submariner
}

/// Create a mock endpoint spec for a cluster
pub fn create_mock_endpoint_spec(cluster_id: &str, subnets: &[&str]) -> EndpointSpec {
    EndpointSpec {
        cluster_id: cluster_id.to_string(),
        cable_name: format!("submariner-cable-{}", cluster_id),
        hostname: format!("{}-gw", cluster_id),
        subnets: subnets.iter().map(|s| s.to_string()).collect(),
        private_ip: "192.168.0.10".to_string(),
        backend: "libreswan".to_string(),
        ..Default::default()
    }
}

/// Create a mock Endpoint resource
pub fn create_mock_endpoint(name: &str, cluster_id: &str, subnets: &[&str]) -> Endpoint {
    let mut endpoint = Endpoint::new(name, create_mock_endpoint_spec(cluster_id, subnets));
    endpoint.metadata.namespace = Some(OPERATOR_NAMESPACE.to_string());
    endpoint
}

/// Create a mock connection to a remote cluster
pub fn create_mock_connection(cluster_id: &str, status: &str, subnets: &[&str]) -> Connection {
    Connection {
        status: status.to_string(),
        status_message: if status == "error" {
            "Failed to establish the tunnel".to_string()
        } else {
            String::new()
        },
        endpoint: create_mock_endpoint_spec(cluster_id, subnets),
        using_ip: None,
    }
}

/// Create a mock gateway status
pub fn create_mock_gateway(cluster_id: &str, ha_status: &str, connections: Vec<Connection>) -> GatewayStatus {
    GatewayStatus {
        version: "v0.17.0".to_string(),
        ha_status: ha_status.to_string(),
        local_endpoint: create_mock_endpoint_spec(cluster_id, &["10.0.0.0/16"]),
        status_failure: String::new(),
        connections,
    }
}

/// Create a mock Pod with a phase and a restart count
pub fn create_mock_pod(name: &str, phase: &str, restarts: i32) -> Pod {
    Pod {
        metadata: meta(name),
        status: Some(PodStatus {
            phase: Some(phase.to_string()),
            container_statuses: Some(vec![ContainerStatus {
                name: "main".to_string(),
                restart_count: restarts,
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Create a mock DaemonSet with desired and current scheduled counts
pub fn create_mock_daemonset(name: &str, desired: i32, current: i32) -> DaemonSet {
    DaemonSet {
        metadata: meta(name),
        status: Some(DaemonSetStatus {
            desired_number_scheduled: desired,
            current_number_scheduled: current,
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Create a mock Deployment with requested and available replicas
pub fn create_mock_deployment(name: &str, replicas: Option<i32>, available: i32) -> Deployment {
    Deployment {
        metadata: meta(name),
        spec: Some(DeploymentSpec {
            replicas,
            ..Default::default()
        }),
        status: Some(DeploymentStatus {
            available_replicas: Some(available),
            ..Default::default()
        }),
    }
}

/// A cluster context whose client points at a closed local port.
///
/// Must be called inside a tokio runtime.
pub fn create_offline_cluster(name: &str, submariner: Option<Submariner>) -> ClusterContext {
    let config = kube::Config::new("http://127.0.0.1:9".parse().unwrap());
    let client = kube::Client::try_from(config).unwrap();
    ClusterContext::from_parts(name, client, submariner)
}
