//! Tests for src/pods/mod.rs - validation pod manifests and status helpers

use k8s_openapi::api::core::v1::{ContainerState, ContainerStateTerminated, ContainerStatus, Pod, PodStatus};
use std::time::Duration;
use subctl::pods::{
    build_pod, phase_of, termination_output, wrap_command, NetworkPodConfig, Networking, PodPhase, Scheduling,
};

fn config(scheduling: Scheduling, networking: Networking) -> NetworkPodConfig {
    NetworkPodConfig {
        name_prefix: "validate-sniffer".to_string(),
        namespace: "default".to_string(),
        image: "quay.io/submariner/nettest:devel".to_string(),
        command: "tcpdump -ln -i any".to_string(),
        scheduling,
        networking,
        timeout: Duration::from_secs(150),
    }
}

fn match_expression(pod: &Pod) -> (String, String, Vec<String>) {
    let requirement = pod
        .spec
        .as_ref()
        .and_then(|s| s.affinity.as_ref())
        .and_then(|a| a.node_affinity.as_ref())
        .and_then(|n| n.required_during_scheduling_ignored_during_execution.as_ref())
        .and_then(|r| r.node_selector_terms.first())
        .and_then(|t| t.match_expressions.as_ref())
        .and_then(|m| m.first())
        .cloned()
        .unwrap();
    (requirement.key, requirement.operator, requirement.values.unwrap_or_default())
}

// ============================================================================
// Manifest
// ============================================================================

#[test]
fn test_pod_name_has_random_suffix() {
    let pod = build_pod(&config(Scheduling::GatewayNode, Networking::HostNetwork));
    let name = pod.metadata.name.unwrap();
    let suffix = name.strip_prefix("validate-sniffer-").unwrap();
    assert_eq!(suffix.len(), 8);
    assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn test_pod_carries_validation_label() {
    let pod = build_pod(&config(Scheduling::GatewayNode, Networking::HostNetwork));
    let labels = pod.metadata.labels.unwrap();
    assert_eq!(labels.get("app").map(String::as_str), Some("submariner-validation"));
    assert_eq!(pod.metadata.namespace.as_deref(), Some("default"));
}

#[test]
fn test_gateway_affinity() {
    let pod = build_pod(&config(Scheduling::GatewayNode, Networking::HostNetwork));
    assert_eq!(
        match_expression(&pod),
        ("submariner.io/gateway".to_string(), "In".to_string(), vec!["true".to_string()])
    );
}

#[test]
fn test_non_gateway_affinity() {
    let pod = build_pod(&config(Scheduling::NonGatewayNode, Networking::PodNetwork));
    assert_eq!(
        match_expression(&pod),
        ("submariner.io/gateway".to_string(), "NotIn".to_string(), vec!["true".to_string()])
    );
}

#[test]
fn test_named_node_affinity() {
    let pod = build_pod(&config(Scheduling::NamedNode("worker-2".to_string()), Networking::HostNetwork));
    assert_eq!(
        match_expression(&pod),
        ("kubernetes.io/hostname".to_string(), "In".to_string(), vec!["worker-2".to_string()])
    );
}

#[test]
fn test_pod_spec_settings() {
    let pod = build_pod(&config(Scheduling::GatewayNode, Networking::HostNetwork));
    let spec = pod.spec.unwrap();

    assert_eq!(spec.host_network, Some(true));
    assert_eq!(spec.restart_policy.as_deref(), Some("Never"));
    let tolerations = spec.tolerations.unwrap();
    assert_eq!(tolerations[0].operator.as_deref(), Some("Exists"));

    let container = &spec.containers[0];
    assert_eq!(container.termination_message_policy.as_deref(), Some("File"));
    let security = container.security_context.as_ref().unwrap();
    assert_eq!(security.privileged, Some(true));
    let added = security.capabilities.as_ref().and_then(|c| c.add.clone()).unwrap();
    assert!(added.contains(&"NET_ADMIN".to_string()));
    assert!(added.contains(&"NET_RAW".to_string()));

    let command = container.command.clone().unwrap();
    assert_eq!(command[0], "sh");
    assert_eq!(command[1], "-c");
    assert_eq!(command[2], "(tcpdump -ln -i any) > /dev/termination-log 2>&1");
}

#[test]
fn test_pod_network_disables_host_network() {
    let pod = build_pod(&config(Scheduling::NonGatewayNode, Networking::PodNetwork));
    assert_eq!(pod.spec.unwrap().host_network, Some(false));
}

#[test]
fn test_wrap_command() {
    assert_eq!(wrap_command("ip a s kube-ipvs0"), "(ip a s kube-ipvs0) > /dev/termination-log 2>&1");
}

// ============================================================================
// Status helpers
// ============================================================================

#[test]
fn test_phase_parsing() {
    assert_eq!(PodPhase::parse("Running"), PodPhase::Running);
    assert_eq!(PodPhase::parse("Evicted"), PodPhase::Unknown("Evicted".to_string()));
    assert!(PodPhase::Succeeded.is_terminal());
    assert!(PodPhase::Failed.is_terminal());
    assert!(!PodPhase::Pending.is_terminal());
}

#[test]
fn test_pod_without_status_is_pending() {
    assert_eq!(phase_of(&Pod::default()), PodPhase::Pending);
}

#[test]
fn test_termination_output() {
    let terminated = |message: Option<&str>| Pod {
        status: Some(PodStatus {
            phase: Some("Succeeded".to_string()),
            container_statuses: Some(vec![ContainerStatus {
                name: "network-pod".to_string(),
                state: Some(ContainerState {
                    terminated: Some(ContainerStateTerminated {
                        message: message.map(String::from),
                        ..Default::default()
                    }),
                    ..Default::default()
                }),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    };

    assert_eq!(termination_output(&terminated(Some("captured"))).as_deref(), Some("captured"));
    assert_eq!(termination_output(&terminated(None)).as_deref(), Some(""));
    assert_eq!(termination_output(&Pod::default()), None);
}
