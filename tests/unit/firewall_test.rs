//! Tests for src/diagnose/firewall/ - pod commands and capture correlation

#[allow(dead_code)]
mod common {
    include!("../common/mod.rs");
}

use subctl::crd::EndpointSpec;
use subctl::diagnose::firewall::inter_cluster::local_endpoint;
use subctl::diagnose::firewall::metrics::FirewallMetrics;
use subctl::diagnose::firewall::{
    capture_contains, evaluate_nodes, tcp_client_command, tcp_sniffer_command, token_client_command,
    token_sniffer_command, tunnel_port, udp_client_command, udp_sniffer_command, verify_capture, CaptureOutput,
    SINGLE_NODE_WARNING, VXLAN_PORT,
};
use subctl::reporter::{MessageKind, Reporter};

fn output(capture: &str, client_ip: Option<&str>) -> CaptureOutput {
    CaptureOutput {
        sniffer: capture.to_string(),
        client: String::new(),
        sniffer_node: "east-gw".to_string(),
        client_host_ip: client_ip.map(String::from),
    }
}

// ============================================================================
// Marker correlation
// ============================================================================

#[test]
fn test_capture_with_client_ip_passes() {
    let run = output("12:00:01 IP 10.0.0.5.9898 > 10.0.0.1.4500: UDP", Some("10.0.0.5"));
    let mut status = Reporter::buffered();
    status.start("firewall");

    assert!(verify_capture(&run, run.client_host_ip.as_deref(), "UDP", 4500, false, &mut status));
    assert!(status.pending().is_empty());
}

#[test]
fn test_capture_without_marker_names_port() {
    let run = output("0 packets captured", Some("10.0.0.5"));
    let mut status = Reporter::buffered();
    status.start("firewall");

    assert!(!verify_capture(&run, Some("10.0.0.5"), "TCP", 8080, false, &mut status));
    assert_eq!(status.pending().len(), 1);
    assert_eq!(status.pending()[0].kind, MessageKind::Failure);
    assert!(status.pending()[0].text.contains("8080"));
    assert!(status.pending()[0].text.contains("east-gw"));
}

#[test]
fn test_missing_client_address_fails() {
    let run = output("anything", None);
    let mut status = Reporter::buffered();
    status.start("firewall");
    assert!(!verify_capture(&run, None, "TCP", 8080, false, &mut status));
}

#[test]
fn test_verbose_reports_outputs_as_success_details() {
    let run = output("token a1b2c3d4", None);
    let mut status = Reporter::buffered();
    status.start("firewall");

    assert!(verify_capture(&run, Some("a1b2c3d4"), "UDP", 4500, true, &mut status));
    assert_eq!(status.pending().len(), 2);
    assert!(status.pending().iter().all(|m| m.kind == MessageKind::Success));
    assert!(status.pending()[0].text.contains("token a1b2c3d4"));
}

#[test]
fn test_capture_contains_is_substring_match() {
    assert!(capture_contains("...9898 > 10.0.0.5.4500...", "10.0.0.5"));
    assert!(!capture_contains("...9898 > 10.0.0.6.4500...", "10.0.0.5"));
}

// ============================================================================
// Preconditions
// ============================================================================

#[test]
fn test_no_gateway_nodes_fails() {
    let mut status = Reporter::buffered();
    status.start("firewall");
    assert!(!evaluate_nodes(0, 3, &mut status));
    assert_eq!(status.result_from_messages(), MessageKind::Failure);
}

#[test]
fn test_single_node_cluster_is_skipped() {
    let mut status = Reporter::buffered();
    status.start("firewall");
    assert!(!evaluate_nodes(1, 0, &mut status));
    assert_eq!(status.pending()[0].kind, MessageKind::Warning);
    assert_eq!(status.pending()[0].text, SINGLE_NODE_WARNING);
}

#[test]
fn test_nodes_available() {
    let mut status = Reporter::buffered();
    status.start("firewall");
    assert!(evaluate_nodes(1, 2, &mut status));
    assert!(status.pending().is_empty());
}

// ============================================================================
// Ports and commands
// ============================================================================

#[test]
fn test_tunnel_port_precedence() {
    let mut submariner = common::create_mock_submariner("east", "generic", vec![]);
    assert_eq!(tunnel_port(None, &submariner), 4500);

    submariner.spec.ce_ipsec_natt_port = Some(4600);
    assert_eq!(tunnel_port(None, &submariner), 4600);

    let mut endpoint = EndpointSpec::default();
    endpoint.backend_config.insert("udp-port".to_string(), "4700".to_string());
    assert_eq!(tunnel_port(Some(&endpoint), &submariner), 4700);
}

#[test]
fn test_metrics_ports() {
    assert_eq!(FirewallMetrics::ports(false), vec![8080]);
    assert_eq!(FirewallMetrics::ports(true), vec![8080, 8081]);
}

#[test]
fn test_tcp_commands() {
    let sniffer = tcp_sniffer_command(90, 8080);
    assert!(sniffer.starts_with("timeout 90 tcpdump"));
    assert!(sniffer.contains("src port 9898 and dst port 8080"));
    assert!(sniffer.contains("tcp-syn"));

    let client = tcp_client_command("172.18.0.4", 8080);
    assert!(client.contains("nc -w 1 -p 9898 172.18.0.4 8080"));
}

#[test]
fn test_vxlan_commands_use_udp() {
    let sniffer = udp_sniffer_command(90, VXLAN_PORT);
    assert!(sniffer.starts_with("timeout 90 tcpdump"));
    assert!(sniffer.contains("udp and src port 9898 and dst port 4800"));
    assert!(!sniffer.contains("tcp-syn"));

    let client = udp_client_command("192.168.0.1", VXLAN_PORT);
    assert!(client.contains("nc -u -w 1 -p 9898 192.168.0.1 4800"));
}

#[test]
fn test_token_commands() {
    let sniffer = token_sniffer_command(60, 4500, "deadbeef");
    assert!(sniffer.starts_with("timeout 60 sh -c"));
    assert!(sniffer.contains("udp and dst port 4500"));
    assert!(sniffer.contains("grep -m 1 deadbeef"));

    let client = token_client_command("203.0.113.7", 4500, "deadbeef");
    assert!(client.contains("echo deadbeef | nc -u -w 1 203.0.113.7 4500"));
}

#[test]
fn test_local_endpoint_matches_cluster_id() {
    let endpoints = vec![
        common::create_mock_endpoint("west-ep", "west", &["10.1.0.0/16"]),
        common::create_mock_endpoint("east-ep", "east", &["10.0.0.0/16"]),
    ];
    let found = local_endpoint(&endpoints, "east").unwrap();
    assert_eq!(found.spec.hostname, "east-gw");
    assert!(local_endpoint(&endpoints, "north").is_none());
}
