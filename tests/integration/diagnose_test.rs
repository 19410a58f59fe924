//! Integration tests for the diagnostics
//!
//! Run with: cargo test integration::diagnose_test -- --ignored

use subctl::client::ClusterSelection;
use subctl::cluster::connect_all;
use subctl::config::DiagnoseOptions;
use subctl::diagnose::k8s_version::K8sVersion;
use subctl::diagnose::kube_proxy::KubeProxyMode;
use subctl::executor::run_on_clusters;
use subctl::reporter::Reporter;

/// Test the Kubernetes version check against the current context
#[tokio::test]
#[ignore]
async fn test_k8s_version_on_current_context() {
    let entries = connect_all(&ClusterSelection::default())
        .await
        .expect("Should read kubeconfig");
    let mut status = Reporter::buffered();

    assert!(run_on_clusters(&entries, &K8sVersion, &mut status).await);
}

/// Test the kube-proxy mode check, which schedules a pod on a gateway node
#[tokio::test]
#[ignore]
async fn test_kube_proxy_mode_on_current_context() {
    let entries = connect_all(&ClusterSelection::default())
        .await
        .expect("Should read kubeconfig");
    let mut status = Reporter::buffered();

    let passed = run_on_clusters(&entries, &KubeProxyMode::new(DiagnoseOptions::default()), &mut status).await;
    assert!(passed, "{:#?}", status.lines());
}
