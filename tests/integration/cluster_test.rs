//! Integration tests for cluster connection
//!
//! Run with: cargo test integration::cluster_test -- --ignored

use subctl::client::ClusterSelection;
use subctl::cluster::{connect_all, connect_one};

/// Test connecting to the current context
#[tokio::test]
#[ignore]
async fn test_connect_current_context() {
    let cluster = connect_one(&ClusterSelection::default())
        .await
        .expect("Should connect to current context");
    assert!(!cluster.name().is_empty());
}

/// Test that Submariner is found when installed
#[tokio::test]
#[ignore]
async fn test_submariner_resource_resolved() {
    let cluster = connect_one(&ClusterSelection::default())
        .await
        .expect("Should connect to current context");
    let submariner = cluster.submariner().expect("Submariner should be installed");
    assert!(submariner.cluster_id().is_some());
}

/// Test connecting to every context
#[tokio::test]
#[ignore]
async fn test_connect_all_contexts() {
    let selection = ClusterSelection {
        all_contexts: true,
        ..Default::default()
    };
    let entries = connect_all(&selection).await.expect("Should read kubeconfig");
    assert!(!entries.is_empty());
}
