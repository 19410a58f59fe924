//! Tests for src/executor/mod.rs - multi-cluster aggregation

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use subctl::diagnose::ClusterCheck;
use subctl::error::SubctlError;
use subctl::executor::{ordered_pairs, run_on_clusters, ClusterEntry};
use subctl::reporter::Reporter;

struct FakeCluster {
    name: &'static str,
    passes: bool,
    installed: bool,
}

fn fake(name: &'static str, passes: bool) -> FakeCluster {
    FakeCluster {
        name,
        passes,
        installed: true,
    }
}

#[derive(Default)]
struct CountingCheck {
    calls: AtomicUsize,
}

#[async_trait]
impl ClusterCheck<FakeCluster> for CountingCheck {
    fn name(&self) -> &'static str {
        "counting"
    }

    async fn check(&self, cluster: &FakeCluster, status: &mut Reporter) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        status.start(format!("Checking {}", cluster.name));
        if !cluster.passes {
            status.queue_failure("failed");
        }
        status.end();
        cluster.passes
    }
}

// ============================================================================
// Aggregation
// ============================================================================

#[tokio::test]
async fn test_all_passing_clusters_succeed() {
    let entries = vec![
        ClusterEntry::connected("a", fake("a", true)),
        ClusterEntry::connected("b", fake("b", true)),
    ];
    let check = CountingCheck::default();
    let mut status = Reporter::buffered();

    assert!(run_on_clusters(&entries, &check, &mut status).await);
    assert_eq!(check.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_failure_does_not_short_circuit() {
    for failing in 0..3 {
        let entries: Vec<ClusterEntry<FakeCluster>> = ["a", "b", "c"]
            .into_iter()
            .enumerate()
            .map(|(i, name)| ClusterEntry::connected(name, fake(name, i != failing)))
            .collect();
        let check = CountingCheck::default();
        let mut status = Reporter::buffered();

        assert!(!run_on_clusters(&entries, &check, &mut status).await);
        assert_eq!(check.calls.load(Ordering::SeqCst), 3);
    }
}

#[tokio::test]
async fn test_unreachable_cluster_fails_without_running_check() {
    let entries = vec![
        ClusterEntry::new("down", Err(SubctlError::Config("no route".to_string()))),
        ClusterEntry::connected("up", fake("up", true)),
    ];
    let check = CountingCheck::default();
    let mut status = Reporter::buffered();

    assert!(!run_on_clusters(&entries, &check, &mut status).await);
    assert_eq!(check.calls.load(Ordering::SeqCst), 1);
    assert!(status
        .lines()
        .iter()
        .any(|l| l.starts_with(" ✗ Unable to connect to cluster \"down\"")));
}

#[tokio::test]
async fn test_clusters_are_separated_and_named() {
    let entries = vec![
        ClusterEntry::connected("east", fake("east", true)),
        ClusterEntry::connected("west", fake("west", true)),
    ];
    let mut status = Reporter::buffered();
    run_on_clusters(&entries, &CountingCheck::default(), &mut status).await;

    let lines = status.lines();
    assert_eq!(lines[0], "Cluster \"east\"");
    let west = lines.iter().position(|l| l == "Cluster \"west\"").unwrap();
    assert_eq!(lines[west - 1], "");
}

// ============================================================================
// Pairing
// ============================================================================

#[test]
fn test_ordered_pairs_skip_ineligible_and_unreachable() {
    let mut skipped = fake("c", true);
    skipped.installed = false;
    let entries = vec![
        ClusterEntry::connected("a", fake("a", true)),
        ClusterEntry::connected("b", fake("b", true)),
        ClusterEntry::connected("c", skipped),
        ClusterEntry::new("d", Err(SubctlError::NoContext)),
    ];

    let pairs: Vec<(&str, &str)> = ordered_pairs(&entries, |c: &FakeCluster| c.installed)
        .into_iter()
        .map(|(l, r)| (l.name, r.name))
        .collect();
    assert_eq!(pairs, vec![("a", "b"), ("b", "a")]);
}

#[test]
fn test_single_cluster_has_no_pairs() {
    let entries = vec![ClusterEntry::connected("a", fake("a", true))];
    assert!(ordered_pairs(&entries, |_: &FakeCluster| true).is_empty());
}
