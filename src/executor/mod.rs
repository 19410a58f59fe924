//! Run one check against many clusters

use crate::diagnose::ClusterCheck;
use crate::error::SubctlError;
use crate::reporter::Reporter;

/// One selected cluster, or the reason it could not be reached
pub struct ClusterEntry<C> {
    pub name: String,
    pub cluster: Result<C, SubctlError>,
}

impl<C> ClusterEntry<C> {
    pub fn new(name: impl Into<String>, cluster: Result<C, SubctlError>) -> Self {
        Self {
            name: name.into(),
            cluster,
        }
    }

    pub fn connected(name: impl Into<String>, cluster: C) -> Self {
        Self::new(name, Ok(cluster))
    }
}

/// Invoke `check` once per reachable cluster, in order.
///
/// Every cluster is visited even after a failure. Returns true only if every
/// cluster was reachable and every check passed.
pub async fn run_on_clusters<C, K>(entries: &[ClusterEntry<C>], check: &K, status: &mut Reporter) -> bool
where
    C: Sync,
    K: ClusterCheck<C> + ?Sized,
{
    let mut success = true;

    for (i, entry) in entries.iter().enumerate() {
        if i > 0 {
            status.print("");
        }
        status.print(format!("Cluster {:?}", entry.name));

        match &entry.cluster {
            Ok(cluster) => {
                let passed = check.check(cluster, status).await;
                tracing::debug!(cluster = %entry.name, check = check.name(), passed, "check finished");
                success = passed && success;
            }
            Err(e) => {
                status.queue_failure(format!("Unable to connect to cluster {:?}: {}", entry.name, e));
                success = false;
            }
        }
    }

    success
}

/// Every ordered pair of distinct reachable clusters accepted by `eligible`
pub fn ordered_pairs<C, F>(entries: &[ClusterEntry<C>], eligible: F) -> Vec<(&C, &C)>
where
    F: Fn(&C) -> bool,
{
    let clusters: Vec<&C> = entries
        .iter()
        .filter_map(|e| e.cluster.as_ref().ok())
        .filter(|c| eligible(c))
        .collect();

    let mut pairs = Vec::new();
    for (i, local) in clusters.iter().enumerate() {
        for (j, remote) in clusters.iter().enumerate() {
            if i != j {
                pairs.push((*local, *remote));
            }
        }
    }
    pairs
}
