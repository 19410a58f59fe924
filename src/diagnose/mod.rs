//! Submariner diagnostics
//!
//! Every check follows the same shape: when Submariner is not installed it
//! warns once and passes, otherwise it queues a failure for each violation it
//! finds (never stopping at the first), a success when there are none, and
//! ends its phase with the derived result.

pub mod cidr;
pub mod cni;
pub mod connections;
pub mod deployment;
pub mod firewall;
pub mod k8s_version;
pub mod kube_proxy;

use crate::cluster::ClusterContext;
use crate::config::DiagnoseOptions;
use crate::crd::Submariner;
use crate::reporter::{MessageKind, Reporter};
use async_trait::async_trait;

/// Warning emitted by checks that need the Submariner resource
pub const NOT_INSTALLED: &str = "Submariner is not installed";

/// A diagnostic run against a single cluster
#[async_trait]
pub trait ClusterCheck<C: Sync = ClusterContext>: Send + Sync {
    /// Name used on the command line
    fn name(&self) -> &'static str;

    /// Whether the check only makes sense with Submariner installed
    fn requires_submariner(&self) -> bool {
        true
    }

    /// Run the check; `true` means no failure was found
    async fn check(&self, cluster: &C, status: &mut Reporter) -> bool;
}

/// Return the Submariner resource, or warn that it is missing
pub fn require_submariner<'a>(submariner: Option<&'a Submariner>, status: &mut Reporter) -> Option<&'a Submariner> {
    if submariner.is_none() {
        status.queue_warning(NOT_INSTALLED);
    }
    submariner
}

/// End the open phase with its derived result; `true` unless it failed
pub fn finish(status: &mut Reporter) -> bool {
    let result = status.result_from_messages();
    status.end_with(result);
    result != MessageKind::Failure
}

/// The single-cluster checks, in the order `diagnose all` runs them
pub fn catalog(options: &DiagnoseOptions) -> Vec<Box<dyn ClusterCheck>> {
    vec![
        Box::new(k8s_version::K8sVersion),
        Box::new(cni::Cni),
        Box::new(connections::Connections),
        Box::new(deployment::Deployment),
        Box::new(kube_proxy::KubeProxyMode::new(options.clone())),
        Box::new(firewall::metrics::FirewallMetrics::new(options.clone())),
        Box::new(firewall::intra_cluster::FirewallIntraCluster::new(options.clone())),
    ]
}

/// Every catalog check against one cluster
pub struct DiagnoseAll {
    checks: Vec<Box<dyn ClusterCheck>>,
}

impl DiagnoseAll {
    pub fn new(options: &DiagnoseOptions) -> Self {
        Self {
            checks: catalog(options),
        }
    }

    /// Run an explicit list of checks instead of the catalog
    pub fn with_checks(checks: Vec<Box<dyn ClusterCheck>>) -> Self {
        Self { checks }
    }
}

#[async_trait]
impl ClusterCheck for DiagnoseAll {
    fn name(&self) -> &'static str {
        "all"
    }

    fn requires_submariner(&self) -> bool {
        false
    }

    async fn check(&self, cluster: &ClusterContext, status: &mut Reporter) -> bool {
        let mut success = true;

        for check in self.checks.iter().filter(|c| !c.requires_submariner()) {
            success = check.check(cluster, status).await && success;
        }

        if require_submariner(cluster.submariner(), status).is_none() {
            return success;
        }

        for check in self.checks.iter().filter(|c| c.requires_submariner()) {
            success = check.check(cluster, status).await && success;
        }

        success
    }
}
