//! Submariner deployment health: endpoint CIDRs, workloads, pods

use super::cidr::evaluate_overlapping_cidrs;
use super::{finish, require_submariner, ClusterCheck};
use crate::cluster::ClusterContext;
use crate::crd::{Endpoint, Submariner, OPERATOR_NAMESPACE};
use crate::pods::{phase_of, PodPhase};
use crate::reporter::Reporter;
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment as K8sDeployment};
use k8s_openapi::api::core::v1::Pod;
use kube::api::ListParams;
use kube::{Api, ResourceExt};

/// Restarts above this count are reported as a warning
pub const MAX_RESTARTS: i32 = 5;

pub const GATEWAY_DAEMONSET: &str = "submariner-gateway";
pub const ROUTE_AGENT_DAEMONSET: &str = "submariner-routeagent";
pub const GLOBALNET_DAEMONSET: &str = "submariner-globalnet";
pub const LIGHTHOUSE_AGENT: &str = "submariner-lighthouse-agent";
pub const LIGHTHOUSE_COREDNS: &str = "submariner-lighthouse-coredns";

pub struct Deployment;

#[async_trait]
impl ClusterCheck for Deployment {
    fn name(&self) -> &'static str {
        "deployment"
    }

    async fn check(&self, cluster: &ClusterContext, status: &mut Reporter) -> bool {
        let Some(submariner) = require_submariner(cluster.submariner(), status) else {
            return true;
        };

        let cidrs = check_overlapping_cidrs(cluster, submariner, status).await;
        let workloads = check_workloads(cluster, submariner, status).await;
        let pods = check_pods(cluster, status).await;

        cidrs && workloads && pods
    }
}

async fn check_overlapping_cidrs(cluster: &ClusterContext, submariner: &Submariner, status: &mut Reporter) -> bool {
    status.start("Checking if cluster CIDRs overlap");

    if submariner.globalnet_enabled() {
        status.queue_success("Globalnet is enabled, overlapping CIDRs are allowed");
        return finish(status);
    }

    let api: Api<Endpoint> = cluster.namespaced(OPERATOR_NAMESPACE);
    match api.list(&ListParams::default()).await {
        Ok(list) => {
            evaluate_overlapping_cidrs(&list.items, status);
        }
        Err(e) => status.queue_failure(format!("Error listing the Endpoints: {}", e)),
    }

    finish(status)
}

/// Names of the DaemonSets and Deployments this installation should have
pub fn expected_workloads(submariner: &Submariner) -> (Vec<&'static str>, Vec<&'static str>) {
    let mut daemonsets = vec![GATEWAY_DAEMONSET, ROUTE_AGENT_DAEMONSET];
    if submariner.globalnet_enabled() {
        daemonsets.push(GLOBALNET_DAEMONSET);
    }

    let deployments = if submariner.spec.service_discovery_enabled {
        vec![LIGHTHOUSE_AGENT, LIGHTHOUSE_COREDNS]
    } else {
        Vec::new()
    };

    (daemonsets, deployments)
}

async fn check_workloads(cluster: &ClusterContext, submariner: &Submariner, status: &mut Reporter) -> bool {
    status.start("Checking Submariner pods");

    let (daemonsets, deployments) = expected_workloads(submariner);
    let ds_api: Api<DaemonSet> = cluster.namespaced(OPERATOR_NAMESPACE);
    let deploy_api: Api<K8sDeployment> = cluster.namespaced(OPERATOR_NAMESPACE);

    for name in daemonsets {
        match ds_api.get_opt(name).await {
            Ok(Some(ds)) => evaluate_daemonset(&ds, status),
            Ok(None) => status.queue_failure(format!("DaemonSet {:?} is missing", name)),
            Err(e) => status.queue_failure(format!("Error obtaining DaemonSet {:?}: {}", name, e)),
        }
    }

    for name in deployments {
        match deploy_api.get_opt(name).await {
            Ok(Some(deployment)) => evaluate_deployment(&deployment, status),
            Ok(None) => status.queue_failure(format!("Deployment {:?} is missing", name)),
            Err(e) => status.queue_failure(format!("Error obtaining Deployment {:?}: {}", name, e)),
        }
    }

    finish(status)
}

/// Desired and currently scheduled pod counts must agree
pub fn evaluate_daemonset(daemonset: &DaemonSet, status: &mut Reporter) {
    let name = daemonset.name_any();
    let Some(ds_status) = daemonset.status.as_ref() else {
        status.queue_failure(format!("DaemonSet {:?} has no status yet", name));
        return;
    };

    let desired = ds_status.desired_number_scheduled;
    let current = ds_status.current_number_scheduled;
    if desired != current {
        status.queue_failure(format!(
            "The desired number of running pods for DaemonSet {:?} ({}) does not match the actual number ({})",
            name, desired, current
        ));
    }
}

/// Requested replicas (default 1) must all be available
pub fn evaluate_deployment(deployment: &K8sDeployment, status: &mut Reporter) {
    let name = deployment.name_any();
    let desired = deployment.spec.as_ref().and_then(|s| s.replicas).unwrap_or(1);
    let available = deployment
        .status
        .as_ref()
        .and_then(|s| s.available_replicas)
        .unwrap_or(0);

    if desired != available {
        status.queue_failure(format!(
            "The desired number of replicas for Deployment {:?} ({}) does not match the actual number ({})",
            name, desired, available
        ));
    }
}

async fn check_pods(cluster: &ClusterContext, status: &mut Reporter) -> bool {
    status.start("Checking the status of all Submariner pods");

    let api: Api<Pod> = cluster.namespaced(OPERATOR_NAMESPACE);
    match api.list(&ListParams::default()).await {
        Ok(list) => evaluate_pods(&list.items, status),
        Err(e) => status.queue_failure(format!("Error listing pods: {}", e)),
    }

    finish(status)
}

fn restart_count(pod: &Pod) -> i32 {
    pod.status
        .as_ref()
        .and_then(|s| s.container_statuses.as_ref())
        .map(|containers| containers.iter().map(|c| c.restart_count).sum())
        .unwrap_or(0)
}

/// Every pod must be Running; frequent restarts only warn
pub fn evaluate_pods(pods: &[Pod], status: &mut Reporter) {
    let mut failed = false;

    for pod in pods {
        let name = pod.name_any();
        let phase = phase_of(pod);
        if phase != PodPhase::Running {
            failed = true;
            status.queue_failure(format!("Pod {:?} is not running. (current state is {})", name, phase));
            continue;
        }

        let restarts = restart_count(pod);
        if restarts > MAX_RESTARTS {
            status.queue_warning(format!("Pod {:?} has restarted {} times", name, restarts));
        }
    }

    if !failed {
        status.queue_success("All Submariner pods are up and running");
    }
}
