//! Gateway connection health

use super::{finish, require_submariner, ClusterCheck};
use crate::cluster::ClusterContext;
use crate::crd::{ConnectionStatus, GatewayStatus};
use crate::reporter::Reporter;
use async_trait::async_trait;

pub struct Connections;

#[async_trait]
impl ClusterCheck for Connections {
    fn name(&self) -> &'static str {
        "connections"
    }

    async fn check(&self, cluster: &ClusterContext, status: &mut Reporter) -> bool {
        let Some(submariner) = require_submariner(cluster.submariner(), status) else {
            return true;
        };

        status.start("Checking gateway connections");
        evaluate_connections(submariner.gateways(), status);
        finish(status)
    }
}

/// Queue one failure per unhealthy connection of the active gateways
pub fn evaluate_connections(gateways: &[GatewayStatus], status: &mut Reporter) {
    if gateways.is_empty() {
        status.queue_failure("There are no gateways detected");
        return;
    }

    let active: Vec<&GatewayStatus> = gateways.iter().filter(|g| g.is_active()).collect();
    if active.is_empty() {
        status.queue_failure("There are no active gateways");
        return;
    }

    let mut failed = false;
    for gateway in active {
        let host = &gateway.local_endpoint.hostname;

        if !gateway.status_failure.is_empty() {
            failed = true;
            status.queue_failure(format!(
                "The gateway on node {:?} reports a failure: {}",
                host, gateway.status_failure
            ));
        }

        if gateway.connections.is_empty() {
            status.queue_warning(format!("There are no active connections on gateway {:?}", host));
            continue;
        }

        for connection in &gateway.connections {
            let remote = &connection.endpoint.cluster_id;
            match connection.state() {
                ConnectionStatus::Connected => {}
                ConnectionStatus::Connecting => {
                    failed = true;
                    status.queue_failure(format!("Connection to cluster {:?} is in progress", remote));
                }
                ConnectionStatus::Error => {
                    failed = true;
                    status.queue_failure(format!(
                        "Connection to cluster {:?} is not established. Connection details: {}",
                        remote, connection.status_message
                    ));
                }
                ConnectionStatus::Unknown => {
                    failed = true;
                    status.queue_failure(format!(
                        "Connection to cluster {:?} has unknown status {:?}",
                        remote, connection.status
                    ));
                }
            }
        }
    }

    if !failed {
        status.queue_success("All connections are established");
    }
}
