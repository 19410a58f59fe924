//! `subctl diagnose` implementation
//!
//! Every command returns whether all selected clusters passed; the caller
//! turns `false` into exit status 1.

use crate::cli::{DiagnoseCommand, FirewallCommand, InterClusterArgs, ValidationArgs};
use crate::client::ClusterSelection;
use crate::cluster::{connect_all, connect_one, ClusterContext};
use crate::config::{AppConfig, DiagnoseOptions};
use crate::diagnose::firewall::inter_cluster::check_inter_cluster;
use crate::diagnose::firewall::intra_cluster::FirewallIntraCluster;
use crate::diagnose::firewall::metrics::FirewallMetrics;
use crate::diagnose::kube_proxy::KubeProxyMode;
use crate::diagnose::{cni, connections, deployment, k8s_version, ClusterCheck, DiagnoseAll};
use crate::error::{Result, SubctlError};
use crate::executor::{ordered_pairs, run_on_clusters};
use crate::reporter::Reporter;

/// Execute a diagnose subcommand
pub async fn run_diagnose(
    command: &DiagnoseCommand,
    selection: &ClusterSelection,
    config: &AppConfig,
    verbose: bool,
    status: &mut Reporter,
) -> Result<bool> {
    let options = |args: &ValidationArgs| {
        DiagnoseOptions::from_config(config).with_overrides(
            args.validation_timeout,
            args.namespace.as_deref(),
            verbose,
        )
    };

    match command {
        DiagnoseCommand::Cni => run_check(selection, &cni::Cni, status).await,
        DiagnoseCommand::Connections => run_check(selection, &connections::Connections, status).await,
        DiagnoseCommand::Deployment => run_check(selection, &deployment::Deployment, status).await,
        DiagnoseCommand::K8sVersion => run_check(selection, &k8s_version::K8sVersion, status).await,
        DiagnoseCommand::KubeProxyMode(args) => {
            run_check(selection, &KubeProxyMode::new(options(args)), status).await
        }
        DiagnoseCommand::Firewall(firewall) => match &firewall.command {
            FirewallCommand::Metrics(args) => {
                run_check(selection, &FirewallMetrics::new(options(args)), status).await
            }
            FirewallCommand::IntraCluster(args) => {
                run_check(selection, &FirewallIntraCluster::new(options(args)), status).await
            }
            FirewallCommand::InterCluster(args) => {
                run_inter_cluster(selection, args, &options(&args.validation), status).await
            }
        },
        DiagnoseCommand::All(args) => run_all(selection, &options(args), status).await,
    }
}

async fn run_check<K>(selection: &ClusterSelection, check: &K, status: &mut Reporter) -> Result<bool>
where
    K: ClusterCheck + ?Sized,
{
    let entries = connect_all(selection).await?;
    Ok(run_on_clusters(&entries, check, status).await)
}

/// Every catalog check per cluster, then the tunnel check between each pair
async fn run_all(selection: &ClusterSelection, options: &DiagnoseOptions, status: &mut Reporter) -> Result<bool> {
    let entries = connect_all(selection).await?;
    let mut success = run_on_clusters(&entries, &DiagnoseAll::new(options), status).await;

    for (local, remote) in ordered_pairs(&entries, |c: &ClusterContext| c.submariner().is_some()) {
        status.print("");
        status.print(format!("Clusters {:?} and {:?}", local.name(), remote.name()));
        success = check_inter_cluster(local, remote, options, status).await && success;
    }

    Ok(success)
}

/// Local and remote cluster selections for the inter-cluster check
pub fn inter_cluster_selections(
    global: &ClusterSelection,
    args: &InterClusterArgs,
) -> Result<(ClusterSelection, ClusterSelection)> {
    match args.kubeconfigs.as_slice() {
        [local, remote] => Ok((
            ClusterSelection::for_kubeconfig(local),
            ClusterSelection::for_kubeconfig(remote),
        )),
        [] => {
            let remote_context = args.remote_context.as_ref().ok_or_else(|| {
                SubctlError::InvalidArgument("--remote-context is required without kubeconfig arguments".to_string())
            })?;
            let remote_kubeconfig = args.remote_kubeconfig.clone().or_else(|| global.kubeconfig.clone());
            Ok((
                global.clone(),
                ClusterSelection::for_context(remote_kubeconfig, remote_context),
            ))
        }
        other => Err(SubctlError::InvalidArgument(format!(
            "expected no kubeconfig arguments or exactly two (local and remote), got {}",
            other.len()
        ))),
    }
}

async fn run_inter_cluster(
    selection: &ClusterSelection,
    args: &InterClusterArgs,
    options: &DiagnoseOptions,
    status: &mut Reporter,
) -> Result<bool> {
    let (local_selection, remote_selection) = inter_cluster_selections(selection, args)?;
    let local = connect_one(&local_selection).await?;
    let remote = connect_one(&remote_selection).await?;

    Ok(check_inter_cluster(&local, &remote, options, status).await)
}
