//! CLI command definitions using clap

use crate::client::ClusterSelection;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "subctl",
    version,
    about = "Diagnose and validate Submariner multi-cluster connectivity",
    long_about = None,
)]
pub struct Cli {
    /// Kubeconfig file (defaults to $KUBECONFIG, then ~/.kube/config)
    #[arg(long, global = true)]
    pub kubeconfig: Option<PathBuf>,

    /// Kubernetes context(s) to use, comma-separated or repeated
    #[arg(
        long = "context",
        visible_aliases = ["kubecontext", "kubecontexts"],
        global = true,
        value_delimiter = ','
    )]
    pub contexts: Vec<String>,

    /// Use every context in the kubeconfig
    #[arg(long, global = true, conflicts_with = "contexts")]
    pub all_contexts: bool,

    /// Enable verbose logging and firewall output
    #[arg(short = 'v', long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Clusters selected by the global flags
    pub fn selection(&self) -> ClusterSelection {
        ClusterSelection {
            kubeconfig: self.kubeconfig.clone(),
            contexts: self.contexts.clone(),
            all_contexts: self.all_contexts,
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Run diagnostic checks against Submariner clusters
    Diagnose(DiagnoseArgs),

    /// Print the subctl version
    Version,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct DiagnoseArgs {
    #[command(subcommand)]
    pub command: DiagnoseCommand,
}

#[derive(Subcommand, Clone)]
pub enum DiagnoseCommand {
    /// Check the CNI network plugin
    Cni,

    /// Check the gateway connections
    Connections,

    /// Check the Submariner deployment
    Deployment,

    /// Check the Kubernetes version
    #[command(name = "k8s-version")]
    K8sVersion,

    /// Check the kube-proxy mode
    KubeProxyMode(ValidationArgs),

    /// Check the firewall configuration
    Firewall(FirewallArgs),

    /// Run every check
    All(ValidationArgs),
}

#[derive(Args, Clone)]
pub struct FirewallArgs {
    #[command(subcommand)]
    pub command: FirewallCommand,
}

#[derive(Subcommand, Clone)]
pub enum FirewallCommand {
    /// Check that the metrics ports of the gateway are reachable
    Metrics(ValidationArgs),

    /// Check that intra-cluster VXLAN traffic is allowed
    IntraCluster(ValidationArgs),

    /// Check that tunnels can be set up between two clusters
    InterCluster(InterClusterArgs),
}

/// Options for checks that spawn validation pods
#[derive(Args, Clone, Debug, Default)]
pub struct ValidationArgs {
    /// Seconds the validation pods wait for traffic (at most one day)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=86400))]
    pub validation_timeout: Option<u64>,

    /// Namespace for the validation pods
    #[arg(short = 'n', long)]
    pub namespace: Option<String>,
}

#[derive(Args, Clone, Debug)]
pub struct InterClusterArgs {
    /// Local and remote kubeconfig files
    #[arg(value_name = "KUBECONFIG")]
    pub kubeconfigs: Vec<PathBuf>,

    /// Context of the remote cluster
    #[arg(long)]
    pub remote_context: Option<String>,

    /// Kubeconfig of the remote cluster
    #[arg(long)]
    pub remote_kubeconfig: Option<PathBuf>,

    #[command(flatten)]
    pub validation: ValidationArgs,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
