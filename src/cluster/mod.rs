//! Per-cluster client bundle

use crate::client::{load_config, read_kubeconfig, select_contexts, ClusterSelection};
use crate::crd::{Submariner, OPERATOR_NAMESPACE, SUBMARINER_NAME};
use crate::error::{Result, SubctlError};
use crate::executor::ClusterEntry;
use kube::{Api, Client, Config};

/// Clients and resolved state for one cluster
#[derive(Clone)]
pub struct ClusterContext {
    name: String,
    client: Client,
    submariner: Option<Submariner>,
}

impl ClusterContext {
    /// Build a client and look up the installed Submariner resource.
    ///
    /// A missing resource is not an error; any other API failure is.
    pub async fn new(config: Config, name: Option<String>) -> Result<Self> {
        let host = config.cluster_url.host().unwrap_or("cluster").to_string();
        let client = Client::try_from(config)?;
        Self::from_client(client, name, &host).await
    }

    /// Same as [`ClusterContext::new`] over an existing client.
    ///
    /// Without `name` the cluster is named after its cluster ID, then `host`.
    pub async fn from_client(client: Client, name: Option<String>, host: &str) -> Result<Self> {
        let submariner = fetch_submariner(&client).await?;

        let name = name
            .or_else(|| submariner.as_ref().and_then(|s| s.cluster_id()).map(String::from))
            .unwrap_or_else(|| host.to_string());

        tracing::debug!(cluster = %name, installed = submariner.is_some(), "connected to cluster");
        Ok(Self::from_parts(name, client, submariner))
    }

    pub fn from_parts(name: impl Into<String>, client: Client, submariner: Option<Submariner>) -> Self {
        Self {
            name: name.into(),
            client,
            submariner,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// The Submariner resource, `None` when not installed
    pub fn submariner(&self) -> Option<&Submariner> {
        self.submariner.as_ref()
    }

    /// Cluster ID from the resource, falling back to the symbolic name
    pub fn cluster_id(&self) -> &str {
        self.submariner
            .as_ref()
            .and_then(|s| s.cluster_id())
            .unwrap_or(&self.name)
    }

    pub fn namespaced<K>(&self, namespace: &str) -> Api<K>
    where
        K: kube::Resource<Scope = k8s_openapi::NamespaceResourceScope>,
        <K as kube::Resource>::DynamicType: Default,
    {
        Api::namespaced(self.client.clone(), namespace)
    }

    pub fn cluster_scoped<K>(&self) -> Api<K>
    where
        K: kube::Resource<Scope = k8s_openapi::ClusterResourceScope>,
        <K as kube::Resource>::DynamicType: Default,
    {
        Api::all(self.client.clone())
    }
}

async fn fetch_submariner(client: &Client) -> Result<Option<Submariner>> {
    let api: Api<Submariner> = Api::namespaced(client.clone(), OPERATOR_NAMESPACE);
    // A missing CRD answers 404 without a NotFound status body
    match api.get(SUBMARINER_NAME).await.map_err(SubctlError::from) {
        Ok(submariner) => Ok(Some(submariner)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// Connect to every selected context, in order.
///
/// Failing to read the kubeconfig or an unknown context is fatal; a cluster
/// that cannot be reached is recorded as a failed entry.
pub async fn connect_all(selection: &ClusterSelection) -> Result<Vec<ClusterEntry<ClusterContext>>> {
    let kubeconfig = read_kubeconfig(selection.kubeconfig.as_deref())?;
    let contexts = select_contexts(&kubeconfig, selection)?;

    let mut entries = Vec::with_capacity(contexts.len());
    for context in contexts {
        let cluster = match load_config(&kubeconfig, &context).await {
            Ok(config) => ClusterContext::new(config, Some(context.clone())).await,
            Err(e) => Err(e),
        };
        if let Err(e) = &cluster {
            tracing::warn!(context = %context, error = %e, "unable to connect to cluster");
        }
        entries.push(ClusterEntry::new(context, cluster));
    }
    Ok(entries)
}

/// Connect to exactly one cluster, or fail
pub async fn connect_one(selection: &ClusterSelection) -> Result<ClusterContext> {
    let mut entries = connect_all(selection).await?;
    if entries.len() != 1 {
        return Err(SubctlError::InvalidArgument(format!(
            "expected exactly one cluster context, got {}",
            entries.len()
        )));
    }
    entries.remove(0).cluster
}
