//! Kubernetes version support

use super::{finish, ClusterCheck};
use crate::cluster::ClusterContext;
use crate::reporter::Reporter;
use async_trait::async_trait;
use semver::Version;

/// Oldest Kubernetes release Submariner supports
pub const MIN_K8S_VERSION: &str = "1.19.0";

pub struct K8sVersion;

#[async_trait]
impl ClusterCheck for K8sVersion {
    fn name(&self) -> &'static str {
        "k8s-version"
    }

    fn requires_submariner(&self) -> bool {
        false
    }

    async fn check(&self, cluster: &ClusterContext, status: &mut Reporter) -> bool {
        status.start("Checking Submariner support for the Kubernetes version");

        match cluster.client().apiserver_version().await {
            Ok(info) => evaluate_version(&info.git_version, status),
            Err(e) => status.queue_failure(format!("Error obtaining the Kubernetes version: {}", e)),
        }

        finish(status)
    }
}

/// Parse a server `gitVersion` such as `v1.28.3+k3s1` or `v1.27.4-eks-2d98532`
pub fn parse_server_version(git_version: &str) -> Result<Version, semver::Error> {
    let trimmed = git_version.trim().trim_start_matches('v');
    let parsed = Version::parse(trimmed)?;
    // Vendor suffixes land in pre-release/build; they must not affect ordering
    Ok(Version::new(parsed.major, parsed.minor, parsed.patch))
}

/// Queue the verdict for a server version
pub fn evaluate_version(git_version: &str, status: &mut Reporter) {
    let minimum = Version::new(1, 19, 0);

    match parse_server_version(git_version) {
        Ok(version) if version < minimum => status.queue_failure(format!(
            "Submariner requires Kubernetes {} or later; the cluster is running {}",
            MIN_K8S_VERSION, git_version
        )),
        Ok(_) => status.queue_success(format!("The Kubernetes version {:?} is supported", git_version)),
        Err(e) => status.queue_failure(format!(
            "Unable to parse the Kubernetes version {:?}: {}",
            git_version, e
        )),
    }
}
