//! Short-lived validation pods
//!
//! A [`NetworkPod`] runs one shell command on a chosen node and exposes the
//! command's combined output through the container termination message, so
//! no log streaming is needed to read it back.

use crate::crd::GATEWAY_LABEL;
use crate::error::{Result, SubctlError};
use crate::poll::{poll_until, PollConfig};
use k8s_openapi::api::core::v1::{
    Affinity, Capabilities, Container, NodeAffinity, NodeSelector, NodeSelectorRequirement,
    NodeSelectorTerm, Pod, PodSpec, SecurityContext, Toleration,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::{DeleteParams, PostParams};
use kube::{Api, Client};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Label put on every validation pod
pub const VALIDATION_LABEL: (&str, &str) = ("app", "submariner-validation");

const TERMINATION_LOG: &str = "/dev/termination-log";
const HOSTNAME_LABEL: &str = "kubernetes.io/hostname";

/// Which node a pod must land on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scheduling {
    GatewayNode,
    NonGatewayNode,
    NamedNode(String),
}

/// Network namespace the pod runs in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Networking {
    HostNetwork,
    PodNetwork,
}

/// Everything needed to create a validation pod
#[derive(Debug, Clone)]
pub struct NetworkPodConfig {
    pub name_prefix: String,
    pub namespace: String,
    pub image: String,
    pub command: String,
    pub scheduling: Scheduling,
    pub networking: Networking,
    /// Deadline for the pod to leave Pending, and again to complete
    pub timeout: Duration,
}

/// Pod phase as reported by the kubelet
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PodPhase {
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown(String),
}

impl PodPhase {
    pub fn parse(phase: &str) -> Self {
        match phase {
            "Pending" => PodPhase::Pending,
            "Running" => PodPhase::Running,
            "Succeeded" => PodPhase::Succeeded,
            "Failed" => PodPhase::Failed,
            other => PodPhase::Unknown(other.to_string()),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PodPhase::Succeeded | PodPhase::Failed)
    }
}

impl fmt::Display for PodPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PodPhase::Pending => write!(f, "Pending"),
            PodPhase::Running => write!(f, "Running"),
            PodPhase::Succeeded => write!(f, "Succeeded"),
            PodPhase::Failed => write!(f, "Failed"),
            PodPhase::Unknown(p) => write!(f, "{}", p),
        }
    }
}

/// Phase of a pod; a pod without status counts as Pending
pub fn phase_of(pod: &Pod) -> PodPhase {
    pod.status
        .as_ref()
        .and_then(|s| s.phase.as_deref())
        .map(PodPhase::parse)
        .unwrap_or(PodPhase::Pending)
}

/// Termination message of the first container, once it has terminated
pub fn termination_output(pod: &Pod) -> Option<String> {
    pod.status
        .as_ref()?
        .container_statuses
        .as_ref()?
        .first()?
        .state
        .as_ref()?
        .terminated
        .as_ref()
        .map(|t| t.message.clone().unwrap_or_default())
}

/// Wrap a command so its combined output ends up in the termination message
pub fn wrap_command(command: &str) -> String {
    format!("({}) > {} 2>&1", command, TERMINATION_LOG)
}

fn node_requirement(scheduling: &Scheduling) -> NodeSelectorRequirement {
    let (key, operator, value) = match scheduling {
        Scheduling::GatewayNode => (GATEWAY_LABEL, "In", "true".to_string()),
        Scheduling::NonGatewayNode => (GATEWAY_LABEL, "NotIn", "true".to_string()),
        Scheduling::NamedNode(name) => (HOSTNAME_LABEL, "In", name.clone()),
    };
    NodeSelectorRequirement {
        key: key.to_string(),
        operator: operator.to_string(),
        values: Some(vec![value]),
    }
}

/// Pod manifest for a validation pod
pub fn build_pod(config: &NetworkPodConfig) -> Pod {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    let name = format!("{}-{}", config.name_prefix, &suffix[..8]);

    let labels: BTreeMap<String, String> =
        [(VALIDATION_LABEL.0.to_string(), VALIDATION_LABEL.1.to_string())].into();

    Pod {
        metadata: ObjectMeta {
            name: Some(name),
            namespace: Some(config.namespace.clone()),
            labels: Some(labels),
            ..Default::default()
        },
        spec: Some(PodSpec {
            affinity: Some(Affinity {
                node_affinity: Some(NodeAffinity {
                    required_during_scheduling_ignored_during_execution: Some(NodeSelector {
                        node_selector_terms: vec![NodeSelectorTerm {
                            match_expressions: Some(vec![node_requirement(&config.scheduling)]),
                            ..Default::default()
                        }],
                    }),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            containers: vec![Container {
                name: "network-pod".to_string(),
                image: Some(config.image.clone()),
                image_pull_policy: Some("IfNotPresent".to_string()),
                command: Some(vec![
                    "sh".to_string(),
                    "-c".to_string(),
                    wrap_command(&config.command),
                ]),
                security_context: Some(SecurityContext {
                    privileged: Some(true),
                    capabilities: Some(Capabilities {
                        add: Some(vec!["NET_ADMIN".to_string(), "NET_RAW".to_string()]),
                        ..Default::default()
                    }),
                    ..Default::default()
                }),
                termination_message_path: Some(TERMINATION_LOG.to_string()),
                termination_message_policy: Some("File".to_string()),
                ..Default::default()
            }],
            host_network: Some(config.networking == Networking::HostNetwork),
            restart_policy: Some("Never".to_string()),
            termination_grace_period_seconds: Some(0),
            tolerations: Some(vec![Toleration {
                operator: Some("Exists".to_string()),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// A running (or finished) validation pod
pub struct NetworkPod {
    api: Api<Pod>,
    name: String,
    pod: Pod,
    timeout: Duration,
    output: Option<String>,
}

impl NetworkPod {
    /// Create the pod and wait until it is no longer Pending
    pub async fn schedule(client: &Client, config: &NetworkPodConfig) -> Result<Self> {
        let api: Api<Pod> = Api::namespaced(client.clone(), &config.namespace);
        let created = api.create(&PostParams::default(), &build_pod(config)).await?;
        let name = created.metadata.name.clone().unwrap_or_default();
        tracing::info!(pod = %name, namespace = %config.namespace, scheduling = ?config.scheduling, "created validation pod");

        let mut pod = NetworkPod {
            api,
            name,
            pod: created,
            timeout: config.timeout,
            output: None,
        };

        if let Err(e) = pod.await_scheduled().await {
            pod.delete().await;
            return Err(e);
        }
        Ok(pod)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn phase(&self) -> PodPhase {
        phase_of(&self.pod)
    }

    pub fn host_ip(&self) -> Option<&str> {
        self.pod.status.as_ref().and_then(|s| s.host_ip.as_deref())
    }

    pub fn node_name(&self) -> Option<&str> {
        self.pod.spec.as_ref().and_then(|s| s.node_name.as_deref())
    }

    /// Captured output, available after [`NetworkPod::await_completion`]
    pub fn output(&self) -> Option<&str> {
        self.output.as_deref()
    }

    async fn await_scheduled(&mut self) -> Result<()> {
        let api = self.api.clone();
        let name = self.name.clone();
        let config = PollConfig::with_timeout(self.timeout);

        self.pod = poll_until(&config, &format!("pod {} to be scheduled", name), || {
            let api = api.clone();
            let name = name.clone();
            async move {
                let pod = api.get(&name).await?;
                match phase_of(&pod) {
                    PodPhase::Pending => Ok(None),
                    PodPhase::Running | PodPhase::Succeeded | PodPhase::Failed => Ok(Some(pod)),
                    PodPhase::Unknown(phase) => Err(SubctlError::UnexpectedPodPhase { pod: name, phase }),
                }
            }
        })
        .await?;

        tracing::debug!(pod = %self.name, phase = %self.phase(), node = ?self.node_name(), "validation pod scheduled");
        Ok(())
    }

    /// Wait for a terminal phase and capture the command output
    pub async fn await_completion(&mut self) -> Result<&str> {
        let api = self.api.clone();
        let name = self.name.clone();
        let config = PollConfig::with_timeout(self.timeout);

        self.pod = poll_until(&config, &format!("pod {} to complete", name), || {
            let api = api.clone();
            let name = name.clone();
            async move {
                let pod = api.get(&name).await?;
                match phase_of(&pod) {
                    PodPhase::Succeeded | PodPhase::Failed => Ok(Some(pod)),
                    PodPhase::Pending | PodPhase::Running => Ok(None),
                    PodPhase::Unknown(phase) => Err(SubctlError::UnexpectedPodPhase { pod: name, phase }),
                }
            }
        })
        .await?;

        let output = termination_output(&self.pod).unwrap_or_default();
        tracing::debug!(pod = %self.name, phase = %self.phase(), bytes = output.len(), "validation pod completed");
        Ok(self.output.insert(output).as_str())
    }

    /// Delete the pod; failures are only logged
    pub async fn delete(self) {
        let params = DeleteParams {
            grace_period_seconds: Some(0),
            ..Default::default()
        };
        if let Err(e) = self.api.delete(&self.name, &params).await {
            tracing::debug!(pod = %self.name, error = %e, "failed to delete validation pod");
        }
    }
}
