//! Kubeconfig loading

use crate::error::{Result, SubctlError};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::Config;
use std::path::{Path, PathBuf};

/// Which kubeconfig and which of its contexts to use
#[derive(Debug, Clone, Default)]
pub struct ClusterSelection {
    pub kubeconfig: Option<PathBuf>,
    pub contexts: Vec<String>,
    pub all_contexts: bool,
}

impl ClusterSelection {
    pub fn for_kubeconfig(path: impl Into<PathBuf>) -> Self {
        Self {
            kubeconfig: Some(path.into()),
            ..Default::default()
        }
    }

    pub fn for_context(kubeconfig: Option<PathBuf>, context: impl Into<String>) -> Self {
        Self {
            kubeconfig,
            contexts: vec![context.into()],
            all_contexts: false,
        }
    }
}

/// Read a kubeconfig from a path, or through the default loading rules
pub fn read_kubeconfig(path: Option<&Path>) -> Result<Kubeconfig> {
    match path {
        Some(path) => Kubeconfig::read_from(path).map_err(|e| {
            SubctlError::Config(format!("Failed to read kubeconfig {}: {e}", path.display()))
        }),
        None => Kubeconfig::read()
            .map_err(|e| SubctlError::Config(format!("Failed to read kubeconfig: {e}"))),
    }
}

/// Context names selected from a kubeconfig, in order
pub fn select_contexts(kubeconfig: &Kubeconfig, selection: &ClusterSelection) -> Result<Vec<String>> {
    let known: Vec<&str> = kubeconfig.contexts.iter().map(|c| c.name.as_str()).collect();

    if selection.all_contexts {
        if known.is_empty() {
            return Err(SubctlError::NoContext);
        }
        return Ok(known.into_iter().map(String::from).collect());
    }

    if !selection.contexts.is_empty() {
        for name in &selection.contexts {
            if !known.contains(&name.as_str()) {
                return Err(SubctlError::ContextNotFound(name.clone()));
            }
        }
        return Ok(selection.contexts.clone());
    }

    kubeconfig
        .current_context
        .clone()
        .filter(|c| !c.is_empty())
        .map(|c| vec![c])
        .ok_or(SubctlError::NoContext)
}

/// Client configuration for one context of a kubeconfig
pub async fn load_config(kubeconfig: &Kubeconfig, context: &str) -> Result<Config> {
    let options = KubeConfigOptions {
        context: Some(context.to_string()),
        ..Default::default()
    };

    Config::from_custom_kubeconfig(kubeconfig.clone(), &options)
        .await
        .map_err(|e| SubctlError::Config(format!("Failed to load context {context}: {e}")))
}
