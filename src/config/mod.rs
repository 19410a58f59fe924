//! Application configuration for subctl

use crate::error::{Result, SubctlError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Defaults stored in ~/.subctl/config.toml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Seconds a firewall sniffer listens for traffic
    #[serde(default = "default_validation_timeout")]
    pub validation_timeout: u64,

    /// Namespace for validation pods
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Image for validation pods
    #[serde(default = "default_image")]
    pub image: String,

    /// Whether to use colors
    #[serde(default = "default_true")]
    pub colors: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            validation_timeout: default_validation_timeout(),
            namespace: default_namespace(),
            image: default_image(),
            colors: default_true(),
        }
    }
}

fn default_validation_timeout() -> u64 {
    90
}

fn default_namespace() -> String {
    "default".to_string()
}

fn default_image() -> String {
    "quay.io/submariner/nettest:devel".to_string()
}

fn default_true() -> bool {
    true
}

/// Options shared by every check that spawns pods
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnoseOptions {
    pub validation_timeout: u64,
    pub namespace: String,
    pub image: String,
    pub verbose: bool,
}

impl Default for DiagnoseOptions {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl DiagnoseOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            validation_timeout: config.validation_timeout,
            namespace: config.namespace.clone(),
            image: config.image.clone(),
            verbose: false,
        }
    }

    /// Override file defaults with command line values
    pub fn with_overrides(
        mut self,
        validation_timeout: Option<u64>,
        namespace: Option<&str>,
        verbose: bool,
    ) -> Self {
        if let Some(timeout) = validation_timeout {
            self.validation_timeout = timeout;
        }
        if let Some(ns) = namespace {
            self.namespace = ns.to_string();
        }
        self.verbose = verbose;
        self
    }

    /// How long a pod may take to start, and again to finish
    pub fn pod_deadline(&self) -> Duration {
        Duration::from_secs(self.validation_timeout.saturating_add(60))
    }
}

/// Get the subctl config directory (~/.subctl)
pub fn config_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|h| h.join(".subctl"))
        .ok_or_else(|| SubctlError::Config("Could not determine home directory".to_string()))
}

/// Load application config from ~/.subctl/config.toml
pub fn load_config() -> Result<AppConfig> {
    load_config_from(&config_dir()?.join("config.toml"))
}

/// Load application config from a file, defaulting when it does not exist
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    if path.exists() {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    } else {
        Ok(AppConfig::default())
    }
}
