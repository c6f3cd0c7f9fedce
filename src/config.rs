//! JSON configuration
//!
//! All options are optional: missing fields take their defaults, unrecognised
//! fields are ignored, and a missing or unreadable file falls back to the
//! defaults entirely.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Runtime configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Allowed IP-to-MAC bindings for the ARP module: dotted IPv4 to a list
    /// of colon-separated hardware addresses. Empty means no binding is
    /// considered valid.
    #[serde(rename = "arp-bindings")]
    pub arp_bindings: HashMap<String, Vec<String>>,

    /// Detection interval for the wireless module, in nanoseconds.
    pub interval: u64,

    /// SYN counter reset interval for the DoS module, in milliseconds.
    #[serde(rename = "syn-interval")]
    pub syn_interval: u64,

    /// SYNs per interval above which rate limiting activates.
    #[serde(rename = "syn-threshold")]
    pub syn_threshold: u32,

    /// Address that allowed frames are forwarded to.
    #[serde(rename = "forward-ip")]
    pub forward_ip: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            arp_bindings: HashMap::new(),
            interval: 1_000_000_000,
            syn_interval: 1000,
            syn_threshold: 1,
            forward_ip: "127.0.0.1".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file: {}", path.as_ref().display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.as_ref().display()))?;
        Ok(config)
    }

    /// Load from the given path if any; fall back to defaults on a missing
    /// or broken file, which is not fatal.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        match path {
            Some(path) => match Self::load(path) {
                Ok(config) => config,
                Err(e) => {
                    warn!("using default configuration: {:#}", e);
                    Self::default()
                }
            },
            None => Self::default(),
        }
    }
}
