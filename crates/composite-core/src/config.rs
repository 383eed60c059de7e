//! # Configuration
//!
//! Tunables for a `CompositeGraph`, loadable from TOML.
//!
//! ```toml
//! cycle_policy = "guard"
//! ```

use crate::CompositeError;
use crate::primitives::{CONFIG_PATH_ENV, MAX_CONFIG_FILE_SIZE};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How edge insertion treats edges that would close a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CyclePolicy {
    /// Refuse the edge with `CompositeError::CycleDetected`.
    #[default]
    Reject,
    /// Accept the edge. Traversals skip nodes they have already visited.
    Guard,
}

/// Configuration for a composite graph.
///
/// Aggregation walks are iterative, so there is no depth setting: a graph
/// that could be linked can always be read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompositeConfig {
    /// Cycle handling on edge insertion.
    pub cycle_policy: CyclePolicy,
}

impl CompositeConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, CompositeError> {
        toml::from_str(text).map_err(|e| CompositeError::Config(e.to_string()))
    }

    /// Load a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CompositeError> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path).map_err(|e| {
            CompositeError::Config(format!("Cannot read '{}': {}", path.display(), e))
        })?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(CompositeError::Config(format!(
                "File size {} bytes exceeds maximum allowed {} bytes",
                metadata.len(),
                MAX_CONFIG_FILE_SIZE
            )));
        }
        let text = std::fs::read_to_string(path).map_err(|e| {
            CompositeError::Config(format!("Cannot read '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    /// Load from the file named by `COMPOSITE_CONFIG`, or fall back to defaults
    /// when the variable is unset.
    pub fn from_env() -> Result<Self, CompositeError> {
        match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::load(path.trim()),
            _ => Ok(Self::default()),
        }
    }
}
