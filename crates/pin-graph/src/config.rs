//! Configuration types for graphs

use serde::{Deserialize, Serialize};

use crate::constants::{defaults, MAX_TOPOLOGY_COUNT};
use crate::error::{GraphError, Result};

/// Graph construction settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GraphConfig {
    /// Number of topology systems to compute (0 is treated as 1)
    pub topology_count: usize,
    /// Whether connection checks and topology recalculation are active
    pub topology_enabled: bool,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            topology_count: defaults::TOPOLOGY_COUNT,
            topology_enabled: defaults::TOPOLOGY_ENABLED,
        }
    }
}

impl GraphConfig {
    /// Config computing the given number of topology systems
    pub fn with_topology_count(topology_count: usize) -> Self {
        Self {
            topology_count,
            ..Self::default()
        }
    }

    /// Start with topology analysis disabled (bulk loading)
    pub fn topology_disabled(mut self) -> Self {
        self.topology_enabled = false;
        self
    }

    /// Check the configuration and normalise a zero topology count
    pub fn validate(mut self) -> Result<Self> {
        if self.topology_count == 0 {
            self.topology_count = 1;
        }
        if self.topology_count > MAX_TOPOLOGY_COUNT {
            return Err(GraphError::Config(format!(
                "topology_count {} exceeds the maximum of {}",
                self.topology_count, MAX_TOPOLOGY_COUNT
            )));
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GraphConfig::default();
        assert_eq!(config.topology_count, 1);
        assert!(config.topology_enabled);
    }

    #[test]
    fn test_zero_count_normalised() {
        let config = GraphConfig::with_topology_count(0).validate().unwrap();
        assert_eq!(config.topology_count, 1);
    }

    #[test]
    fn test_too_many_systems_rejected() {
        let result = GraphConfig::with_topology_count(MAX_TOPOLOGY_COUNT + 1).validate();
        assert!(matches!(result, Err(GraphError::Config(_))));
    }

    #[test]
    fn test_deserialize_partial() {
        let config: GraphConfig = serde_json::from_str(r#"{"topologyEnabled": false}"#).unwrap();
        assert_eq!(config.topology_count, 1);
        assert!(!config.topology_enabled);
    }
}
