//! Configuration for building inheritance graphs

use pin_graph::MAX_TOPOLOGY_COUNT;
use serde::{Deserialize, Serialize};

use crate::error::{ResolveError, Result};

/// Default values
pub mod defaults {
    /// Topology system carrying the inheritance edges
    pub const TOPOLOGY_SYSTEM: usize = 0;

    /// Name of each document node's auto-clone input pin
    pub const INPUT_PIN: &str = "ip1";

    /// Name of each document node's output pin
    pub const OUTPUT_PIN: &str = "op1";

    /// Name of the synthetic root node; empty means the graph's default
    pub const ROOT_NAME: &str = "";
}

/// How documents are mapped onto graph nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResolverConfig {
    pub topology_system: usize,
    pub input_pin: String,
    pub output_pin: String,
    pub root_name: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            topology_system: defaults::TOPOLOGY_SYSTEM,
            input_pin: defaults::INPUT_PIN.to_string(),
            output_pin: defaults::OUTPUT_PIN.to_string(),
            root_name: defaults::ROOT_NAME.to_string(),
        }
    }
}

impl ResolverConfig {
    /// Check the configuration
    pub fn validate(&self) -> Result<()> {
        if self.topology_system >= MAX_TOPOLOGY_COUNT {
            return Err(ResolveError::Config(format!(
                "topology_system {} must be below {}",
                self.topology_system, MAX_TOPOLOGY_COUNT
            )));
        }
        if self.input_pin.is_empty() || self.output_pin.is_empty() {
            return Err(ResolveError::Config("pin names must not be empty".into()));
        }
        Ok(())
    }
}
