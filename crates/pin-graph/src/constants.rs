//! Engine-wide constants
//!
//! Single source of truth for limits and configuration defaults.

/// Number of independent topology systems a node carries pin collections for
pub const MAX_TOPOLOGY_COUNT: usize = 2;

/// Placeholder in an auto-clone name template replaced by the clone counter
pub const CLONE_COUNTER_PLACEHOLDER: char = '%';

/// Default values for graph configuration
pub mod defaults {
    /// Topology systems computed by a new graph
    pub const TOPOLOGY_COUNT: usize = 1;
    /// Whether connection checks and recalculation start enabled
    pub const TOPOLOGY_ENABLED: bool = true;
    /// Display name given to nodes created without one
    pub const NODE_NAME: &str = "Node";
    /// Suffix appended to a master pin's name when it has no clone template
    pub const CLONE_NAME_SUFFIX: &str = "_%";
}
