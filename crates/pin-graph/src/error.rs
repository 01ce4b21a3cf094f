//! Error types for the pin graph

use thiserror::Error;

use crate::types::{NodeId, PinId};

/// Result type alias using GraphError
pub type Result<T> = std::result::Result<T, GraphError>;

/// Errors that can occur while editing or analysing a graph
///
/// None of these are fatal: a rejected operation leaves the graph unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// Both pins have the same direction, or a pin was given where the
    /// opposite direction was expected
    #[error("pin {pin} has the wrong direction for this operation")]
    DirectionMismatch { pin: PinId },

    /// Pins belong to different topology systems
    #[error("pins must belong to the same topology system ({output} vs {input})")]
    TopologyMismatch { output: usize, input: usize },

    /// Pins belong to the same parent node
    #[error("pins belong to the same parent node {node}")]
    SameNode { node: NodeId },

    /// The input pin already has a connection
    #[error("input pin {pin} is already connected")]
    AlreadyConnected { pin: PinId },

    /// The output pin is connected and does not allow more connections
    #[error("output pin {pin} does not allow multiple connections")]
    MultiConnectDisallowed { pin: PinId },

    /// The connection would point back into an ancestor of the output node
    #[error("connecting node {from} to node {to} would create a cycle")]
    WouldCycle { from: NodeId, to: NodeId },

    /// Connections on auto-clone pins cannot be swapped
    #[error("cannot swap connections on cloned pin {pin}")]
    CloneSwap { pin: PinId },

    /// A graph or node hook refused the operation
    #[error("operation vetoed: {0}")]
    Vetoed(String),

    /// The pin is not part of this graph (or collection)
    #[error("pin {0} is not associated with this graph")]
    UnknownPin(PinId),

    /// The node is not part of this graph
    #[error("node {0} is not associated with this graph")]
    UnknownNode(NodeId),

    /// The node already belongs to a graph
    #[error("node {0} is already associated with a graph")]
    NodeAlreadyAttached(NodeId),

    /// Topology system index outside the supported range
    #[error("topology system {index} is out of range (max {max})")]
    TopologyOutOfRange { index: usize, max: usize },

    /// The pin is connected and cannot be removed
    #[error("pin {0} is connected")]
    PinConnected(PinId),

    /// The pin is not part of an auto-clone family
    #[error("pin {0} has no auto-clone master")]
    NotAutoClone(PinId),

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl GraphError {
    /// Create a vetoed error with a message
    pub fn vetoed(msg: impl Into<String>) -> Self {
        Self::Vetoed(msg.into())
    }

    /// Whether this error is a connection-legality rejection rather than
    /// structural misuse of the API
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::DirectionMismatch { .. }
                | Self::TopologyMismatch { .. }
                | Self::SameNode { .. }
                | Self::AlreadyConnected { .. }
                | Self::MultiConnectDisallowed { .. }
                | Self::WouldCycle { .. }
                | Self::CloneSwap { .. }
                | Self::Vetoed(_)
        )
    }
}
