//! Override points consulted by the graph
//!
//! `GraphHooks` decides graph-wide questions (may these pins connect right
//! now, where do errors go). `NodeBehavior` decides per-node questions
//! (may this pin be removed, should it be cloned). Every method has a
//! default, so implementors only override what they need.

use crate::collection::PinCollection;
use crate::graph::Graph;
use crate::node::Node;
use crate::pin::Pin;

/// Graph-level veto hooks and error sink
pub trait GraphHooks: Send {
    /// Called before two pins are linked; returning false rejects the link
    fn before_pins_connected(&self, _graph: &Graph, _output: &Pin, _input: &Pin) -> bool {
        true
    }

    /// Called before two pins are unlinked unless the disconnect is forced;
    /// returning false keeps the link
    fn before_pins_disconnected(&self, _graph: &Graph, _output: &Pin, _input: &Pin) -> bool {
        true
    }

    /// Called before a node is removed; returning false keeps the node
    fn before_node_removed(&self, _graph: &Graph, _node: &Node) -> bool {
        true
    }

    /// Report a non-fatal error
    fn emit_error(&self, message: &str) {
        log::error!("{}", message);
    }
}

/// Hooks that permit everything and log errors
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultGraphHooks;

impl GraphHooks for DefaultGraphHooks {}

/// Node-level decisions about the pins it owns
pub trait NodeBehavior: Send {
    /// Veto for removing an unconnected pin
    fn can_remove_pin(&self, _pin: &Pin) -> bool {
        true
    }

    /// Veto for renaming a pin
    fn can_rename_pin(&self, pin: &Pin, _new_name: &str) -> bool {
        pin.can_rename()
    }

    /// Whether a just-connected pin should spawn a clone of its master
    fn should_clone_pin(&self, collection: &PinCollection, pin: &Pin) -> bool {
        should_clone_pin(collection, pin)
    }

    /// Whether a just-disconnected pin should give back a clone
    fn should_remove_clone_pin(&self, pin: &Pin) -> bool {
        pin.auto_clone_master().is_some() && !pin.is_connected()
    }
}

/// Behavior with every default
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultNodeBehavior;

impl NodeBehavior for DefaultNodeBehavior {}

/// Default clone rule
///
/// The pin's master must live in the same collection and have capacity
/// left. Output pins only clone on their first connection.
pub fn should_clone_pin(collection: &PinCollection, pin: &Pin) -> bool {
    let Some(master) = pin.auto_clone_master().and_then(|id| collection.pin(id)) else {
        return false;
    };
    if !pin.is_input() && pin.connected_inputs().len() != 1 {
        return false;
    }
    master.has_clone_capacity()
}
