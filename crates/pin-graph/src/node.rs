//! Nodes (vertices) of a pin graph
//!
//! A node carries, for every topology system, an input and an output
//! `PinCollection` plus the results of the last topology pass: its ordinal,
//! its subgraph affiliation and its descendants. Nodes are built standalone,
//! pre-populated with pins, and then handed to a `Graph`.

use std::fmt;

use crate::collection::PinCollection;
use crate::constants::{defaults, MAX_TOPOLOGY_COUNT};
use crate::error::{GraphError, Result};
use crate::hooks::{DefaultNodeBehavior, NodeBehavior};
use crate::pin::Pin;
use crate::types::{GraphId, NodeId, PinDirection, PinId};

/// Per-topology-system state of a node
#[derive(Debug)]
struct TopologySlot {
    inputs: PinCollection,
    outputs: PinCollection,
    ordinal: Option<usize>,
    subgraph: Option<usize>,
    descendants: Vec<NodeId>,
}

impl TopologySlot {
    fn new(node: NodeId, topology_system: usize) -> Self {
        Self {
            inputs: PinCollection::new(node, PinDirection::Input, topology_system),
            outputs: PinCollection::new(node, PinDirection::Output, topology_system),
            ordinal: None,
            subgraph: None,
            descendants: Vec::new(),
        }
    }

    fn collection(&self, direction: PinDirection) -> &PinCollection {
        match direction {
            PinDirection::Input => &self.inputs,
            PinDirection::Output => &self.outputs,
        }
    }

    fn collection_mut(&mut self, direction: PinDirection) -> &mut PinCollection {
        match direction {
            PinDirection::Input => &mut self.inputs,
            PinDirection::Output => &mut self.outputs,
        }
    }
}

/// A vertex owning pins
///
/// Methods taking a topology system index panic if it is not below
/// `MAX_TOPOLOGY_COUNT`, like slice indexing.
pub struct Node {
    id: NodeId,
    name: String,
    graph: Option<GraphId>,
    systems: Vec<TopologySlot>,
    behavior: Box<dyn NodeBehavior>,
}

impl Node {
    /// Create a node with the default behavior
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_behavior(name, DefaultNodeBehavior)
    }

    /// Create a node whose pin decisions are made by `behavior`
    pub fn with_behavior(name: impl Into<String>, behavior: impl NodeBehavior + 'static) -> Self {
        let id = NodeId::new();
        let mut name = name.into();
        if name.is_empty() {
            name = defaults::NODE_NAME.to_string();
        }
        Self {
            id,
            name,
            graph: None,
            systems: (0..MAX_TOPOLOGY_COUNT)
                .map(|t| TopologySlot::new(id, t))
                .collect(),
            behavior: Box::new(behavior),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Display name (not required to be unique)
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Graph this node belongs to, if any
    pub fn graph(&self) -> Option<GraphId> {
        self.graph
    }

    pub fn behavior(&self) -> &dyn NodeBehavior {
        self.behavior.as_ref()
    }

    // ------------------------------------------------------------------
    // Pins
    // ------------------------------------------------------------------

    pub fn inputs(&self, topology_system: usize) -> &PinCollection {
        &self.systems[topology_system].inputs
    }

    pub fn outputs(&self, topology_system: usize) -> &PinCollection {
        &self.systems[topology_system].outputs
    }

    /// Collection of the given direction
    pub fn collection(&self, topology_system: usize, direction: PinDirection) -> &PinCollection {
        self.systems[topology_system].collection(direction)
    }

    /// Attach a pin to the collection matching its direction
    pub fn add_pin(&mut self, topology_system: usize, pin: Pin, name: &str) -> Result<PinId> {
        let slot = self
            .systems
            .get_mut(topology_system)
            .ok_or(GraphError::TopologyOutOfRange {
                index: topology_system,
                max: MAX_TOPOLOGY_COUNT,
            })?;
        slot.collection_mut(pin.direction()).add_pin(pin, name)
    }

    /// Topology system and direction of a pin owned by this node
    pub fn locate_pin(&self, pin: PinId) -> Option<(usize, PinDirection)> {
        self.systems.iter().enumerate().find_map(|(t, slot)| {
            if slot.inputs.contains(pin) {
                Some((t, PinDirection::Input))
            } else if slot.outputs.contains(pin) {
                Some((t, PinDirection::Output))
            } else {
                None
            }
        })
    }

    /// Find a pin owned by this node in any collection
    pub fn pin(&self, pin: PinId) -> Option<&Pin> {
        let (t, direction) = self.locate_pin(pin)?;
        self.collection(t, direction).pin(pin)
    }

    pub(crate) fn pin_mut(&mut self, pin: PinId) -> Option<&mut Pin> {
        let (t, direction) = self.locate_pin(pin)?;
        self.systems[t].collection_mut(direction).pin_mut(pin)
    }

    pub fn input_pin(&self, name: &str, topology_system: usize) -> Option<&Pin> {
        self.inputs(topology_system).get_pin(name)
    }

    pub fn output_pin(&self, name: &str, topology_system: usize) -> Option<&Pin> {
        self.outputs(topology_system).get_pin(name)
    }

    pub fn first_unconnected_input_pin(&self, topology_system: usize) -> Option<&Pin> {
        self.inputs(topology_system).first_unconnected_pin()
    }

    pub fn first_unconnected_output_pin(&self, topology_system: usize) -> Option<&Pin> {
        self.outputs(topology_system).first_unconnected_pin()
    }

    /// Remove an unconnected pin, subject to this node's veto
    ///
    /// Removing an auto-cloned pin returns its slot to the master. Collections
    /// are only reachable read-only, so this is the one way to drop a pin:
    ///
    /// ```compile_fail
    /// use pin_graph::{Node, Pin};
    ///
    /// let mut node = Node::new("a");
    /// let pin = node.add_pin(0, Pin::input(), "in").unwrap();
    /// node.inputs_mut(0).remove_pin(pin, |_| true).unwrap();
    /// ```
    pub fn remove_pin(&mut self, pin: PinId) -> Result<Pin> {
        let (t, direction) = self.locate_pin(pin).ok_or(GraphError::UnknownPin(pin))?;
        let behavior = self.behavior.as_ref();
        let collection = self.systems[t].collection_mut(direction);
        let removed = collection.remove_pin(pin, |p| behavior.can_remove_pin(p))?;
        if removed.is_auto_cloned() {
            if let Some(master) = removed
                .auto_clone_master()
                .and_then(|id| collection.pin_mut(id))
            {
                master.release_clone();
            }
        }
        Ok(removed)
    }

    /// Rename a pin if it is flagged renamable and the node agrees
    pub fn rename_pin(&mut self, pin: PinId, name: &str) -> bool {
        let Some((t, direction)) = self.locate_pin(pin) else {
            return false;
        };
        let allowed = self
            .collection(t, direction)
            .pin(pin)
            .is_some_and(|p| self.behavior.can_rename_pin(p, name));
        allowed && self.systems[t].collection_mut(direction).set_pin_name(pin, name)
    }

    /// Clone a pin from its auto-clone master into the master's collection
    pub(crate) fn clone_pin(&mut self, pin: PinId) -> Result<PinId> {
        let (t, direction) = self.locate_pin(pin).ok_or(GraphError::UnknownPin(pin))?;
        let collection = self.systems[t].collection_mut(direction);
        let master_id = collection
            .pin(pin)
            .and_then(|p| p.auto_clone_master())
            .ok_or(GraphError::NotAutoClone(pin))?;
        let clone = collection
            .pin_mut(master_id)
            .ok_or(GraphError::UnknownPin(master_id))?
            .spawn_clone();
        collection.add_pin(clone, "")
    }

    /// Give back one clone of `pin`'s family
    ///
    /// Removes the most recently added unconnected clone, never the master,
    /// and only while the family keeps another unconnected pin to accept the
    /// next connection. Returns `Ok(None)` when nothing needs removing.
    pub(crate) fn remove_clone_pin(&mut self, pin: PinId) -> Result<Option<Pin>> {
        let (t, direction) = self.locate_pin(pin).ok_or(GraphError::UnknownPin(pin))?;
        let behavior = self.behavior.as_ref();
        let collection = self.systems[t].collection_mut(direction);
        let master_id = collection
            .pin(pin)
            .and_then(|p| p.auto_clone_master())
            .ok_or(GraphError::NotAutoClone(pin))?;

        let free: Vec<&Pin> = collection
            .unconnected_pins()
            .filter(|p| p.auto_clone_master() == Some(master_id))
            .collect();
        if free.len() < 2 {
            return Ok(None);
        }
        let Some(victim) = free.iter().rev().find(|p| p.id() != master_id).map(|p| p.id()) else {
            return Ok(None);
        };

        let removed = collection.remove_pin(victim, |p| behavior.can_remove_pin(p))?;
        if let Some(master) = collection.pin_mut(master_id) {
            master.release_clone();
        }
        Ok(Some(removed))
    }

    // ------------------------------------------------------------------
    // Topology
    // ------------------------------------------------------------------

    /// Causal order from the last topology pass
    pub fn ordinal(&self, topology_system: usize) -> Option<usize> {
        self.systems.get(topology_system).and_then(|s| s.ordinal)
    }

    /// Index of the weakly-connected component from the last topology pass
    pub fn subgraph_affiliation(&self, topology_system: usize) -> Option<usize> {
        self.systems.get(topology_system).and_then(|s| s.subgraph)
    }

    /// Nodes reachable through this node's outputs, ascending by ordinal
    pub fn descendants(&self, topology_system: usize) -> &[NodeId] {
        self.systems
            .get(topology_system)
            .map(|s| s.descendants.as_slice())
            .unwrap_or(&[])
    }

    /// Whether `node` was found downstream of this node in the last pass
    pub fn has_descendant(&self, node: NodeId, topology_system: usize) -> bool {
        self.descendants(topology_system).contains(&node)
    }

    /// Whether this node was found downstream of `other` in the last pass
    pub fn is_descendant_of(&self, other: &Node, topology_system: usize) -> bool {
        other.has_descendant(self.id, topology_system)
    }

    /// No input pin of this system has an upstream connection
    pub fn is_top_level(&self, topology_system: usize) -> bool {
        self.inputs(topology_system)
            .pins()
            .iter()
            .all(|p| p.connected_output().is_none())
    }

    /// No output pin of this system has a downstream connection
    pub fn is_bottom_level(&self, topology_system: usize) -> bool {
        self.outputs(topology_system)
            .pins()
            .iter()
            .all(|p| !p.is_connected())
    }

    /// The node has no input pins at all in this system
    pub fn is_true_source(&self, topology_system: usize) -> bool {
        self.inputs(topology_system).is_empty()
    }

    /// The node has no output pins at all in this system
    pub fn is_true_dest(&self, topology_system: usize) -> bool {
        self.outputs(topology_system).is_empty()
    }

    pub(crate) fn set_graph(&mut self, graph: Option<GraphId>) {
        self.graph = graph;
    }

    pub(crate) fn set_topology(
        &mut self,
        topology_system: usize,
        ordinal: Option<usize>,
        subgraph: Option<usize>,
        descendants: Vec<NodeId>,
    ) {
        let slot = &mut self.systems[topology_system];
        slot.ordinal = ordinal;
        slot.subgraph = subgraph;
        slot.descendants = descendants;
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("graph", &self.graph)
            .field("systems", &self.systems)
            .finish_non_exhaustive()
    }
}
