//! The graph: node ownership, connection protocol and topology analysis
//!
//! `Graph` is the only way to connect or disconnect pins, so every change
//! goes through the same legality checks and is followed by a full topology
//! recalculation before the call returns.

mod connect;
mod query;
mod topology;

use std::collections::HashMap;
use std::fmt;

use crate::config::GraphConfig;
use crate::constants::MAX_TOPOLOGY_COUNT;
use crate::error::{GraphError, Result};
use crate::events::{EventSink, GraphEvent};
use crate::hooks::{DefaultGraphHooks, GraphHooks};
use crate::node::Node;
use crate::pin::Pin;
use crate::types::{GraphId, NodeId, PinDirection, PinId, PinRef};

/// Where a pin lives inside the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PinLocation {
    pub node_index: usize,
    pub node: NodeId,
    pub topology_system: usize,
    pub direction: PinDirection,
}

/// A collection of nodes interconnected through pins
pub struct Graph {
    id: GraphId,
    config: GraphConfig,
    nodes: Vec<Node>,
    index: HashMap<NodeId, usize>,
    sub_graph_count: [usize; MAX_TOPOLOGY_COUNT],
    max_ordinal: [usize; MAX_TOPOLOGY_COUNT],
    hooks: Box<dyn GraphHooks>,
    sinks: Vec<Box<dyn EventSink>>,
}

impl Graph {
    /// Create a graph computing `topology_count` topology systems
    ///
    /// A count of zero is treated as one; counts above `MAX_TOPOLOGY_COUNT`
    /// are clamped.
    pub fn new(topology_count: usize) -> Self {
        let clamped = topology_count.min(MAX_TOPOLOGY_COUNT);
        if clamped != topology_count {
            log::warn!(
                "topology count {} clamped to {}",
                topology_count,
                MAX_TOPOLOGY_COUNT
            );
        }
        let config = GraphConfig::with_topology_count(clamped.max(1));
        Self::from_valid_config(config)
    }

    /// Create a graph from a configuration
    pub fn with_config(config: GraphConfig) -> Result<Self> {
        Ok(Self::from_valid_config(config.validate()?))
    }

    fn from_valid_config(config: GraphConfig) -> Self {
        let mut graph = Self {
            id: GraphId::new(),
            config,
            nodes: Vec::new(),
            index: HashMap::new(),
            sub_graph_count: [0; MAX_TOPOLOGY_COUNT],
            max_ordinal: [0; MAX_TOPOLOGY_COUNT],
            hooks: Box::new(DefaultGraphHooks),
            sinks: Vec::new(),
        };
        graph.calculate_topology();
        graph
    }

    /// Replace the veto hooks and error sink
    pub fn with_hooks(mut self, hooks: impl GraphHooks + 'static) -> Self {
        self.set_hooks(hooks);
        self
    }

    pub fn set_hooks(&mut self, hooks: impl GraphHooks + 'static) {
        self.hooks = Box::new(hooks);
    }

    /// Register an event sink; sinks are called in registration order
    pub fn subscribe(&mut self, sink: impl EventSink + 'static) {
        self.sinks.push(Box::new(sink));
    }

    pub fn id(&self) -> GraphId {
        self.id
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Number of topology systems computed by this graph
    pub fn topology_count(&self) -> usize {
        self.config.topology_count
    }

    pub fn topology_enabled(&self) -> bool {
        self.config.topology_enabled
    }

    /// Toggle connection checks and recalculation
    ///
    /// Disabling lets callers bulk-load edges without legality checks;
    /// re-enabling recalculates immediately.
    pub fn set_topology_enabled(&mut self, enabled: bool) {
        if enabled == self.config.topology_enabled {
            return;
        }
        self.config.topology_enabled = enabled;
        self.calculate_topology();
    }

    // ------------------------------------------------------------------
    // Nodes
    // ------------------------------------------------------------------

    /// All nodes in insertion order
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.index.get(&id).map(|&i| &self.nodes[i])
    }

    /// Mutable access for renaming or adding pins; links cannot be edited
    /// through a node
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.index.get(&id).map(|&i| &mut self.nodes[i])
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.index.contains_key(&id)
    }

    /// Take ownership of a node
    ///
    /// With `recalculate` false the node gets ordinal 0 and a fresh subgraph
    /// index without a full pass, so callers can batch inserts before one
    /// deferred `calculate_topology`.
    pub fn add_node(&mut self, node: Node, recalculate: bool) -> Result<NodeId> {
        let id = self.attach(node)?;
        if recalculate {
            self.calculate_topology();
        } else {
            let index = self.index[&id];
            for t in 0..self.topology_count() {
                let subgraph = self.sub_graph_count[t];
                self.sub_graph_count[t] += 1;
                self.nodes[index].set_topology(t, Some(0), Some(subgraph), Vec::new());
            }
        }
        Ok(id)
    }

    /// Take ownership of several nodes and recalculate once
    ///
    /// Fails without adding anything if any node already belongs to a graph.
    pub fn add_nodes(&mut self, nodes: Vec<Node>) -> Result<Vec<NodeId>> {
        if let Some(node) = nodes.iter().find(|n| n.graph().is_some()) {
            return self.reject(GraphError::NodeAlreadyAttached(node.id()));
        }
        let ids = nodes
            .into_iter()
            .map(|node| self.attach(node))
            .collect::<Result<Vec<_>>>()?;
        self.calculate_topology();
        Ok(ids)
    }

    fn attach(&mut self, mut node: Node) -> Result<NodeId> {
        let id = node.id();
        if node.graph().is_some() || self.index.contains_key(&id) {
            return self.reject(GraphError::NodeAlreadyAttached(id));
        }

        node.set_graph(Some(self.id));
        let name = node.name().to_string();
        self.index.insert(id, self.nodes.len());
        self.nodes.push(node);

        log::debug!("Added node '{}' ({})", name, id);
        self.emit(GraphEvent::NodeAdded { node: id, name });
        Ok(id)
    }

    /// Disconnect and remove a node, handing it back to the caller
    ///
    /// Only `before_node_removed` can refuse; the node's links are then
    /// force-disconnected without consulting the disconnect veto.
    pub fn remove_node(&mut self, id: NodeId) -> Result<Node> {
        let Some(node) = self.node(id) else {
            return self.reject(GraphError::UnknownNode(id));
        };
        if !self.hooks.before_node_removed(self, node) {
            return self.reject(GraphError::vetoed(format!(
                "graph refused removal of node '{}'",
                node.name()
            )));
        }

        self.disconnect_all_pins(id, true)?;

        let index = self.index[&id];
        let mut node = self.nodes.remove(index);
        node.set_graph(None);
        self.reindex();

        log::debug!("Removed node '{}' ({})", node.name(), id);
        self.emit(GraphEvent::NodeRemoved { node: id });
        self.calculate_topology();
        Ok(node)
    }

    fn reindex(&mut self) {
        self.index = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id(), i))
            .collect();
    }

    // ------------------------------------------------------------------
    // Pins
    // ------------------------------------------------------------------

    pub(crate) fn locate(&self, pin: PinId) -> Option<PinLocation> {
        self.nodes.iter().enumerate().find_map(|(node_index, node)| {
            node.locate_pin(pin).map(|(topology_system, direction)| PinLocation {
                node_index,
                node: node.id(),
                topology_system,
                direction,
            })
        })
    }

    /// Find a pin anywhere in the graph by instance id
    pub fn pin(&self, id: PinId) -> Option<&Pin> {
        let location = self.locate(id)?;
        self.nodes[location.node_index].pin(id)
    }

    /// Handle for a pin in this graph
    pub fn pin_ref(&self, id: PinId) -> Option<PinRef> {
        self.locate(id).map(|l| PinRef::new(l.node, id))
    }

    pub(crate) fn pin_mut(&mut self, id: PinId) -> Option<&mut Pin> {
        let location = self.locate(id)?;
        self.nodes[location.node_index].pin_mut(id)
    }

    // ------------------------------------------------------------------
    // Notifications
    // ------------------------------------------------------------------

    /// Deliver an event to every sink, in registration order
    pub(crate) fn emit(&self, event: GraphEvent) {
        for sink in &self.sinks {
            if let Err(e) = sink.send(&event) {
                self.hooks.emit_error(&e.to_string());
            }
        }
    }

    /// Report an error through the hook and return it
    pub(crate) fn reject<T>(&self, err: GraphError) -> Result<T> {
        self.hooks.emit_error(&err.to_string());
        Err(err)
    }
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Graph")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("nodes", &self.nodes)
            .field("sub_graph_count", &self.sub_graph_count)
            .field("max_ordinal", &self.max_ordinal)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::events::VecEventSink;

    struct KeepNodes;

    impl GraphHooks for KeepNodes {
        fn before_node_removed(&self, _graph: &Graph, _node: &Node) -> bool {
            false
        }
    }

    #[test]
    fn test_new_graph_normalises_count() {
        assert_eq!(Graph::new(0).topology_count(), 1);
        assert_eq!(Graph::new(2).topology_count(), 2);
        assert_eq!(Graph::new(9).topology_count(), MAX_TOPOLOGY_COUNT);
        assert!(Graph::with_config(GraphConfig::with_topology_count(9)).is_err());
    }

    #[test]
    fn test_add_node_sets_parent() {
        let mut graph = Graph::new(1);
        let id = graph.add_node(Node::new("a"), true).unwrap();

        let node = graph.node(id).unwrap();
        assert_eq!(node.graph(), Some(graph.id()));
        assert_eq!(node.ordinal(0), Some(0));
        assert_eq!(node.subgraph_affiliation(0), Some(0));
        assert_eq!(graph.sub_graph_count(0), 1);
    }

    #[test]
    fn test_deferred_add_assigns_fresh_subgraphs() {
        let mut graph = Graph::new(1);
        let a = graph.add_node(Node::new("a"), false).unwrap();
        let b = graph.add_node(Node::new("b"), false).unwrap();

        assert_eq!(graph.node(a).unwrap().subgraph_affiliation(0), Some(0));
        assert_eq!(graph.node(b).unwrap().subgraph_affiliation(0), Some(1));
        assert_eq!(graph.node(b).unwrap().ordinal(0), Some(0));
        assert_eq!(graph.sub_graph_count(0), 2);

        graph.calculate_topology();
        assert_eq!(graph.sub_graph_count(0), 2);
    }

    #[test]
    fn test_removed_node_can_be_added_again() {
        let mut graph = Graph::new(1);
        let id = graph.add_node(Node::new("a"), true).unwrap();
        let node = graph.remove_node(id).unwrap();
        assert!(node.graph().is_none());
        assert!(graph.nodes().is_empty());
        assert_eq!(graph.sub_graph_count(0), 0);

        let mut other = Graph::new(1);
        assert_eq!(other.add_node(node, true).unwrap(), id);
    }

    #[test]
    fn test_remove_unknown_node() {
        let mut graph = Graph::new(1);
        assert!(matches!(
            graph.remove_node(NodeId::new()),
            Err(GraphError::UnknownNode(_))
        ));
    }

    #[test]
    fn test_remove_node_veto() {
        let mut graph = Graph::new(1).with_hooks(KeepNodes);
        let id = graph.add_node(Node::new("a"), true).unwrap();
        assert!(matches!(graph.remove_node(id), Err(GraphError::Vetoed(_))));
        assert!(graph.contains_node(id));
    }

    struct KeepLinks;

    impl GraphHooks for KeepLinks {
        fn before_pins_disconnected(&self, _graph: &Graph, _output: &Pin, _input: &Pin) -> bool {
            false
        }
    }

    #[test]
    fn test_remove_node_ignores_disconnect_veto() {
        let mut graph = Graph::new(1).with_hooks(KeepLinks);
        let mut a = Node::new("a");
        let a_out = a.add_pin(0, Pin::output(), "out").unwrap();
        let mut b = Node::new("b");
        let b_in = b.add_pin(0, Pin::input(), "in").unwrap();
        let b_extra = b.add_pin(0, Pin::input(), "extra").unwrap();
        let a = graph.add_node(a, true).unwrap();
        let b = graph.add_node(b, true).unwrap();
        graph.connect_to_input(a_out, b_in).unwrap();
        graph.connect_to_input(a_out, b_extra).unwrap();

        let removed = graph.remove_node(b).unwrap();
        assert!(!graph.contains_node(b));
        assert!(removed.inputs(0).connected_pins().next().is_none());
        assert!(!graph.pin(a_out).unwrap().is_connected());
        assert!(graph.node(a).unwrap().descendants(0).is_empty());
    }

    #[test]
    fn test_node_events_in_order() {
        let sink = Arc::new(VecEventSink::new());
        let mut graph = Graph::new(1);
        graph.subscribe(Arc::clone(&sink));

        let id = graph.add_node(Node::new("a"), false).unwrap();
        graph.remove_node(id).unwrap();

        let events = sink.events();
        assert_eq!(
            events[0],
            GraphEvent::NodeAdded {
                node: id,
                name: "a".to_string()
            }
        );
        assert_eq!(events[1], GraphEvent::NodeRemoved { node: id });
        assert!(matches!(events[2], GraphEvent::TopologyChanged { .. }));
    }

    #[test]
    fn test_add_nodes_batch() {
        let mut graph = Graph::new(1);
        let ids = graph
            .add_nodes(vec![Node::new("a"), Node::new("b"), Node::new("c")])
            .unwrap();
        assert_eq!(ids.len(), 3);
        assert_eq!(graph.sub_graph_count(0), 3);
        assert_eq!(graph.nodes_with_ordinal(0, 0).len(), 3);
    }

    #[test]
    fn test_pin_lookup_across_nodes() {
        let mut graph = Graph::new(2);
        let mut node = Node::new("a");
        let pin = node.add_pin(1, Pin::output(), "out").unwrap();
        let id = graph.add_node(node, true).unwrap();

        assert_eq!(graph.pin(pin).unwrap().name(), "out");
        assert_eq!(graph.pin_ref(pin), Some(PinRef::new(id, pin)));
        assert!(graph.pin(PinId::new()).is_none());
    }
}
