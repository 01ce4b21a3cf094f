//! Read-only queries over the cached topology
//!
//! Nothing here triggers a recalculation. A topology system past
//! `MAX_TOPOLOGY_COUNT` reads as empty.

use super::Graph;
use crate::constants::MAX_TOPOLOGY_COUNT;
use crate::node::Node;
use crate::pin::Pin;
use crate::types::{NodeId, PinId, PinRef};

impl Graph {
    /// Nodes with no connected incoming edge
    pub fn top_level_nodes(&self, topology_system: usize) -> Vec<&Node> {
        if topology_system >= MAX_TOPOLOGY_COUNT {
            return Vec::new();
        }
        self.nodes
            .iter()
            .filter(|n| n.is_top_level(topology_system))
            .collect()
    }

    /// Nodes with no connected outgoing edge
    pub fn bottom_level_nodes(&self, topology_system: usize) -> Vec<&Node> {
        if topology_system >= MAX_TOPOLOGY_COUNT {
            return Vec::new();
        }
        self.nodes
            .iter()
            .filter(|n| n.is_bottom_level(topology_system))
            .collect()
    }

    pub fn max_ordinal(&self, topology_system: usize) -> usize {
        self.max_ordinal.get(topology_system).copied().unwrap_or(0)
    }

    pub fn sub_graph_count(&self, topology_system: usize) -> usize {
        self.sub_graph_count.get(topology_system).copied().unwrap_or(0)
    }

    /// Members of one weakly-connected component, in graph order
    pub fn sub_graph_nodes(&self, topology_system: usize, index: usize) -> Vec<&Node> {
        self.nodes
            .iter()
            .filter(|n| n.subgraph_affiliation(topology_system) == Some(index))
            .collect()
    }

    /// Every component, indexed by subgraph affiliation
    pub fn sub_graphs(&self, topology_system: usize) -> Vec<Vec<&Node>> {
        (0..self.sub_graph_count(topology_system))
            .map(|i| self.sub_graph_nodes(topology_system, i))
            .collect()
    }

    pub fn nodes_with_ordinal(&self, topology_system: usize, ordinal: usize) -> Vec<&Node> {
        self.nodes
            .iter()
            .filter(|n| n.ordinal(topology_system) == Some(ordinal))
            .collect()
    }

    /// Node names are not unique, so this may return several nodes
    pub fn nodes_with_name(&self, name: &str) -> Vec<&Node> {
        self.nodes.iter().filter(|n| n.name() == name).collect()
    }

    pub fn node_with_instance_id(&self, id: NodeId) -> Option<&Node> {
        self.node(id)
    }

    pub fn pin_with_instance_id(&self, id: PinId) -> Option<&Pin> {
        self.pin(id)
    }

    /// Nodes that have `node` among their descendants
    pub fn ascendants(&self, node: NodeId, topology_system: usize) -> Vec<&Node> {
        self.nodes
            .iter()
            .filter(|n| n.has_descendant(node, topology_system))
            .collect()
    }

    /// Every link in a topology system as `(output, input)` pairs, ordered
    /// by the input's node and pin position
    pub fn all_connections(&self, topology_system: usize) -> Vec<(PinRef, PinRef)> {
        if topology_system >= MAX_TOPOLOGY_COUNT {
            return Vec::new();
        }
        self.nodes
            .iter()
            .flat_map(|n| {
                n.inputs(topology_system).pins().iter().filter_map(move |p| {
                    p.connected_output()
                        .map(|output| (output, PinRef::new(n.id(), p.id())))
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::node::Node;
    use crate::pin::Pin;

    use super::*;

    fn sample() -> (Graph, Vec<NodeId>, Vec<PinId>) {
        // a -> b, a -> c, d alone; c is named like b
        let mut graph = Graph::new(1);
        let mut ids = Vec::new();
        let mut pins = Vec::new();
        for name in ["a", "b", "b", "d"] {
            let mut node = Node::new(name);
            pins.push(node.add_pin(0, Pin::input(), "in").unwrap());
            pins.push(node.add_pin(0, Pin::output(), "out").unwrap());
            ids.push(graph.add_node(node, true).unwrap());
        }
        graph.connect_to_input(pins[1], pins[2]).unwrap();
        graph.connect_to_input(pins[1], pins[4]).unwrap();
        (graph, ids, pins)
    }

    fn ids(nodes: Vec<&Node>) -> Vec<NodeId> {
        nodes.into_iter().map(Node::id).collect()
    }

    #[test]
    fn test_level_queries() {
        let (graph, n, _) = sample();
        assert_eq!(ids(graph.top_level_nodes(0)), vec![n[0], n[3]]);
        assert_eq!(ids(graph.bottom_level_nodes(0)), vec![n[1], n[2], n[3]]);
        assert_eq!(graph.max_ordinal(0), 1);
        assert_eq!(ids(graph.nodes_with_ordinal(0, 1)), vec![n[1], n[2]]);
    }

    #[test]
    fn test_sub_graph_queries() {
        let (graph, n, _) = sample();
        assert_eq!(graph.sub_graph_count(0), 2);
        let groups = graph.sub_graphs(0);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].len() + groups[1].len(), 4);

        let affiliation = graph.node(n[3]).unwrap().subgraph_affiliation(0).unwrap();
        assert_eq!(ids(graph.sub_graph_nodes(0, affiliation)), vec![n[3]]);
        assert!(graph.sub_graph_nodes(0, 7).is_empty());
    }

    #[test]
    fn test_lookup_queries() {
        let (graph, n, p) = sample();
        assert_eq!(ids(graph.nodes_with_name("b")), vec![n[1], n[2]]);
        assert!(graph.nodes_with_name("zzz").is_empty());
        assert_eq!(graph.node_with_instance_id(n[0]).unwrap().name(), "a");
        assert_eq!(graph.pin_with_instance_id(p[7]).unwrap().name(), "out");
        assert!(graph.node_with_instance_id(NodeId::new()).is_none());
    }

    #[test]
    fn test_ascendants_and_connections() {
        let (graph, n, p) = sample();
        assert_eq!(ids(graph.ascendants(n[2], 0)), vec![n[0]]);
        assert!(graph.ascendants(n[0], 0).is_empty());
        assert_eq!(
            graph.all_connections(0),
            vec![
                (PinRef::new(n[0], p[1]), PinRef::new(n[1], p[2])),
                (PinRef::new(n[0], p[1]), PinRef::new(n[2], p[4])),
            ]
        );
    }

    #[test]
    fn test_out_of_range_system_is_empty() {
        let (graph, _, _) = sample();
        assert_eq!(graph.max_ordinal(9), 0);
        assert_eq!(graph.sub_graph_count(9), 0);
        assert!(graph.top_level_nodes(MAX_TOPOLOGY_COUNT).is_empty());
        assert!(graph.bottom_level_nodes(MAX_TOPOLOGY_COUNT).is_empty());
        assert!(graph.all_connections(MAX_TOPOLOGY_COUNT).is_empty());
        assert!(graph.sub_graphs(9).is_empty());
        assert!(graph.nodes_with_ordinal(9, 0).is_empty());
    }
}
