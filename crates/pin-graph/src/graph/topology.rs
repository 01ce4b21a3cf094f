//! Topology analysis
//!
//! For each topology system the pass assigns every node reachable from a
//! top-level node its ordinal (longest path in hops from any top-level
//! node), its subgraph affiliation (weakly-connected component) and its
//! descendants. A node reached again along a longer path is revisited so its
//! ordinal, and the ordinals below it, converge to the maximum depth.

use std::collections::BTreeSet;

use super::Graph;
use crate::constants::MAX_TOPOLOGY_COUNT;
use crate::events::GraphEvent;

/// Working state of one topology system's pass, indexed by node position
struct TopologyPass {
    children: Vec<Vec<usize>>,
    ordinal: Vec<Option<usize>>,
    descendants: Vec<BTreeSet<usize>>,
    finished: Vec<bool>,
    on_path: Vec<bool>,
    max_ordinal: usize,
    cycles: Vec<(usize, usize)>,
}

impl TopologyPass {
    fn visit(&mut self, node: usize, level: usize, touched: &mut BTreeSet<usize>) {
        touched.insert(node);
        if self.finished[node] && self.ordinal[node].is_some_and(|o| o >= level) {
            return;
        }

        self.ordinal[node] = Some(self.ordinal[node].map_or(level, |o| o.max(level)));
        self.max_ordinal = self.max_ordinal.max(level);
        self.on_path[node] = true;

        for i in 0..self.children[node].len() {
            let child = self.children[node][i];
            if self.on_path[child] {
                self.cycles.push((node, child));
                continue;
            }
            self.visit(child, level + 1, touched);

            let below = self.descendants[child].clone();
            let own = &mut self.descendants[node];
            own.insert(child);
            own.extend(below);
        }

        self.on_path[node] = false;
        self.finished[node] = true;
    }
}

impl Graph {
    /// Recompute ordinals, subgraph affiliations and descendants
    ///
    /// Does nothing while topology is disabled. Connects, disconnects and
    /// node removal call this automatically; call it directly after adding
    /// nodes with deferred recalculation.
    pub fn calculate_topology(&mut self) {
        if !self.topology_enabled() {
            log::debug!("Topology disabled, skipping recalculation");
            return;
        }

        for t in 0..MAX_TOPOLOGY_COUNT {
            if t < self.topology_count() {
                self.calculate_system(t);
            } else {
                for node in &mut self.nodes {
                    node.set_topology(t, None, None, Vec::new());
                }
                self.sub_graph_count[t] = 0;
                self.max_ordinal[t] = 0;
            }
        }

        let count = self.topology_count();
        log::debug!(
            "Topology recalculated: subgraphs {:?}, max ordinals {:?}",
            &self.sub_graph_count[..count],
            &self.max_ordinal[..count]
        );
        self.emit(GraphEvent::TopologyChanged {
            sub_graph_counts: self.sub_graph_count[..count].to_vec(),
            max_ordinals: self.max_ordinal[..count].to_vec(),
        });
    }

    fn calculate_system(&mut self, t: usize) {
        let count = self.nodes.len();
        let mut children = vec![Vec::new(); count];
        let mut has_parent = vec![false; count];

        for (i, node) in self.nodes.iter().enumerate() {
            for pin in node.outputs(t).pins() {
                for input in pin.connected_inputs() {
                    if let Some(&child) = self.index.get(&input.node) {
                        if !children[i].contains(&child) {
                            children[i].push(child);
                        }
                    }
                }
            }
            has_parent[i] = node
                .inputs(t)
                .pins()
                .iter()
                .filter_map(|p| p.connected_output())
                .any(|r| self.index.contains_key(&r.node));
        }

        let mut pass = TopologyPass {
            children,
            ordinal: vec![None; count],
            descendants: vec![BTreeSet::new(); count],
            finished: vec![false; count],
            on_path: vec![false; count],
            max_ordinal: 0,
            cycles: Vec::new(),
        };

        let mut groups: Vec<BTreeSet<usize>> = Vec::new();
        for top in (0..count).filter(|&i| !has_parent[i]) {
            let mut touched = BTreeSet::new();
            pass.visit(top, 0, &mut touched);

            // union with every accumulated group this one touches
            let mut first = None;
            let mut i = 0;
            while i < groups.len() {
                if groups[i].is_disjoint(&touched) {
                    i += 1;
                    continue;
                }
                if first.is_none() {
                    first = Some(i);
                    touched.append(&mut groups[i]);
                    i += 1;
                } else {
                    let mut merged = groups.remove(i);
                    touched.append(&mut merged);
                }
            }
            match first {
                Some(i) => groups[i] = touched,
                None => groups.push(touched),
            }
        }

        let mut subgraph = vec![None; count];
        for (index, group) in groups.iter().enumerate() {
            for &node in group {
                subgraph[node] = Some(index);
            }
        }

        let TopologyPass {
            ordinal,
            descendants,
            max_ordinal,
            cycles,
            ..
        } = pass;

        for (i, below) in descendants.into_iter().enumerate() {
            let mut sorted: Vec<usize> = below.into_iter().collect();
            sorted.sort_by_key(|&d| (ordinal[d], d));
            let ids = sorted.into_iter().map(|d| self.nodes[d].id()).collect();
            self.nodes[i].set_topology(t, ordinal[i], subgraph[i], ids);
        }
        self.sub_graph_count[t] = groups.len();
        self.max_ordinal[t] = max_ordinal;

        for (from, to) in cycles {
            self.hooks.emit_error(&format!(
                "cycle in topology system {}: '{}' -> '{}'",
                t,
                self.nodes[from].name(),
                self.nodes[to].name()
            ));
        }
    }
}
