//! Inheritance graph construction and ordered folding
//!
//! Each document becomes one node with an auto-cloning input pin, so any
//! number of documents can inherit from it, and a plain output pin. A
//! document's output is connected into the input of every document it
//! inherits from, which puts the most inherited documents at the highest
//! ordinals. Folding walks the ordinals from the highest down to 0, so base
//! documents are merged first and their heirs override them.

use std::collections::{HashMap, HashSet};
use std::fmt;

use pin_graph::{AutoCloneLimit, Graph, GraphConfig, Node, NodeId, Pin, PinId};

use crate::config::ResolverConfig;
use crate::error::{ResolveError, Result};

/// A document that can inherit from other documents by name
pub trait Inheritable {
    /// Unique name other documents refer to
    fn name(&self) -> &str;

    /// Names of the documents this one inherits from
    fn inherits(&self) -> &[String];
}

/// Orders a set of documents by their inheritance relations
pub struct InheritanceResolver<D> {
    config: ResolverConfig,
    graph: Graph,
    nodes: HashMap<String, NodeId>,
    documents: HashMap<NodeId, D>,
    root: Option<NodeId>,
}

impl<D: Inheritable> InheritanceResolver<D> {
    /// Build the inheritance graph with the default configuration
    pub fn new(documents: Vec<D>) -> Result<Self> {
        Self::with_config(documents, ResolverConfig::default())
    }

    /// Build the inheritance graph
    ///
    /// Fails on duplicate document names or an inherited name that matches
    /// no document. An inheritance edge the graph refuses (a cycle) is
    /// skipped with a warning.
    pub fn with_config(documents: Vec<D>, config: ResolverConfig) -> Result<Self> {
        config.validate()?;

        {
            let mut seen = HashSet::new();
            if let Some(dup) = documents.iter().find(|d| !seen.insert(d.name())) {
                return Err(ResolveError::DuplicateDocument(dup.name().to_string()));
            }
        }

        let graph = Graph::with_config(GraphConfig::with_topology_count(
            config.topology_system + 1,
        ))?;
        let mut resolver = Self {
            config,
            graph,
            nodes: HashMap::new(),
            documents: HashMap::new(),
            root: None,
        };

        let nodes = documents
            .iter()
            .map(|d| resolver.document_node(d.name()))
            .collect::<Result<Vec<_>>>()?;
        let ids = resolver.graph.add_nodes(nodes)?;
        resolver.nodes = documents
            .iter()
            .zip(&ids)
            .map(|(d, id)| (d.name().to_string(), *id))
            .collect();

        for (document, &id) in documents.iter().zip(&ids) {
            resolver.connect_inherited(document, id)?;
        }
        resolver.documents = ids.into_iter().zip(documents).collect();

        if !resolver.documents.is_empty() {
            resolver.splice_root()?;
        }
        Ok(resolver)
    }

    fn document_node(&self, name: &str) -> Result<Node> {
        let t = self.config.topology_system;
        let mut node = Node::new(name);
        node.add_pin(
            t,
            Pin::input().with_auto_clone(AutoCloneLimit::Unbounded, ""),
            &self.config.input_pin,
        )?;
        node.add_pin(t, Pin::output(), &self.config.output_pin)?;
        Ok(node)
    }

    fn output_pin(&self, node: NodeId, document: &str) -> Result<PinId> {
        self.graph
            .node(node)
            .and_then(|n| n.output_pin(&self.config.output_pin, self.config.topology_system))
            .map(Pin::id)
            .ok_or_else(|| ResolveError::MissingPin {
                document: document.to_string(),
                pin: self.config.output_pin.clone(),
            })
    }

    fn free_input(&self, node: NodeId, document: &str) -> Result<PinId> {
        self.graph
            .node(node)
            .and_then(|n| n.first_unconnected_input_pin(self.config.topology_system))
            .map(Pin::id)
            .ok_or_else(|| ResolveError::MissingPin {
                document: document.to_string(),
                pin: self.config.input_pin.clone(),
            })
    }

    fn connect_inherited(&mut self, document: &D, node: NodeId) -> Result<()> {
        let output = self.output_pin(node, document.name())?;
        for parent in document.inherits() {
            let Some(&target) = self.nodes.get(parent) else {
                return Err(ResolveError::UnknownDocument {
                    document: document.name().to_string(),
                    inherits: parent.clone(),
                });
            };
            let input = self.free_input(target, parent)?;
            if let Err(e) = self.graph.can_connect(output, input) {
                log::warn!(
                    "Skipping inheritance of '{}' by '{}': {}",
                    parent,
                    document.name(),
                    e
                );
                continue;
            }
            self.graph.connect_to_input(output, input)?;
        }
        Ok(())
    }

    /// Funnel disjoint trees, or several most-inherited documents, into one
    /// empty root so folding ends at a single node
    fn splice_root(&mut self) -> Result<()> {
        let t = self.config.topology_system;
        let sub_graphs = self.graph.sub_graph_count(t);
        let max = self.graph.max_ordinal(t);
        let heads_at_max = self.graph.nodes_with_ordinal(t, max).len();
        if sub_graphs == 1 && heads_at_max == 1 {
            return Ok(());
        }
        log::warn!(
            "Inheritance graph has {} subgraphs and {} documents at ordinal {}, adding a root",
            sub_graphs,
            heads_at_max,
            max
        );

        let pin_name = self.config.output_pin.clone();
        let mut heads = Vec::new();
        for members in self.graph.sub_graphs(t) {
            let top = members.iter().filter_map(|n| n.ordinal(t)).max();
            for node in members.iter().filter(|n| n.ordinal(t) == top) {
                let pin = node
                    .output_pin(&pin_name, t)
                    .ok_or_else(|| ResolveError::MissingPin {
                        document: node.name().to_string(),
                        pin: pin_name.clone(),
                    })?;
                heads.push(pin.id());
            }
        }

        let root_name = self.config.root_name.clone();
        let node = self.document_node(&root_name)?;
        let root = self.graph.add_node(node, true)?;
        for head in heads {
            let input = self.free_input(root, &root_name)?;
            self.graph.connect_to_input(head, input)?;
        }
        self.root = Some(root);
        Ok(())
    }

    /// Documents from the most inherited to the least
    ///
    /// Documents sharing an ordinal keep their input order. The synthetic
    /// root, if any, carries no document and is left out.
    pub fn evaluation_order(&self) -> Vec<&D> {
        let t = self.config.topology_system;
        (0..=self.graph.max_ordinal(t))
            .rev()
            .flat_map(|ordinal| self.graph.nodes_with_ordinal(t, ordinal))
            .filter_map(|node| self.documents.get(&node.id()))
            .collect()
    }

    /// Fold the documents in evaluation order
    pub fn resolve<A, E, F>(&self, init: A, mut merge: F) -> Result<A>
    where
        F: FnMut(A, &D) -> std::result::Result<A, E>,
        E: fmt::Display,
    {
        self.evaluation_order()
            .into_iter()
            .try_fold(init, |acc, document| {
                log::debug!("Merging document '{}'", document.name());
                merge(acc, document).map_err(|e| ResolveError::merge(document.name(), e.to_string()))
            })
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// The synthetic root node, if one was needed
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Graph node carrying a document
    pub fn node_id(&self, name: &str) -> Option<NodeId> {
        self.nodes.get(name).copied()
    }

    pub fn document(&self, name: &str) -> Option<&D> {
        self.node_id(name).and_then(|id| self.documents.get(&id))
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl<D> fmt::Debug for InheritanceResolver<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InheritanceResolver")
            .field("config", &self.config)
            .field("graph", &self.graph)
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Doc {
        name: String,
        inherits: Vec<String>,
    }

    impl Inheritable for Doc {
        fn name(&self) -> &str {
            &self.name
        }

        fn inherits(&self) -> &[String] {
            &self.inherits
        }
    }

    fn doc(name: &str, inherits: &[&str]) -> Doc {
        Doc {
            name: name.to_string(),
            inherits: inherits.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn order(resolver: &InheritanceResolver<Doc>) -> Vec<&str> {
        resolver
            .evaluation_order()
            .into_iter()
            .map(|d| d.name.as_str())
            .collect()
    }

    fn ordinal(resolver: &InheritanceResolver<Doc>, name: &str) -> Option<usize> {
        let id = resolver.node_id(name).unwrap();
        resolver.graph().node(id).unwrap().ordinal(0)
    }

    #[test]
    fn test_two_documents_inherit_default() {
        let _ = env_logger::builder().is_test(true).try_init();
        let resolver = InheritanceResolver::new(vec![
            doc("default", &[]),
            doc("SD15", &["default"]),
            doc("SDXL", &["default"]),
        ])
        .unwrap();

        assert_eq!(ordinal(&resolver, "SD15"), Some(0));
        assert_eq!(ordinal(&resolver, "SDXL"), Some(0));
        assert_eq!(ordinal(&resolver, "default"), Some(1));
        assert_eq!(resolver.graph().sub_graph_count(0), 1);
        assert!(resolver.root().is_none());

        let default = resolver.node_id("default").unwrap();
        assert_eq!(resolver.graph().node(default).unwrap().inputs(0).len(), 3);

        let order = order(&resolver);
        assert_eq!(order[0], "default");
        assert_eq!(order.len(), 3);
    }

    #[test]
    fn test_chain_folds_base_first() {
        let resolver = InheritanceResolver::new(vec![
            doc("leaf", &["mid"]),
            doc("mid", &["base"]),
            doc("base", &[]),
        ])
        .unwrap();
        assert_eq!(order(&resolver), vec!["base", "mid", "leaf"]);
        assert_eq!(ordinal(&resolver, "base"), Some(2));
    }

    #[test]
    fn test_diamond_inheritance() {
        let resolver = InheritanceResolver::new(vec![
            doc("base", &[]),
            doc("a", &["base"]),
            doc("b", &["base"]),
            doc("top", &["a", "b"]),
        ])
        .unwrap();
        assert_eq!(order(&resolver), vec!["base", "a", "b", "top"]);
        assert!(resolver.root().is_none());
    }

    #[test]
    fn test_disjoint_documents_get_root() {
        let resolver = InheritanceResolver::new(vec![doc("x", &[]), doc("y", &[])]).unwrap();

        let root = resolver.root().unwrap();
        let graph = resolver.graph();
        assert_eq!(graph.sub_graph_count(0), 1);
        assert_eq!(graph.node(root).unwrap().ordinal(0), Some(1));
        assert_eq!(graph.nodes_with_ordinal(0, 1).len(), 1);
        assert_eq!(order(&resolver), vec!["x", "y"]);
        assert_eq!(resolver.len(), 2);
    }

    #[test]
    fn test_several_bases_get_root() {
        let resolver = InheritanceResolver::new(vec![
            doc("p", &[]),
            doc("q", &[]),
            doc("x", &["p", "q"]),
        ])
        .unwrap();

        let root = resolver.root().unwrap();
        assert_eq!(resolver.graph().node(root).unwrap().ordinal(0), Some(2));
        assert_eq!(order(&resolver), vec!["p", "q", "x"]);
    }

    #[test]
    fn test_cyclic_inheritance_is_skipped() {
        let resolver =
            InheritanceResolver::new(vec![doc("a", &["b"]), doc("b", &["a"])]).unwrap();
        assert_eq!(order(&resolver), vec!["b", "a"]);
        assert_eq!(
            resolver.graph().all_connections(0).len(),
            1,
            "only the first edge survives"
        );
    }

    #[test]
    fn test_self_inheritance_is_skipped() {
        let resolver = InheritanceResolver::new(vec![doc("a", &["a"])]).unwrap();
        assert_eq!(order(&resolver), vec!["a"]);
    }

    #[test]
    fn test_unknown_and_duplicate_names() {
        let err = InheritanceResolver::new(vec![doc("a", &["zzz"])]).unwrap_err();
        assert!(matches!(err, ResolveError::UnknownDocument { .. }));

        let err = InheritanceResolver::new(vec![doc("a", &[]), doc("a", &[])]).unwrap_err();
        assert!(matches!(err, ResolveError::DuplicateDocument(name) if name == "a"));
    }

    #[test]
    fn test_empty_input() {
        let resolver = InheritanceResolver::<Doc>::new(Vec::new()).unwrap();
        assert!(resolver.is_empty());
        assert!(resolver.root().is_none());
        assert!(resolver.evaluation_order().is_empty());
    }

    #[test]
    fn test_resolve_folds_in_order() {
        let resolver =
            InheritanceResolver::new(vec![doc("child", &["parent"]), doc("parent", &[])]).unwrap();
        let folded = resolver
            .resolve(String::new(), |mut acc, d| {
                acc.push_str(&d.name);
                acc.push('/');
                Ok::<_, String>(acc)
            })
            .unwrap();
        assert_eq!(folded, "parent/child/");
    }

    #[test]
    fn test_resolve_reports_merge_failure() {
        let resolver = InheritanceResolver::new(vec![doc("child", &["parent"]), doc("parent", &[])])
            .unwrap();
        let err = resolver
            .resolve((), |_, d| {
                if d.name == "child" {
                    Err("refused")
                } else {
                    Ok(())
                }
            })
            .unwrap_err();
        assert!(matches!(err, ResolveError::Merge { document, .. } if document == "child"));
    }

    #[test]
    fn test_custom_config() {
        let config = ResolverConfig {
            topology_system: 1,
            input_pin: "parents".into(),
            output_pin: "child".into(),
            root_name: "root".into(),
        };
        let resolver =
            InheritanceResolver::with_config(vec![doc("x", &[]), doc("y", &[])], config).unwrap();

        let root = resolver.graph().node(resolver.root().unwrap()).unwrap();
        assert_eq!(root.name(), "root");
        assert_eq!(root.ordinal(1), Some(1));
        assert!(root.input_pin("parents", 1).is_some());
        assert_eq!(resolver.graph().sub_graph_count(0), 3);
    }
}
