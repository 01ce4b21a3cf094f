//! Pin Graph - directed node graphs connected through named pins
//!
//! This crate provides a small, single-threaded graph engine in which nodes
//! own ordered collections of input and output pins. It supports:
//!
//! - Typed endpoints: an input pin accepts at most one output, an output pin
//!   may feed many inputs
//! - Topology analysis: causal ordinals (longest path depth), weakly-connected
//!   subgraph affiliation and descendant sets, per topology system
//! - Auto-cloning pins that replicate on connection for variable fan-in/out
//! - Veto hooks and synchronous event sinks around every mutation
//!
//! # Architecture
//!
//! - `Graph`: owns the nodes and is the only entry point for connecting and
//!   disconnecting pins, so topology is recalculated after every change
//! - `Node`: one input and one output `PinCollection` per topology system
//! - `Pin`: tagged input/output endpoint; links are non-owning `PinRef`s
//! - `GraphHooks` / `NodeBehavior`: overridable decision points
//!
//! # Example
//!
//! ```
//! use pin_graph::{Graph, Node, Pin};
//!
//! let mut graph = Graph::new(1);
//!
//! let mut a = Node::new("a");
//! let a_out = a.add_pin(0, Pin::output(), "out").unwrap();
//! let mut b = Node::new("b");
//! let b_in = b.add_pin(0, Pin::input(), "in").unwrap();
//!
//! let a = graph.add_node(a, true).unwrap();
//! let b = graph.add_node(b, true).unwrap();
//! graph.connect_to_input(a_out, b_in).unwrap();
//!
//! assert_eq!(graph.node(a).unwrap().ordinal(0), Some(0));
//! assert_eq!(graph.node(b).unwrap().ordinal(0), Some(1));
//! ```

pub mod collection;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod graph;
pub mod hooks;
pub mod node;
pub mod pin;
pub mod types;

// Re-export key types
pub use collection::PinCollection;
pub use config::GraphConfig;
pub use constants::MAX_TOPOLOGY_COUNT;
pub use error::{GraphError, Result};
pub use events::{EventError, EventSink, GraphEvent, NullEventSink, VecEventSink};
pub use graph::Graph;
pub use hooks::{DefaultGraphHooks, DefaultNodeBehavior, GraphHooks, NodeBehavior};
pub use node::Node;
pub use pin::Pin;
pub use types::{AutoCloneLimit, GraphId, NodeId, PinDirection, PinId, PinRef};
