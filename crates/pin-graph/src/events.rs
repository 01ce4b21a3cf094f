//! Event types for observing graph changes
//!
//! Events are delivered synchronously, in sink registration order, before
//! the mutating call that produced them returns.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::types::{NodeId, PinId, PinRef};

/// Trait for receiving graph events
///
/// Sinks abstract over whatever the embedding application wants to do with
/// notifications (collect them, forward them to a channel, redraw a view).
pub trait EventSink: Send {
    /// Deliver an event
    ///
    /// Returns an error if the event could not be handled; the graph reports
    /// the failure through its error hook and carries on.
    fn send(&self, event: &GraphEvent) -> Result<(), EventError>;
}

impl<T: EventSink + Sync + ?Sized> EventSink for Arc<T> {
    fn send(&self, event: &GraphEvent) -> Result<(), EventError> {
        (**self).send(event)
    }
}

/// Error when delivering events fails
#[derive(Debug, Clone)]
pub struct EventError {
    pub message: String,
}

impl std::fmt::Display for EventError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Event error: {}", self.message)
    }
}

impl std::error::Error for EventError {}

impl EventError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn channel_closed() -> Self {
        Self::new("Channel closed")
    }
}

/// Events emitted while a graph is edited
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GraphEvent {
    /// A node became part of the graph
    #[serde(rename_all = "camelCase")]
    NodeAdded { node: NodeId, name: String },

    /// A node was removed from the graph
    #[serde(rename_all = "camelCase")]
    NodeRemoved { node: NodeId },

    /// An output pin was connected to an input pin
    #[serde(rename_all = "camelCase")]
    PinsConnected { output: PinRef, input: PinRef },

    /// An output pin was disconnected from an input pin
    #[serde(rename_all = "camelCase")]
    PinsDisconnected { output: PinRef, input: PinRef },

    /// A pin was cloned from its auto-clone master
    #[serde(rename_all = "camelCase")]
    PinCloned {
        node: NodeId,
        master: PinId,
        pin: PinId,
        name: String,
    },

    /// A pin was removed from its collection
    #[serde(rename_all = "camelCase")]
    PinRemoved {
        node: NodeId,
        pin: PinId,
        name: String,
    },

    /// Topology was recalculated
    #[serde(rename_all = "camelCase")]
    TopologyChanged {
        sub_graph_counts: Vec<usize>,
        max_ordinals: Vec<usize>,
    },
}

/// A no-op event sink that discards all events
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn send(&self, _event: &GraphEvent) -> Result<(), EventError> {
        Ok(())
    }
}

/// A vector-based event sink that collects events
///
/// Useful for tests that assert on emitted notifications.
pub struct VecEventSink {
    events: Mutex<Vec<GraphEvent>>,
}

impl VecEventSink {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    /// Get all collected events
    pub fn events(&self) -> Vec<GraphEvent> {
        self.events.lock().clone()
    }

    /// Clear all collected events
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl Default for VecEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for VecEventSink {
    fn send(&self, event: &GraphEvent) -> Result<(), EventError> {
        self.events.lock().push(event.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_event_sink() {
        let sink = VecEventSink::new();
        let node = NodeId::new();

        sink.send(&GraphEvent::NodeRemoved { node }).unwrap();

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0], GraphEvent::NodeRemoved { node });

        sink.clear();
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_shared_sink_through_arc() {
        let sink = Arc::new(VecEventSink::new());
        let shared: Box<dyn EventSink> = Box::new(Arc::clone(&sink));

        shared
            .send(&GraphEvent::TopologyChanged {
                sub_graph_counts: vec![1],
                max_ordinals: vec![0],
            })
            .unwrap();

        assert_eq!(sink.events().len(), 1);
    }

    #[test]
    fn test_event_serialization_is_tagged() {
        let node = NodeId::new();
        let json = serde_json::to_value(GraphEvent::NodeAdded {
            node,
            name: "a".to_string(),
        })
        .unwrap();
        assert_eq!(json["type"], "nodeAdded");
        assert_eq!(json["name"], "a");
    }

    #[test]
    fn test_null_event_sink() {
        NullEventSink
            .send(&GraphEvent::NodeRemoved { node: NodeId::new() })
            .unwrap();
    }
}
