//! Ordered, uniquely-named sets of pins
//!
//! A node owns one collection per direction per topology system. Insertion
//! order is preserved and significant: "first unconnected pin" queries walk
//! the pins in the order they were added.

use std::collections::HashMap;

use crate::error::{GraphError, Result};
use crate::pin::Pin;
use crate::types::{NodeId, PinDirection, PinId};

/// Pins of one direction belonging to one node in one topology system
#[derive(Debug)]
pub struct PinCollection {
    node: NodeId,
    direction: PinDirection,
    topology_system: usize,
    pins: Vec<Pin>,
    names: HashMap<String, PinId>,
}

impl PinCollection {
    pub(crate) fn new(node: NodeId, direction: PinDirection, topology_system: usize) -> Self {
        Self {
            node,
            direction,
            topology_system,
            pins: Vec::new(),
            names: HashMap::new(),
        }
    }

    /// Node owning this collection
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn direction(&self) -> PinDirection {
        self.direction
    }

    pub fn topology_system(&self) -> usize {
        self.topology_system
    }

    /// Attach a pin, naming it `name`
    ///
    /// An empty `name` keeps the pin's current name, or falls back to its
    /// instance id. A name already in use is disambiguated by stripping its
    /// digits and appending the lowest free numeric suffix.
    pub fn add_pin(&mut self, mut pin: Pin, name: &str) -> Result<PinId> {
        if pin.direction() != self.direction {
            return Err(GraphError::DirectionMismatch { pin: pin.id() });
        }

        let requested = if !name.is_empty() {
            name.to_string()
        } else if !pin.name().is_empty() {
            pin.name().to_string()
        } else {
            pin.id().to_string()
        };
        let unique = self.unique_name(requested);

        let id = pin.id();
        pin.set_name(unique.clone());
        pin.attach(self.node, self.topology_system);
        self.names.insert(unique, id);
        self.pins.push(pin);
        Ok(id)
    }

    fn unique_name(&self, requested: String) -> String {
        if !self.names.contains_key(&requested) {
            return requested;
        }

        let stem: String = requested.chars().filter(|c| !c.is_ascii_digit()).collect();
        (0..)
            .map(|n| format!("{}{}", stem, n))
            .find(|candidate| !self.names.contains_key(candidate))
            .unwrap_or(requested)
    }

    /// Find a pin by name
    pub fn get_pin(&self, name: &str) -> Option<&Pin> {
        self.names.get(name).and_then(|id| self.pin(*id))
    }

    /// Find a pin by instance id
    pub fn pin(&self, id: PinId) -> Option<&Pin> {
        self.pins.iter().find(|p| p.id() == id)
    }

    pub(crate) fn pin_mut(&mut self, id: PinId) -> Option<&mut Pin> {
        self.pins.iter_mut().find(|p| p.id() == id)
    }

    pub fn contains(&self, id: PinId) -> bool {
        self.index_of(id).is_some()
    }

    /// Position of a pin in insertion order
    pub fn index_of(&self, id: PinId) -> Option<usize> {
        self.pins.iter().position(|p| p.id() == id)
    }

    /// Detach an unconnected pin
    ///
    /// `can_remove` is the owning node's veto. The collection is left
    /// unchanged when the pin is absent, connected, or vetoed.
    pub fn remove_pin(&mut self, id: PinId, can_remove: impl FnOnce(&Pin) -> bool) -> Result<Pin> {
        let index = self.index_of(id).ok_or(GraphError::UnknownPin(id))?;
        let pin = &self.pins[index];
        if pin.is_connected() {
            return Err(GraphError::PinConnected(id));
        }
        if !can_remove(pin) {
            return Err(GraphError::vetoed(format!("node refused removal of pin '{}'", pin.name())));
        }

        let mut pin = self.pins.remove(index);
        self.names.remove(pin.name());
        pin.detach();
        Ok(pin)
    }

    /// Rename a pin, keeping names unique
    ///
    /// Returns false if another pin already uses `name`.
    pub fn set_pin_name(&mut self, id: PinId, name: &str) -> bool {
        let Some(current) = self.pin(id).map(|p| p.name().to_string()) else {
            return false;
        };
        if current == name {
            return true;
        }
        if self.names.contains_key(name) {
            return false;
        }

        self.names.remove(&current);
        self.names.insert(name.to_string(), id);
        if let Some(pin) = self.pin_mut(id) {
            pin.set_name(name.to_string());
        }
        true
    }

    /// All pins in insertion order
    pub fn pins(&self) -> &[Pin] {
        &self.pins
    }

    pub fn connected_pins(&self) -> impl Iterator<Item = &Pin> {
        self.pins.iter().filter(|p| p.is_connected())
    }

    pub fn unconnected_pins(&self) -> impl Iterator<Item = &Pin> {
        self.pins.iter().filter(|p| !p.is_connected())
    }

    /// First pin in insertion order without a connection
    pub fn first_unconnected_pin(&self) -> Option<&Pin> {
        self.unconnected_pins().next()
    }

    pub fn len(&self) -> usize {
        self.pins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PinRef;

    fn inputs() -> PinCollection {
        PinCollection::new(NodeId::new(), PinDirection::Input, 0)
    }

    #[test]
    fn test_add_pin_assigns_name_and_parent() {
        let mut pins = inputs();
        let id = pins.add_pin(Pin::input(), "in").unwrap();

        let pin = pins.get_pin("in").unwrap();
        assert_eq!(pin.id(), id);
        assert_eq!(pin.node(), Some(pins.node()));
        assert_eq!(pins.index_of(id), Some(0));
    }

    #[test]
    fn test_add_pin_rejects_wrong_direction() {
        let mut pins = inputs();
        let result = pins.add_pin(Pin::output(), "out");
        assert!(matches!(result, Err(GraphError::DirectionMismatch { .. })));
        assert!(pins.is_empty());
    }

    #[test]
    fn test_name_collision_gets_lowest_free_suffix() {
        let mut pins = inputs();
        pins.add_pin(Pin::input(), "in1").unwrap();
        pins.add_pin(Pin::input(), "in0").unwrap();
        let third = pins.add_pin(Pin::input(), "in1").unwrap();

        assert_eq!(pins.pin(third).unwrap().name(), "in2");
        assert_eq!(pins.len(), 3);
    }

    #[test]
    fn test_unnamed_pin_uses_instance_id() {
        let mut pins = inputs();
        let id = pins.add_pin(Pin::input(), "").unwrap();
        assert_eq!(pins.pin(id).unwrap().name(), id.to_string());
    }

    #[test]
    fn test_remove_pin_rules() {
        let mut pins = inputs();
        let free = pins.add_pin(Pin::input(), "free").unwrap();
        let busy = pins.add_pin(Pin::input(), "busy").unwrap();
        pins.pin_mut(busy)
            .unwrap()
            .push_link(PinRef::new(NodeId::new(), PinId::new()));

        assert!(matches!(pins.remove_pin(busy, |_| true), Err(GraphError::PinConnected(_))));
        assert!(matches!(pins.remove_pin(free, |_| false), Err(GraphError::Vetoed(_))));
        assert_eq!(pins.len(), 2);

        let removed = pins.remove_pin(free, |_| true).unwrap();
        assert_eq!(removed.name(), "free");
        assert!(removed.node().is_none());
        assert!(pins.get_pin("free").is_none());
        assert!(matches!(pins.remove_pin(free, |_| true), Err(GraphError::UnknownPin(_))));
    }

    #[test]
    fn test_first_unconnected_respects_order() {
        let mut pins = inputs();
        let a = pins.add_pin(Pin::input(), "a").unwrap();
        let b = pins.add_pin(Pin::input(), "b").unwrap();
        assert_eq!(pins.first_unconnected_pin().unwrap().id(), a);

        pins.pin_mut(a)
            .unwrap()
            .push_link(PinRef::new(NodeId::new(), PinId::new()));
        assert_eq!(pins.first_unconnected_pin().unwrap().id(), b);
        assert_eq!(pins.connected_pins().count(), 1);
    }

    #[test]
    fn test_set_pin_name() {
        let mut pins = inputs();
        let a = pins.add_pin(Pin::input(), "a").unwrap();
        pins.add_pin(Pin::input(), "b").unwrap();

        assert!(!pins.set_pin_name(a, "b"));
        assert!(pins.set_pin_name(a, "a"));
        assert!(pins.set_pin_name(a, "c"));
        assert_eq!(pins.get_pin("c").unwrap().id(), a);
        assert!(pins.get_pin("a").is_none());
        assert_eq!(pins.pin(a).unwrap().original_name(), Some("a"));
    }
}
