//! Connect / disconnect protocol
//!
//! Every successful link change recalculates topology and then runs the
//! auto-clone pass: a connect may grow a clone family, a disconnect may give
//! one pin back. Clone bookkeeping failures are reported through the error
//! hook and never undo the link change that caused them.

use super::{Graph, PinLocation};
use crate::constants::MAX_TOPOLOGY_COUNT;
use crate::error::{GraphError, Result};
use crate::events::GraphEvent;
use crate::pin::Pin;
use crate::types::{NodeId, PinDirection, PinId, PinRef};

impl Graph {
    fn locate_as(&self, pin: PinId, direction: PinDirection) -> Result<PinLocation> {
        let Some(location) = self.locate(pin) else {
            return self.reject(GraphError::UnknownPin(pin));
        };
        if location.direction != direction {
            return self.reject(GraphError::DirectionMismatch { pin });
        }
        Ok(location)
    }

    fn located_pin(&self, location: &PinLocation, pin: PinId) -> Result<&Pin> {
        self.nodes[location.node_index]
            .pin(pin)
            .ok_or(GraphError::UnknownPin(pin))
    }

    /// Check whether `output` may be connected to `input` right now
    ///
    /// Runs the acceptance rules of both ends against the topology from the
    /// last pass. The cycle rule is a heuristic over that cached topology,
    /// not a reachability search over the pending edge. Does not consult the
    /// graph's veto hook.
    pub fn can_connect(&self, output: PinId, input: PinId) -> Result<()> {
        let out_loc = self.locate_as(output, PinDirection::Output)?;
        let in_loc = self.locate_as(input, PinDirection::Input)?;
        self.check_connect(&out_loc, output, &in_loc, input)
    }

    fn check_connect(
        &self,
        out_loc: &PinLocation,
        output: PinId,
        in_loc: &PinLocation,
        input: PinId,
    ) -> Result<()> {
        if out_loc.topology_system != in_loc.topology_system {
            return self.reject(GraphError::TopologyMismatch {
                output: out_loc.topology_system,
                input: in_loc.topology_system,
            });
        }
        if out_loc.node == in_loc.node {
            return self.reject(GraphError::SameNode { node: out_loc.node });
        }

        let t = out_loc.topology_system;
        let out_node = &self.nodes[out_loc.node_index];
        let in_node = &self.nodes[in_loc.node_index];
        let out_pin = self.located_pin(out_loc, output)?;
        let in_pin = self.located_pin(in_loc, input)?;

        // input end: refuse an upstream node that already sits below us
        if in_node.has_descendant(out_node.id(), t) && out_node.ordinal(t) > in_node.ordinal(t) {
            return self.reject(GraphError::WouldCycle {
                from: out_node.id(),
                to: in_node.id(),
            });
        }

        // output end
        if in_pin.is_connected() {
            return self.reject(GraphError::AlreadyConnected { pin: input });
        }
        if out_pin.is_connected() && !out_pin.allow_multi_connect() {
            return self.reject(GraphError::MultiConnectDisallowed { pin: output });
        }
        if in_node.has_descendant(out_node.id(), t) && in_node.ordinal(t) < out_node.ordinal(t) {
            return self.reject(GraphError::WouldCycle {
                from: out_node.id(),
                to: in_node.id(),
            });
        }
        Ok(())
    }

    /// Connect an output pin to an input pin
    ///
    /// With topology enabled the link must pass `can_connect`. With topology
    /// disabled only direction and topology system are checked, and an
    /// already-connected input is first disconnected (unless it belongs to an
    /// auto-clone family).
    pub fn connect_to_input(&mut self, output: PinId, input: PinId) -> Result<()> {
        let out_loc = self.locate_as(output, PinDirection::Output)?;
        let in_loc = self.locate_as(input, PinDirection::Input)?;

        if self.topology_enabled() {
            self.check_connect(&out_loc, output, &in_loc, input)?;
        } else if out_loc.topology_system != in_loc.topology_system {
            return self.reject(GraphError::TopologyMismatch {
                output: out_loc.topology_system,
                input: in_loc.topology_system,
            });
        }

        let in_pin = self.located_pin(&in_loc, input)?;
        if in_pin.is_connected() {
            if in_pin.auto_clone_master().is_some() {
                return self.reject(GraphError::CloneSwap { pin: input });
            }
            self.disconnect_input(input, false)?;
        }

        // the swap above may have given back clone pins, so look again
        let out_loc = self.locate_as(output, PinDirection::Output)?;
        let in_loc = self.locate_as(input, PinDirection::Input)?;
        let out_pin = self.located_pin(&out_loc, output)?;
        let in_pin = self.located_pin(&in_loc, input)?;
        if !self.hooks.before_pins_connected(self, out_pin, in_pin) {
            return self.reject(GraphError::vetoed(format!(
                "graph refused connection from '{}' to '{}'",
                out_pin.name(),
                in_pin.name()
            )));
        }

        let out_ref = PinRef::new(out_loc.node, output);
        let in_ref = PinRef::new(in_loc.node, input);
        if let Some(pin) = self.pin_mut(output) {
            pin.push_link(in_ref);
        }
        if let Some(pin) = self.pin_mut(input) {
            pin.push_link(out_ref);
        }

        log::debug!("Connected {} -> {}", out_ref, in_ref);
        self.emit(GraphEvent::PinsConnected {
            output: out_ref,
            input: in_ref,
        });
        self.calculate_topology();

        self.expand_clone(out_ref);
        self.expand_clone(in_ref);
        Ok(())
    }

    fn expand_clone(&mut self, pin: PinRef) {
        let Some(&index) = self.index.get(&pin.node) else {
            return;
        };
        let node = &self.nodes[index];
        let Some((t, direction)) = node.locate_pin(pin.pin) else {
            return;
        };
        let collection = node.collection(t, direction);
        let wants_clone = collection
            .pin(pin.pin)
            .is_some_and(|p| node.behavior().should_clone_pin(collection, p));
        if !wants_clone {
            return;
        }

        match self.nodes[index].clone_pin(pin.pin) {
            Ok(clone) => {
                let node = &self.nodes[index];
                let Some(cloned) = node.pin(clone) else {
                    return;
                };
                let master = cloned.auto_clone_master().unwrap_or(pin.pin);
                let name = cloned.name().to_string();
                log::debug!("Cloned pin '{}' on node '{}'", name, node.name());
                self.emit(GraphEvent::PinCloned {
                    node: pin.node,
                    master,
                    pin: clone,
                    name,
                });
            }
            Err(e) => self
                .hooks
                .emit_error(&format!("failed to clone pin {}: {}", pin.pin, e)),
        }
    }

    fn contract_clone(&mut self, pin: PinRef) {
        let Some(&index) = self.index.get(&pin.node) else {
            return;
        };
        let node = &self.nodes[index];
        let wants_removal = node
            .pin(pin.pin)
            .is_some_and(|p| node.behavior().should_remove_clone_pin(p));
        if !wants_removal {
            return;
        }

        match self.nodes[index].remove_clone_pin(pin.pin) {
            Ok(Some(removed)) => {
                log::debug!("Removed clone pin '{}'", removed.name());
                self.emit(GraphEvent::PinRemoved {
                    node: pin.node,
                    pin: removed.id(),
                    name: removed.name().to_string(),
                });
            }
            Ok(None) => {}
            Err(e) => self
                .hooks
                .emit_error(&format!("failed to remove clone of pin {}: {}", pin.pin, e)),
        }
    }

    /// Disconnect an input pin from its upstream output
    ///
    /// Succeeds without doing anything if the pin is not connected. `force`
    /// skips the graph's veto hook.
    pub fn disconnect_input(&mut self, input: PinId, force: bool) -> Result<()> {
        let in_loc = self.locate_as(input, PinDirection::Input)?;
        match self.located_pin(&in_loc, input)?.connected_output() {
            Some(output) => self.disconnect(output.pin, input, force),
            None => Ok(()),
        }
    }

    /// Disconnect one link between an output and an input pin
    ///
    /// Succeeds without doing anything if the two are not linked. `force`
    /// skips the graph's veto hook.
    pub fn disconnect(&mut self, output: PinId, input: PinId, force: bool) -> Result<()> {
        let out_loc = self.locate_as(output, PinDirection::Output)?;
        let in_loc = self.locate_as(input, PinDirection::Input)?;
        let out_pin = self.located_pin(&out_loc, output)?;
        let in_pin = self.located_pin(&in_loc, input)?;

        if in_pin.connected_output().map(|r| r.pin) != Some(output) {
            return Ok(());
        }
        if !force && !self.hooks.before_pins_disconnected(self, out_pin, in_pin) {
            return self.reject(GraphError::vetoed(format!(
                "graph refused disconnection of '{}' from '{}'",
                in_pin.name(),
                out_pin.name()
            )));
        }

        if let Some(pin) = self.pin_mut(output) {
            pin.drop_link(input);
        }
        if let Some(pin) = self.pin_mut(input) {
            pin.drop_link(output);
        }

        let out_ref = PinRef::new(out_loc.node, output);
        let in_ref = PinRef::new(in_loc.node, input);
        log::debug!("Disconnected {} -> {}", out_ref, in_ref);
        self.emit(GraphEvent::PinsDisconnected {
            output: out_ref,
            input: in_ref,
        });
        self.calculate_topology();

        self.contract_clone(out_ref);
        self.contract_clone(in_ref);
        Ok(())
    }

    /// Disconnect every input fed by `output`, most recent first
    ///
    /// Stops at the first failure.
    pub fn disconnect_all(&mut self, output: PinId, force: bool) -> Result<()> {
        let out_loc = self.locate_as(output, PinDirection::Output)?;
        let inputs: Vec<PinRef> = self.located_pin(&out_loc, output)?.connected_inputs().to_vec();
        for input in inputs.into_iter().rev() {
            self.disconnect(output, input.pin, force)?;
        }
        Ok(())
    }

    /// Disconnect every pin of a node in every topology system
    ///
    /// Pins removed by clone contraction along the way are skipped. Calling
    /// this on an already isolated node is a no-op.
    pub fn disconnect_all_pins(&mut self, node: NodeId, force: bool) -> Result<()> {
        let Some(target) = self.node(node) else {
            return self.reject(GraphError::UnknownNode(node));
        };

        let mut inputs = Vec::new();
        let mut outputs = Vec::new();
        for t in 0..MAX_TOPOLOGY_COUNT {
            inputs.extend(target.inputs(t).connected_pins().map(Pin::id));
            outputs.extend(target.outputs(t).connected_pins().map(Pin::id));
        }

        for input in inputs {
            if self.locate(input).is_some() {
                self.disconnect_input(input, force)?;
            }
        }
        for output in outputs {
            if self.locate(output).is_some() {
                self.disconnect_all(output, force)?;
            }
        }
        Ok(())
    }

    /// Remove an unconnected pin from its node
    ///
    /// Fails if the pin is connected or the owning node vetoes the removal.
    pub fn remove_pin(&mut self, pin: PinId) -> Result<Pin> {
        let Some(location) = self.locate(pin) else {
            return self.reject(GraphError::UnknownPin(pin));
        };
        match self.nodes[location.node_index].remove_pin(pin) {
            Ok(removed) => {
                log::debug!("Removed pin '{}'", removed.name());
                self.emit(GraphEvent::PinRemoved {
                    node: location.node,
                    pin,
                    name: removed.name().to_string(),
                });
                Ok(removed)
            }
            Err(e) => self.reject(e),
        }
    }
}
