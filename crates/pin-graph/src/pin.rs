//! Pins: named, directional connection points owned by a node
//!
//! A pin is a tagged variant. Input pins hold at most one upstream output,
//! output pins hold an ordered list of downstream inputs. Links are stored as
//! `PinRef`s so a pin never owns the pin it is connected to.

use crate::constants::{defaults, CLONE_COUNTER_PLACEHOLDER};
use crate::types::{AutoCloneLimit, NodeId, PinDirection, PinId, PinRef};

/// Connection state, selected by direction
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PinLink {
    Input {
        connected_to: Option<PinRef>,
    },
    Output {
        connected_to: Vec<PinRef>,
        allow_multi_connect: bool,
    },
}

/// Auto-clone bookkeeping
///
/// `master` is `Some(own id)` on a clone template and `Some(template id)` on
/// every clone made from it.
#[derive(Debug, Clone, Default)]
struct AutoClone {
    master: Option<PinId>,
    count: usize,
    ref_count: usize,
    limit: AutoCloneLimit,
    name_template: String,
}

/// A connection point on a node
#[derive(Debug)]
pub struct Pin {
    id: PinId,
    name: String,
    original_name: Option<String>,
    node: Option<NodeId>,
    topology_system: usize,
    can_rename: bool,
    auto_clone: AutoClone,
    link: PinLink,
}

impl Pin {
    fn with_link(link: PinLink) -> Self {
        Self {
            id: PinId::new(),
            name: String::new(),
            original_name: None,
            node: None,
            topology_system: 0,
            can_rename: false,
            auto_clone: AutoClone::default(),
            link,
        }
    }

    /// Create an unattached input pin
    pub fn input() -> Self {
        Self::with_link(PinLink::Input { connected_to: None })
    }

    /// Create an unattached output pin (multi-connect allowed)
    pub fn output() -> Self {
        Self::with_link(PinLink::Output {
            connected_to: Vec::new(),
            allow_multi_connect: true,
        })
    }

    /// Create an unattached pin of the given direction
    pub fn new(direction: PinDirection) -> Self {
        match direction {
            PinDirection::Input => Self::input(),
            PinDirection::Output => Self::output(),
        }
    }

    /// Make this pin an auto-clone template
    ///
    /// `name_template` may contain `%`, replaced by the running clone counter.
    /// An empty template derives one from the pin's name at clone time.
    pub fn with_auto_clone(mut self, limit: AutoCloneLimit, name_template: impl Into<String>) -> Self {
        self.set_auto_clone(limit, name_template);
        self
    }

    /// Builder form of `set_can_rename`
    pub fn renamable(mut self) -> Self {
        self.can_rename = true;
        self
    }

    /// Builder form of `set_allow_multi_connect`
    pub fn single_connect(mut self) -> Self {
        self.set_allow_multi_connect(false);
        self
    }

    pub fn id(&self) -> PinId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The first name this pin was ever given
    pub fn original_name(&self) -> Option<&str> {
        self.original_name.as_deref()
    }

    pub fn direction(&self) -> PinDirection {
        match self.link {
            PinLink::Input { .. } => PinDirection::Input,
            PinLink::Output { .. } => PinDirection::Output,
        }
    }

    pub fn is_input(&self) -> bool {
        self.direction().is_input()
    }

    /// Node this pin is attached to, if any
    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    /// Handle to this pin, if it is attached to a node
    pub fn pin_ref(&self) -> Option<PinRef> {
        self.node.map(|node| PinRef::new(node, self.id))
    }

    pub fn topology_system(&self) -> usize {
        self.topology_system
    }

    pub fn can_rename(&self) -> bool {
        self.can_rename
    }

    pub fn set_can_rename(&mut self, can_rename: bool) {
        self.can_rename = can_rename;
    }

    /// Input: has an upstream output. Output: has at least one downstream input.
    pub fn is_connected(&self) -> bool {
        match &self.link {
            PinLink::Input { connected_to } => connected_to.is_some(),
            PinLink::Output { connected_to, .. } => !connected_to.is_empty(),
        }
    }

    /// Upstream output of an input pin
    pub fn connected_output(&self) -> Option<PinRef> {
        match &self.link {
            PinLink::Input { connected_to } => *connected_to,
            PinLink::Output { .. } => None,
        }
    }

    /// Downstream inputs of an output pin, in connection order
    pub fn connected_inputs(&self) -> &[PinRef] {
        match &self.link {
            PinLink::Input { .. } => &[],
            PinLink::Output { connected_to, .. } => connected_to,
        }
    }

    /// Whether an output pin accepts more than one connection (always false
    /// for inputs)
    pub fn allow_multi_connect(&self) -> bool {
        match &self.link {
            PinLink::Input { .. } => false,
            PinLink::Output {
                allow_multi_connect,
                ..
            } => *allow_multi_connect,
        }
    }

    /// Has no effect on input pins
    pub fn set_allow_multi_connect(&mut self, allow: bool) {
        if let PinLink::Output {
            allow_multi_connect,
            ..
        } = &mut self.link
        {
            *allow_multi_connect = allow;
        }
    }

    // ------------------------------------------------------------------
    // Auto-clone
    // ------------------------------------------------------------------

    /// Make this pin an auto-clone template (its own master)
    pub fn set_auto_clone(&mut self, limit: AutoCloneLimit, name_template: impl Into<String>) {
        self.auto_clone.limit = limit;
        self.auto_clone.name_template = name_template.into();
        self.auto_clone.master = Some(self.id);
    }

    /// Set the pin this one clones from; pass `self.id()` to make it a template
    pub fn set_auto_clone_master(&mut self, master: Option<PinId>) {
        self.auto_clone.master = master;
    }

    /// Set the clone cap using the integer convention (-1, 0, N)
    pub fn set_max_auto_clone(&mut self, max: i32) {
        self.auto_clone.limit = AutoCloneLimit::from_raw(max);
    }

    pub fn set_auto_clone_limit(&mut self, limit: AutoCloneLimit) {
        self.auto_clone.limit = limit;
    }

    pub fn set_auto_clone_name_template(&mut self, template: impl Into<String>) {
        self.auto_clone.name_template = template.into();
    }

    pub fn auto_clone_master(&self) -> Option<PinId> {
        self.auto_clone.master
    }

    pub fn auto_clone_limit(&self) -> AutoCloneLimit {
        self.auto_clone.limit
    }

    /// Clones made from this master that are still alive
    pub fn auto_clone_count(&self) -> usize {
        self.auto_clone.count
    }

    /// Clones ever made from this master
    pub fn auto_clone_ref_count(&self) -> usize {
        self.auto_clone.ref_count
    }

    pub fn auto_clone_name_template(&self) -> &str {
        &self.auto_clone.name_template
    }

    /// True on the template itself
    pub fn is_auto_clone_master(&self) -> bool {
        self.auto_clone.master == Some(self.id)
    }

    /// True on pins created from a template
    pub fn is_auto_cloned(&self) -> bool {
        matches!(self.auto_clone.master, Some(master) if master != self.id)
    }

    /// Whether this master may produce another clone right now
    pub fn has_clone_capacity(&self) -> bool {
        self.auto_clone.limit.allows(self.auto_clone.count)
    }

    /// Name for the next clone, substituting the clone counter into the
    /// template
    pub(crate) fn clone_name(&self) -> String {
        let counter = self.auto_clone.ref_count.to_string();
        let template = if self.auto_clone.name_template.is_empty() {
            format!("{}{}", self.name, defaults::CLONE_NAME_SUFFIX)
        } else {
            self.auto_clone.name_template.clone()
        };
        template.replace(CLONE_COUNTER_PLACEHOLDER, &counter)
    }

    /// Build a new unattached pin from this master and count it
    pub(crate) fn spawn_clone(&mut self) -> Pin {
        self.auto_clone.count += 1;
        self.auto_clone.ref_count += 1;

        let mut clone = Pin::new(self.direction());
        clone.can_rename = self.can_rename;
        clone.set_allow_multi_connect(self.allow_multi_connect());
        clone.auto_clone.master = Some(self.id);
        clone.name = self.clone_name();
        clone
    }

    /// A clone of this master was removed
    pub(crate) fn release_clone(&mut self) {
        self.auto_clone.count = self.auto_clone.count.saturating_sub(1);
    }

    // ------------------------------------------------------------------
    // Crate-internal mutation
    // ------------------------------------------------------------------

    pub(crate) fn set_name(&mut self, name: String) {
        if self.original_name.is_none() {
            self.original_name = Some(name.clone());
        }
        self.name = name;
    }

    pub(crate) fn attach(&mut self, node: NodeId, topology_system: usize) {
        self.node = Some(node);
        self.topology_system = topology_system;
    }

    pub(crate) fn detach(&mut self) {
        self.node = None;
    }

    /// Record a new link; inputs replace, outputs append
    pub(crate) fn push_link(&mut self, other: PinRef) {
        match &mut self.link {
            PinLink::Input { connected_to } => *connected_to = Some(other),
            PinLink::Output { connected_to, .. } => connected_to.push(other),
        }
    }

    /// Forget a link to the given pin
    pub(crate) fn drop_link(&mut self, other: PinId) {
        match &mut self.link {
            PinLink::Input { connected_to } => {
                if connected_to.is_some_and(|r| r.pin == other) {
                    *connected_to = None;
                }
            }
            PinLink::Output { connected_to, .. } => {
                if let Some(pos) = connected_to.iter().position(|r| r.pin == other) {
                    connected_to.remove(pos);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_pins_are_unconnected() {
        let input = Pin::input();
        let output = Pin::output();
        assert_eq!(input.direction(), PinDirection::Input);
        assert_eq!(output.direction(), PinDirection::Output);
        assert!(!input.is_connected());
        assert!(!output.is_connected());
        assert!(output.allow_multi_connect());
        assert!(!input.allow_multi_connect());
        assert!(input.node().is_none());
    }

    #[test]
    fn test_links_follow_direction() {
        let node = NodeId::new();
        let mut input = Pin::input();
        let mut output = Pin::output();
        let a = PinRef::new(node, PinId::new());
        let b = PinRef::new(node, PinId::new());

        input.push_link(a);
        assert_eq!(input.connected_output(), Some(a));
        input.push_link(b);
        assert_eq!(input.connected_output(), Some(b));

        output.push_link(a);
        output.push_link(b);
        assert_eq!(output.connected_inputs(), &[a, b]);

        output.drop_link(a.pin);
        assert_eq!(output.connected_inputs(), &[b]);
        input.drop_link(a.pin);
        assert!(input.is_connected());
        input.drop_link(b.pin);
        assert!(!input.is_connected());
    }

    #[test]
    fn test_master_and_clone_flags() {
        let mut master = Pin::input().with_auto_clone(AutoCloneLimit::Unbounded, "in%");
        assert!(master.is_auto_clone_master());
        assert!(!master.is_auto_cloned());

        let clone = master.spawn_clone();
        assert!(clone.is_auto_cloned());
        assert!(!clone.is_auto_clone_master());
        assert_eq!(clone.auto_clone_master(), Some(master.id()));
        assert_eq!(clone.name(), "in1");
        assert_eq!(master.auto_clone_count(), 1);

        let second = master.spawn_clone();
        assert_eq!(second.name(), "in2");

        master.release_clone();
        assert_eq!(master.auto_clone_count(), 1);
        assert_eq!(master.auto_clone_ref_count(), 2);
    }

    #[test]
    fn test_default_clone_template_uses_name() {
        let mut master = Pin::input();
        let id = master.id();
        master.set_auto_clone_master(Some(id));
        master.set_max_auto_clone(-1);
        master.set_name("ip1".to_string());

        let clone = master.spawn_clone();
        assert_eq!(clone.name(), "ip1_1");
    }

    #[test]
    fn test_original_name_is_first_name() {
        let mut pin = Pin::output();
        pin.set_name("first".to_string());
        pin.set_name("second".to_string());
        assert_eq!(pin.name(), "second");
        assert_eq!(pin.original_name(), Some("first"));
    }

    #[test]
    fn test_single_connect_only_affects_outputs() {
        assert!(!Pin::output().single_connect().allow_multi_connect());
        let mut input = Pin::input();
        input.set_allow_multi_connect(true);
        assert!(!input.allow_multi_connect());
    }
}
