//! Core identifier and value types
//!
//! Instance identifiers are process-unique and stable for the lifetime of the
//! object they name. Links between pins and back-references to nodes are
//! expressed with these identifiers, never with ownership.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! instance_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a fresh identifier
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// The underlying UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

instance_id!(
    /// Unique identifier for a node
    NodeId
);

instance_id!(
    /// Unique identifier for a pin
    PinId
);

instance_id!(
    /// Unique identifier for a graph
    GraphId
);

/// Direction of a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PinDirection {
    Input,
    Output,
}

impl PinDirection {
    /// The direction a pin must have to connect to this one
    pub fn opposite(self) -> Self {
        match self {
            Self::Input => Self::Output,
            Self::Output => Self::Input,
        }
    }

    pub fn is_input(self) -> bool {
        matches!(self, Self::Input)
    }
}

impl fmt::Display for PinDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => write!(f, "input"),
            Self::Output => write!(f, "output"),
        }
    }
}

/// How many clones an auto-clone master may have alive at once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoCloneLimit {
    /// Never clone
    #[default]
    Disabled,
    /// Clone without bound
    Unbounded,
    /// Clone until this many clones are alive
    Max(usize),
}

impl AutoCloneLimit {
    /// Convert from the integer convention: -1 unbounded, 0 disabled, N cap
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            0 => Self::Disabled,
            n if n < 0 => Self::Unbounded,
            n => Self::Max(n as usize),
        }
    }

    /// Convert back to the integer convention
    pub fn as_raw(self) -> i32 {
        match self {
            Self::Disabled => 0,
            Self::Unbounded => -1,
            Self::Max(n) => i32::try_from(n).unwrap_or(i32::MAX),
        }
    }

    /// Whether a master with `alive` clones may create another one
    pub fn allows(self, alive: usize) -> bool {
        match self {
            Self::Disabled => false,
            Self::Unbounded => true,
            Self::Max(n) => alive < n,
        }
    }
}

/// Non-owning handle to a pin together with its parent node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinRef {
    /// Node owning the pin
    pub node: NodeId,
    /// The pin itself
    pub pin: PinId,
}

impl PinRef {
    pub fn new(node: NodeId, pin: PinId) -> Self {
        Self { node, pin }
    }
}

impl fmt::Display for PinRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.node, self.pin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let a = PinId::new();
        let b = PinId::new();
        assert_ne!(a, b);
        assert_eq!(a, a);
    }

    #[test]
    fn test_auto_clone_limit_raw_conversion() {
        assert_eq!(AutoCloneLimit::from_raw(-1), AutoCloneLimit::Unbounded);
        assert_eq!(AutoCloneLimit::from_raw(-7), AutoCloneLimit::Unbounded);
        assert_eq!(AutoCloneLimit::from_raw(0), AutoCloneLimit::Disabled);
        assert_eq!(AutoCloneLimit::from_raw(3), AutoCloneLimit::Max(3));
        assert_eq!(AutoCloneLimit::Max(3).as_raw(), 3);
        assert_eq!(AutoCloneLimit::Unbounded.as_raw(), -1);
    }

    #[test]
    fn test_auto_clone_limit_allows() {
        assert!(!AutoCloneLimit::Disabled.allows(0));
        assert!(AutoCloneLimit::Unbounded.allows(1000));
        assert!(AutoCloneLimit::Max(2).allows(1));
        assert!(!AutoCloneLimit::Max(2).allows(2));
    }

    #[test]
    fn test_direction_opposite() {
        assert_eq!(PinDirection::Input.opposite(), PinDirection::Output);
        assert_eq!(PinDirection::Output.opposite(), PinDirection::Input);
        assert!(PinDirection::Input.is_input());
    }
}
