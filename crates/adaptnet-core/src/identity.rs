//! Node identity
//!
//! Nodes are identified by a dense integer id so that per-node state (queues,
//! counters) can be indexed directly. Scenario code often names nodes with
//! letters; [`NodeId::from_letter`] maps 'A'..'Z' onto 0..25.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// Unique identifier for a node in the network
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Create a node id from its raw index
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Map a capital letter onto an id ('A' is 0)
    pub fn from_letter(c: char) -> Option<Self> {
        if c.is_ascii_uppercase() {
            Some(Self(c as u32 - 'A' as u32))
        } else {
            None
        }
    }

    /// Generate ids `0..count`
    pub fn range(count: u32) -> Vec<Self> {
        (0..count).map(Self).collect()
    }

    /// Raw index of this node
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for NodeId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}
