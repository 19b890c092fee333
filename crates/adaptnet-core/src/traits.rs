//! Collaborator traits
//!
//! The simulation does not generate graphs or choose which functions a node
//! owns. Those inputs arrive through the two traits below.

use std::collections::{BTreeMap, HashMap};

use crate::Cost;
use crate::adaptation::AdaptationFunction;
use crate::identity::NodeId;

/// Abstraction over network structure
///
/// Implementations are shared read-only by every node worker.
pub trait NetworkTopology: Send + Sync {
    /// All nodes in the network
    fn nodes(&self) -> Vec<NodeId>;

    /// Nodes directly connected to `node`
    fn neighbors(&self, node: NodeId) -> Vec<NodeId>;

    /// Cost of applying `function` across the edge `a`-`b`
    ///
    /// Falls back to the edge's default cost when the function has no entry.
    fn link_cost(&self, a: NodeId, b: NodeId, function: &AdaptationFunction) -> Cost;
}

/// Which adaptation functions each node knows
pub trait FunctionAssignment: Send + Sync {
    fn functions_of(&self, node: NodeId) -> Vec<AdaptationFunction>;
}

impl FunctionAssignment for BTreeMap<NodeId, Vec<AdaptationFunction>> {
    fn functions_of(&self, node: NodeId) -> Vec<AdaptationFunction> {
        self.get(&node).cloned().unwrap_or_default()
    }
}

impl FunctionAssignment for HashMap<NodeId, Vec<AdaptationFunction>> {
    fn functions_of(&self, node: NodeId) -> Vec<AdaptationFunction> {
        self.get(&node).cloned().unwrap_or_default()
    }
}
