//! Outcome of a simulation run
//!
//! A [`SimulationReport`] holds every node's counters and final routing table,
//! the timing of the run, and answers reachability queries between node pairs.

use std::collections::BTreeMap;
use std::fmt::{self, Display};
use std::time::Duration;

use serde::Serialize;

use adaptnet_core::{Message, NodeId};
use adaptnet_routing::RoutingTable;

use crate::node::{Node, NodeStats};

/// Final state of one node
#[derive(Debug, Clone, Serialize)]
pub struct NodeReport {
    pub id: NodeId,
    pub stats: NodeStats,
    pub table: RoutingTable,
    /// User messages delivered here, with the stack they arrived with
    #[serde(skip)]
    pub delivered: Vec<Message>,
}

impl From<Node> for NodeReport {
    fn from(node: Node) -> Self {
        let (id, stats, table, delivered) = node.into_parts();
        Self {
            id,
            stats,
            table,
            delivered,
        }
    }
}

/// Results of a whole run
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub nodes: BTreeMap<NodeId, NodeReport>,
    /// Sum of every node's counters
    pub totals: NodeStats,
    /// From start until the last activity before the first idle window
    pub convergence_time: Duration,
    /// From start until every worker was joined
    pub duration: Duration,
    /// False when the run hit its maximum duration before going idle
    pub converged: bool,
}

impl SimulationReport {
    pub fn new(
        nodes: impl IntoIterator<Item = NodeReport>,
        convergence_time: Duration,
        duration: Duration,
        converged: bool,
    ) -> Self {
        let nodes: BTreeMap<NodeId, NodeReport> =
            nodes.into_iter().map(|node| (node.id, node)).collect();
        let mut totals = NodeStats::default();
        for node in nodes.values() {
            totals.merge(&node.stats);
        }
        Self {
            nodes,
            totals,
            convergence_time,
            duration,
            converged,
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&NodeReport> {
        self.nodes.get(&id)
    }

    pub fn table(&self, id: NodeId) -> Option<&RoutingTable> {
        self.node(id).map(|node| &node.table)
    }

    pub fn stats(&self, id: NodeId) -> Option<&NodeStats> {
        self.node(id).map(|node| &node.stats)
    }

    /// Whether every CONF sent was also received
    ///
    /// A CONF still queued when STOP arrived makes this false; that is a known
    /// artifact of the idle-timeout heuristic, not a fault.
    pub fn is_consistent(&self) -> bool {
        self.totals.conf_sent == self.totals.conf_received
    }

    /// Whether `a`'s table holds any route to `b`
    pub fn can_reach(&self, a: NodeId, b: NodeId) -> bool {
        self.table(a).is_some_and(|table| table.can_reach(b))
    }

    /// Fraction of ordered pairs of distinct nodes `(a, b)` where `a` can reach `b`
    pub fn reachability(&self) -> f64 {
        let n = self.nodes.len();
        if n < 2 {
            return 1.0;
        }
        let reachable = self
            .nodes
            .keys()
            .flat_map(|a| self.nodes.keys().map(move |b| (*a, *b)))
            .filter(|(a, b)| a != b && self.can_reach(*a, *b))
            .count();
        reachable as f64 / (n * (n - 1)) as f64
    }
}

impl Display for SimulationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for node in self.nodes.values() {
            writeln!(f, "Node {} ({} routes)", node.id, node.table.len())?;
            writeln!(f, "{}", node.table)?;
        }
        writeln!(f, "Nodes:             {}", self.nodes.len())?;
        writeln!(f, "Converged:         {}", self.converged)?;
        writeln!(f, "Convergence time:  {:?}", self.convergence_time)?;
        writeln!(f, "Duration:          {:?}", self.duration)?;
        writeln!(
            f,
            "CONF sent/recv:    {}/{}{}",
            self.totals.conf_sent,
            self.totals.conf_received,
            if self.is_consistent() { "" } else { " (mismatch)" }
        )?;
        writeln!(
            f,
            "Messages:          {} received, {} routed, {} discarded",
            self.totals.message_received, self.totals.message_routed, self.totals.message_discarded
        )?;
        write!(f, "Reachability:      {:.1}%", self.reachability() * 100.0)
    }
}
