//! Simulation error types

use thiserror::Error;

use adaptnet_core::{NodeId, StackError};
use adaptnet_routing::RoutingError;

/// Errors that abort a simulation run
///
/// CONF counter disagreement after shutdown is not an error; it is reported
/// through [`SimulationReport::is_consistent`](crate::SimulationReport::is_consistent).
#[derive(Debug, Error)]
pub enum SimulationError {
    /// The node is not part of the topology
    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),

    /// The node's queue no longer accepts messages
    #[error("Mailbox of node {0} is closed")]
    MailboxClosed(NodeId),

    /// A node worker panicked or was cancelled
    #[error("Node worker failed: {0}")]
    WorkerFailed(String),

    /// A generator parameter is out of range
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The topology has no nodes
    #[error("Network has no nodes")]
    EmptyNetwork,

    #[error(transparent)]
    Core(#[from] StackError),

    #[error(transparent)]
    Routing(#[from] RoutingError),
}

/// Result type for simulation operations
pub type SimulationResult<T> = Result<T, SimulationError>;
