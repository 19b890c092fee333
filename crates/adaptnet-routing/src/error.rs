//! Routing error types

use thiserror::Error;

use adaptnet_core::NodeId;

/// Errors raised when querying a routing table
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    /// No row for this destination and stack shape
    #[error("No route to {dest} for stack {stack}")]
    NoRoute { dest: NodeId, stack: String },
}

/// Result type for routing operations
pub type RoutingResult<T> = Result<T, RoutingError>;
