//! Standard span names
//!
//! Shared by every crate so log queries can rely on a single vocabulary.

/// Standard span names
pub mod spans {
    /// One node's receive loop
    pub const NODE_WORKER: &str = "node_worker";
    /// The orchestration loop of a whole run
    pub const NETWORK_RUN: &str = "network_run";
}
