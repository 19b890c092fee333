//! # Adaptnet Simulation
//!
//! Concurrent simulation of routing agents that converge on routes across
//! heterogeneous protocol stacks.
//!
//! ## Overview
//!
//! Every node knows a private set of adaptation functions (conversion,
//! encapsulation, decapsulation). Nodes advertise the stacks they accept,
//! learn from their neighbors' advertisements by reversing their own
//! functions, and flood every strictly better route they find. Once a full
//! idle window passes with no message processed anywhere, the network is
//! considered converged and every node is stopped.
//!
//! ## Architecture
//!
//! - **Topology** (`topology.rs`): Mesh construction with per-edge costs
//! - **Node** (`node.rs`): The routing agent and its receive loop
//! - **Mailboxes** (`mailboxes.rs`): Per-node unbounded queues
//! - **Network** (`network.rs`): Task-per-node orchestration and convergence detection
//! - **Report** (`report.rs`): Counters, tables and reachability after a run
//! - **Scenarios** (`scenarios.rs`): Pre-built topologies with known routes
//! - **Random** (`random.rs`): Random meshes with random function subsets
//!
//! ## Example: tunnel through the middle of a line
//!
//! ```rust,ignore
//! use adaptnet_core::NodeId;
//! use adaptnet_simulation::{scenarios, NetworkConfig};
//!
//! let network = scenarios::tunnel_line().network(NetworkConfig::default())?;
//! let report = network.run().await?;
//!
//! assert!(report.can_reach(NodeId(0), NodeId(3)));
//! assert_eq!(report.stats(NodeId(3)).unwrap().message_received, 1);
//! ```

pub mod config;
pub mod error;
pub mod mailboxes;
pub mod network;
pub mod node;
pub mod random;
pub mod report;
pub mod scenarios;
pub mod topology;

// Re-export main types
pub use config::NetworkConfig;
pub use error::{SimulationError, SimulationResult};
pub use mailboxes::Mailboxes;
pub use network::Network;
pub use node::{Node, NodeState, NodeStats};
pub use random::{IterationSummary, RandomAssignment, RandomNetwork};
pub use report::{NodeReport, SimulationReport};
pub use scenarios::{Probe, Scenario};
pub use topology::{Mesh, MeshBuilder};
