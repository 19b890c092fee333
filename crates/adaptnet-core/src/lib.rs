//! # Adaptnet Core
//!
//! Core types for a network of routing agents that translate traffic across
//! heterogeneous protocol stacks.
//!
//! Every router in the simulation owns a private set of adaptation functions
//! (conversion, encapsulation, decapsulation). A message travels with a
//! bounded stack of protocol tags, and each hop rewrites the top of that stack
//! with one of its functions. This crate holds the algebra those rewrites obey
//! and the small set of types shared by the routing and simulation crates.
//!
//! ## Key Types
//!
//! - [`ProtocolStack`]: Bounded LIFO stack of [`Protocol`] tags
//! - [`AdaptationFunction`]: A typed rewrite rule over a stack, with its reverse
//! - [`Link`]: Per-edge cost table keyed by adaptation function
//! - [`PhysicalMessage`]: In-process transport envelope (CONF / MSG / STOP)
//!
//! ## Key Traits
//!
//! - [`NetworkTopology`]: Neighbors and link costs, provided by a graph collaborator
//! - [`FunctionAssignment`]: Which functions each node knows

pub mod adaptation;
pub mod error;
pub mod identity;
pub mod link;
pub mod message;
pub mod stack;
pub mod traits;

// Re-export main types
pub use adaptation::*;
pub use error::*;
pub use identity::*;
pub use link::*;
pub use message::*;
pub use stack::*;
pub use traits::*;

/// Cost of a route or of a single hop
pub type Cost = u32;
