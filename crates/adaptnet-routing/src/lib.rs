//! # Adaptnet Routing
//!
//! Routing table for the adaptnet convergence protocol.
//!
//! Each node keeps one [`RoutingTable`]. A row answers the question "to reach
//! `dest` while being handed `stack`, which function do I apply, to whom do I
//! send, and what does it cost?". Rows are keyed by destination and by the
//! *content* of the stack, never by identity.
//!
//! ## Improve-or-reject
//!
//! [`RoutingTable::add_route`] only changes the table when the route is new or
//! strictly cheaper than the stored one, and reports whether it did. Nodes
//! re-advertise a route only when it was accepted, so the number of
//! advertisements a node emits for a key is bounded by the number of strict
//! improvements it observes for that key.

pub mod error;
pub mod table;

pub use error::{RoutingError, RoutingResult};
pub use table::{Route, RouteKey, RouteUpdate, RoutingTable};
