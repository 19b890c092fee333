//! Routing table keyed by destination and stack shape
//!
//! The [`RoutingTable`] stores at most one [`Route`] per `(dest, stack)` key.
//! The stored cost for a key never increases: a route replaces the existing
//! one only when it is strictly cheaper. Rows are never removed during a run.

use std::collections::{BTreeSet, HashMap};
use std::fmt::{self, Display};

use adaptnet_core::{AdaptationFunction, Cost, NodeId, ProtocolStack};
use serde::ser::{Serialize, SerializeSeq, Serializer};

use crate::error::{RoutingError, RoutingResult};

/// Key of a routing table row
///
/// Two keys are equal when their destinations match and their stacks hold the
/// same protocols; stack capacity does not take part.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteKey {
    pub dest: NodeId,
    pub stack: ProtocolStack,
}

impl RouteKey {
    pub fn new(dest: NodeId, stack: ProtocolStack) -> Self {
        Self { dest, stack }
    }
}

/// A single row of the routing table
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Route {
    /// Destination node
    pub dest: NodeId,
    /// Stack this node must be handed for the route to apply
    pub stack: ProtocolStack,
    /// Function applied before sending to `next_hop`
    pub function: AdaptationFunction,
    /// Neighbor the message is sent to
    pub next_hop: NodeId,
    /// Total cost to `dest`
    pub cost: Cost,
}

/// Outcome of offering a route to the table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteUpdate {
    /// No row existed for the key
    Inserted,
    /// The row was replaced by a strictly cheaper route
    Improved { previous: Cost },
    /// The stored route is at least as cheap, nothing changed
    Rejected { current: Cost },
}

impl Route {
    /// Key this row is stored under
    pub fn key(&self) -> RouteKey {
        RouteKey::new(self.dest, self.stack.clone())
    }
}

impl RouteUpdate {
    /// Whether the table changed (and the route should be propagated)
    pub fn is_accepted(&self) -> bool {
        !matches!(self, RouteUpdate::Rejected { .. })
    }
}

/// Per-node routing table
///
/// Owned by exactly one node; it is never shared across workers.
#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    /// Routes indexed by destination, then by stack content
    routes: HashMap<NodeId, HashMap<ProtocolStack, Route>>,
}

impl RoutingTable {
    /// Create an empty routing table
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a row exists for `(dest, stack)`
    pub fn contains(&self, dest: NodeId, stack: &ProtocolStack) -> bool {
        self.get(dest, stack).is_some()
    }

    /// The row for `(dest, stack)`, if any
    pub fn get(&self, dest: NodeId, stack: &ProtocolStack) -> Option<&Route> {
        self.routes.get(&dest).and_then(|by_stack| by_stack.get(stack))
    }

    /// The row stored under `key`, if any
    pub fn get_by_key(&self, key: &RouteKey) -> Option<&Route> {
        self.get(key.dest, &key.stack)
    }

    /// Like [`get`](Self::get), failing with [`RoutingError::NoRoute`]
    pub fn lookup(&self, dest: NodeId, stack: &ProtocolStack) -> RoutingResult<&Route> {
        self.get(dest, stack).ok_or_else(|| RoutingError::NoRoute {
            dest,
            stack: stack.to_string(),
        })
    }

    /// Offer a route, returning `true` if the table changed
    ///
    /// The stack is cloned on insertion; the caller keeps its own copy.
    pub fn add_route(
        &mut self,
        dest: NodeId,
        next_hop: NodeId,
        cost: Cost,
        function: AdaptationFunction,
        stack: &ProtocolStack,
    ) -> bool {
        self.update(dest, next_hop, cost, function, stack)
            .is_accepted()
    }

    /// Offer a route and report exactly what happened
    pub fn update(
        &mut self,
        dest: NodeId,
        next_hop: NodeId,
        cost: Cost,
        function: AdaptationFunction,
        stack: &ProtocolStack,
    ) -> RouteUpdate {
        let by_stack = self.routes.entry(dest).or_default();
        match by_stack.get_mut(stack) {
            Some(existing) if existing.cost > cost => {
                let previous = existing.cost;
                existing.function = function;
                existing.next_hop = next_hop;
                existing.cost = cost;
                RouteUpdate::Improved { previous }
            }
            Some(existing) => RouteUpdate::Rejected {
                current: existing.cost,
            },
            None => {
                by_stack.insert(
                    stack.clone(),
                    Route {
                        dest,
                        stack: stack.clone(),
                        function,
                        next_hop,
                        cost,
                    },
                );
                RouteUpdate::Inserted
            }
        }
    }

    /// Whether any route leads to `dest`
    pub fn can_reach(&self, dest: NodeId) -> bool {
        self.routes
            .get(&dest)
            .is_some_and(|by_stack| !by_stack.is_empty())
    }

    /// All routes leading to `dest`
    pub fn routes_to(&self, dest: NodeId) -> impl Iterator<Item = &Route> {
        self.routes.get(&dest).into_iter().flat_map(|by_stack| by_stack.values())
    }

    /// Cheapest route to `dest` over all stack shapes
    pub fn best_route_to(&self, dest: NodeId) -> Option<&Route> {
        self.routes_to(dest).min_by_key(|route| route.cost)
    }

    /// All destinations with at least one route
    pub fn destinations(&self) -> BTreeSet<NodeId> {
        self.routes
            .iter()
            .filter(|(_, by_stack)| !by_stack.is_empty())
            .map(|(dest, _)| *dest)
            .collect()
    }

    /// Iterate over every row
    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.values().flat_map(|by_stack| by_stack.values())
    }

    /// Rows ordered by destination, then stack
    pub fn sorted_routes(&self) -> Vec<&Route> {
        let mut routes: Vec<&Route> = self.iter().collect();
        routes.sort_by(|a, b| {
            a.dest
                .cmp(&b.dest)
                .then_with(|| a.stack.as_slice().cmp(b.stack.as_slice()))
        });
        routes
    }

    /// Get the number of rows
    pub fn len(&self) -> usize {
        self.routes.values().map(HashMap::len).sum()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Serialized as the list of rows in [`sorted_routes`](RoutingTable::sorted_routes) order
impl Serialize for RoutingTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let routes = self.sorted_routes();
        let mut seq = serializer.serialize_seq(Some(routes.len()))?;
        for route in routes {
            seq.serialize_element(route)?;
        }
        seq.end()
    }
}

impl Display for RoutingTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const TITLES: [&str; 5] = ["destination", "stack", "next hop", "function", "cost"];

        let rows: Vec<[String; 5]> = self
            .sorted_routes()
            .into_iter()
            .map(|route| {
                [
                    route.dest.to_string(),
                    route.stack.to_string(),
                    route.next_hop.to_string(),
                    route.function.to_string(),
                    route.cost.to_string(),
                ]
            })
            .collect();

        let mut widths = TITLES.map(|title| title.chars().count());
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let render = |cells: [&str; 5]| -> String {
            cells
                .iter()
                .zip(widths)
                .map(|(cell, width)| format!("{:^width$}", cell, width = width))
                .collect::<Vec<_>>()
                .join(" | ")
        };

        let header = render(TITLES);
        writeln!(f, "{}", header)?;
        writeln!(f, "{}", "-".repeat(header.chars().count()))?;
        for row in &rows {
            writeln!(f, "{}", render(row.each_ref().map(String::as_str)))?;
        }
        Ok(())
    }
}
