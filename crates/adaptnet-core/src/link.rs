//! Per-edge cost tables
//!
//! A [`Link`] assigns a cost to each adaptation function applied across one
//! edge of the topology. Functions without an explicit entry pay the link's
//! default cost.

use std::collections::HashMap;

use crate::Cost;
use crate::adaptation::AdaptationFunction;

/// Cost table for a single edge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    default_cost: Cost,
    costs: HashMap<AdaptationFunction, Cost>,
}

impl Link {
    /// Create a link where every function costs `default_cost`
    pub fn new(default_cost: Cost) -> Self {
        Self {
            default_cost,
            costs: HashMap::new(),
        }
    }

    /// Create a link with explicit entries for `functions`, all at `default_cost`
    pub fn with_functions(
        default_cost: Cost,
        functions: impl IntoIterator<Item = AdaptationFunction>,
    ) -> Self {
        let mut link = Self::new(default_cost);
        for function in functions {
            link.add_function(function);
        }
        link
    }

    /// Record `function` at the default cost
    pub fn add_function(&mut self, function: AdaptationFunction) {
        self.costs.insert(function, self.default_cost);
    }

    /// Set the cost of `function` on this link
    pub fn set_cost(&mut self, function: AdaptationFunction, cost: Cost) {
        self.costs.insert(function, cost);
    }

    /// Builder form of [`set_cost`](Self::set_cost)
    pub fn with_cost(mut self, function: AdaptationFunction, cost: Cost) -> Self {
        self.set_cost(function, cost);
        self
    }

    /// Cost of applying `function` across this link
    pub fn cost(&self, function: &AdaptationFunction) -> Cost {
        self.costs.get(function).copied().unwrap_or(self.default_cost)
    }

    pub fn default_cost(&self) -> Cost {
        self.default_cost
    }
}

impl Default for Link {
    fn default() -> Self {
        Self::new(1)
    }
}
