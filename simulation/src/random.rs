//! Randomly generated networks
//!
//! A [`RandomNetwork`] draws a random mesh and gives every node a random
//! subset of the function catalogue over the first few protocol letters.
//! Running it several times measures how often routes exist at all and how
//! long they take to settle.

use std::collections::BTreeMap;
use std::fmt::{self, Display};
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use adaptnet_core::{AdaptationFunction, FunctionAssignment, NodeId, Protocol};

use crate::config::NetworkConfig;
use crate::error::{SimulationError, SimulationResult};
use crate::network::Network;
use crate::report::SimulationReport;
use crate::topology::{Mesh, MeshBuilder};

/// Protocols are named by the letters 'a'..='z'
pub const MAX_PROTOCOLS: usize = 26;

/// Functions picked independently for every node
#[derive(Debug, Clone, Default)]
pub struct RandomAssignment {
    functions: BTreeMap<NodeId, Vec<AdaptationFunction>>,
}

impl RandomAssignment {
    /// Give each node every function of `catalogue` with `probability`
    pub fn draw<R: Rng>(
        nodes: &[NodeId],
        catalogue: &[AdaptationFunction],
        probability: f64,
        rng: &mut R,
    ) -> Self {
        let mut functions = BTreeMap::new();
        for node in nodes {
            let mut owned = Vec::new();
            for function in catalogue {
                if rng.random::<f64>() < probability {
                    owned.push(*function);
                }
            }
            functions.insert(*node, owned);
        }
        Self { functions }
    }

    pub fn functions(&self) -> &BTreeMap<NodeId, Vec<AdaptationFunction>> {
        &self.functions
    }

    /// Number of functions handed out over all nodes
    pub fn total(&self) -> usize {
        self.functions.values().map(Vec::len).sum()
    }
}

impl FunctionAssignment for RandomAssignment {
    fn functions_of(&self, node: NodeId) -> Vec<AdaptationFunction> {
        self.functions.get(&node).cloned().unwrap_or_default()
    }
}

/// Parameters of a random network
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RandomNetwork {
    pub nodes: u32,
    /// How many protocol letters the catalogue is built over
    pub protocols: usize,
    /// Chance that a node owns any one catalogue function
    pub function_probability: f64,
    /// Chance that any two nodes are linked
    pub connection_probability: f64,
}

impl Default for RandomNetwork {
    fn default() -> Self {
        Self {
            nodes: 10,
            protocols: 3,
            function_probability: 0.3,
            connection_probability: 0.4,
        }
    }
}

impl RandomNetwork {
    pub fn new(nodes: u32, protocols: usize) -> Self {
        Self {
            nodes,
            protocols,
            ..Default::default()
        }
    }

    pub fn with_function_probability(mut self, probability: f64) -> Self {
        self.function_probability = probability;
        self
    }

    pub fn with_connection_probability(mut self, probability: f64) -> Self {
        self.connection_probability = probability;
        self
    }

    /// The protocols `a`, `b`, ... the catalogue is built over
    pub fn protocols(&self) -> SimulationResult<Vec<Protocol>> {
        if self.protocols == 0 || self.protocols > MAX_PROTOCOLS {
            return Err(SimulationError::InvalidParameter(format!(
                "protocol count must be within 1..={}, got {}",
                MAX_PROTOCOLS, self.protocols
            )));
        }
        Ok((b'a'..).take(self.protocols).map(Protocol::new).collect())
    }

    fn validate(&self) -> SimulationResult<()> {
        if self.nodes == 0 {
            return Err(SimulationError::EmptyNetwork);
        }
        for (name, p) in [
            ("function probability", self.function_probability),
            ("connection probability", self.connection_probability),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(SimulationError::InvalidParameter(format!(
                    "{} must be within 0..=1, got {}",
                    name, p
                )));
            }
        }
        Ok(())
    }

    /// Draw one mesh and function assignment
    pub fn generate<R: Rng>(&self, rng: &mut R) -> SimulationResult<(Mesh, RandomAssignment)> {
        self.validate()?;
        let catalogue = AdaptationFunction::catalogue(&self.protocols()?);
        let mesh = MeshBuilder::new(self.nodes).random_with(rng, self.connection_probability);
        let assignment =
            RandomAssignment::draw(&mesh.node_ids(), &catalogue, self.function_probability, rng);
        Ok((mesh, assignment))
    }

    /// Generate and run `iterations` independent networks
    pub async fn run<R: Rng>(
        &self,
        config: NetworkConfig,
        iterations: usize,
        rng: &mut R,
    ) -> SimulationResult<Vec<IterationSummary>> {
        let mut summaries = Vec::with_capacity(iterations);
        for iteration in 1..=iterations {
            let (mesh, assignment) = self.generate(rng)?;
            let edges = mesh.edge_count();
            let functions = assignment.total();

            let report = Network::new(mesh, assignment, config).run().await?;
            let summary = IterationSummary::new(iteration, edges, functions, &report);
            info!(
                iteration,
                edges,
                functions,
                reachability = summary.reachability,
                converged = summary.converged,
                "Iteration finished"
            );
            summaries.push(summary);
        }
        Ok(summaries)
    }
}

/// Outcome of one random network run
#[derive(Debug, Clone, Serialize)]
pub struct IterationSummary {
    /// 1-based
    pub iteration: usize,
    pub nodes: usize,
    pub edges: usize,
    /// Functions owned over all nodes
    pub functions: usize,
    pub converged: bool,
    pub convergence_time: Duration,
    pub reachability: f64,
    pub conf_sent: u64,
    pub routes: usize,
}

impl IterationSummary {
    pub fn new(iteration: usize, edges: usize, functions: usize, report: &SimulationReport) -> Self {
        Self {
            iteration,
            nodes: report.nodes.len(),
            edges,
            functions,
            converged: report.converged,
            convergence_time: report.convergence_time,
            reachability: report.reachability(),
            conf_sent: report.totals.conf_sent,
            routes: report.nodes.values().map(|node| node.table.len()).sum(),
        }
    }
}

impl Display for IterationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{:<3} {} nodes, {} edges, {} functions: {} routes, reachability {:.1}%, {} in {:?}",
            self.iteration,
            self.nodes,
            self.edges,
            self.functions,
            self.routes,
            self.reachability * 100.0,
            if self.converged { "converged" } else { "stopped" },
            self.convergence_time
        )
    }
}
