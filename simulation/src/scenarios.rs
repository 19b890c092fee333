//! Pre-defined simulation scenarios
//!
//! Small topologies whose converged routes are known in advance. Nodes are
//! named by letter ('A' is node 0) and each scenario carries a probe message
//! that should be delivered once the routes have converged.

use std::collections::BTreeMap;

use adaptnet_core::{AdaptationFunction, Link, Message, NodeId, ProtocolStack};

use crate::config::NetworkConfig;
use crate::error::SimulationResult;
use crate::network::Network;
use crate::topology::Mesh;

/// A user message sent after convergence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Probe {
    pub source: NodeId,
    pub dest: NodeId,
    /// Initial stack, bottom first
    pub tags: String,
}

impl Probe {
    pub fn new(source: NodeId, dest: NodeId, tags: impl Into<String>) -> Self {
        Self {
            source,
            dest,
            tags: tags.into(),
        }
    }

    pub fn message(&self, max_stack: usize) -> SimulationResult<Message> {
        let stack = ProtocolStack::from_tags(max_stack, &self.tags)?;
        Ok(Message::new(self.source, self.dest, stack, b"probe".to_vec()))
    }
}

/// A topology, its function assignment and a probe message
#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: &'static str,
    pub description: &'static str,
    pub mesh: Mesh,
    pub functions: BTreeMap<NodeId, Vec<AdaptationFunction>>,
    pub probe: Option<Probe>,
}

impl Scenario {
    /// Build a network for this scenario, scheduling the probe if any
    pub fn network(self, config: NetworkConfig) -> SimulationResult<Network> {
        let probe = self
            .probe
            .as_ref()
            .map(|probe| probe.message(config.max_stack))
            .transpose()?;
        let mut network = Network::new(self.mesh, self.functions, config);
        if let Some(message) = probe {
            network.schedule_message(message);
        }
        Ok(network)
    }

    /// Same scenario without the probe message
    pub fn without_probe(mut self) -> Self {
        self.probe = None;
        self
    }
}

// Scenario nodes, named as in `NodeId::from_letter`
const A: NodeId = NodeId(0);
const B: NodeId = NodeId(1);
const C: NodeId = NodeId(2);
const D: NodeId = NodeId(3);
const E: NodeId = NodeId(4);
const F: NodeId = NodeId(5);
const G: NodeId = NodeId(6);

fn mesh(edges: &[(NodeId, NodeId)]) -> Mesh {
    let mut mesh = Mesh::new();
    for &(a, b) in edges {
        mesh.connect(a, b);
    }
    mesh
}

fn assign(entries: Vec<(NodeId, Vec<AdaptationFunction>)>) -> BTreeMap<NodeId, Vec<AdaptationFunction>> {
    entries.into_iter().collect()
}

fn conv(input: u8, output: u8) -> AdaptationFunction {
    AdaptationFunction::conversion(input, output)
}

/// Two nodes over a free link sharing `a -> a`
pub fn single_link() -> Scenario {
    let mut mesh = Mesh::new();
    mesh.connect_with(A, B, Link::new(0));

    Scenario {
        name: "single-link",
        description: "A - B over a zero-cost link, both know a -> a",
        mesh,
        functions: assign(vec![(A, vec![conv(b'a', b'a')]), (B, vec![conv(b'a', b'a')])]),
        probe: Some(Probe::new(A, B, "a")),
    }
}

/// A - B - C - D, every node knows `x -> x`
pub fn uniform_line() -> Scenario {
    let x = conv(b'x', b'x');
    Scenario {
        name: "uniform-line",
        description: "A - B - C - D, every node knows x -> x",
        mesh: mesh(&[(A, B), (B, C), (C, D)]),
        functions: assign(vec![(A, vec![x]), (B, vec![x]), (C, vec![x]), (D, vec![x])]),
        probe: Some(Probe::new(A, D, "x")),
    }
}

/// A - B - C - D where the middle speaks `y`
pub fn translated_line() -> Scenario {
    let x = conv(b'x', b'x');
    let middle = vec![conv(b'x', b'y'), conv(b'y', b'x')];
    Scenario {
        name: "translated-line",
        description: "A - B - C - D, ends know x -> x, B and C translate between x and y",
        mesh: mesh(&[(A, B), (B, C), (C, D)]),
        functions: assign(vec![
            (A, vec![x]),
            (B, middle.clone()),
            (C, middle),
            (D, vec![x]),
        ]),
        probe: Some(Probe::new(A, D, "x")),
    }
}

/// A - B - C - D where the middle tunnels `x` inside `y`
pub fn tunnel_line() -> Scenario {
    let x = conv(b'x', b'x');
    let middle = vec![
        AdaptationFunction::encapsulation(b'x', b'y'),
        AdaptationFunction::decapsulation(b'y', b'x'),
    ];
    Scenario {
        name: "tunnel-line",
        description: "A - B - C - D, ends know x -> x, B and C encapsulate x in y and back",
        mesh: mesh(&[(A, B), (B, C), (C, D)]),
        functions: assign(vec![
            (A, vec![x]),
            (B, middle.clone()),
            (C, middle),
            (D, vec![x]),
        ]),
        probe: Some(Probe::new(A, D, "x")),
    }
}

/// A route from A to G that loops twice through the B - C - D triangle
///
/// ```text
/// A - B - E - F - G
///    / \
///   C - D
/// ```
///
/// C pushes `h`, D rewrites it, E and F pop the two extra layers.
pub fn detour() -> Scenario {
    Scenario {
        name: "detour",
        description: "A to G through a triangle that builds a three-layer stack",
        mesh: mesh(&[
            (A, B),
            (B, C),
            (C, D),
            (D, B),
            (B, E),
            (E, F),
            (F, G),
        ]),
        functions: assign(vec![
            (A, vec![conv(b'x', b'x')]),
            (B, vec![conv(b'x', b'x'), conv(b'y', b'y'), conv(b'z', b'z')]),
            (
                C,
                vec![
                    AdaptationFunction::encapsulation(b'x', b'h'),
                    AdaptationFunction::encapsulation(b'y', b'h'),
                ],
            ),
            (D, vec![conv(b'h', b'y'), conv(b'h', b'z')]),
            (E, vec![AdaptationFunction::decapsulation(b'z', b'y')]),
            (F, vec![AdaptationFunction::decapsulation(b'y', b'x')]),
            (G, vec![conv(b'x', b'x')]),
        ]),
        probe: Some(Probe::new(A, G, "x")),
    }
}

/// Two paths from A to F where only the longer one can deliver
///
/// ```text
/// A - B - C - D - F
///  \             /
///   E -----------
/// ```
pub fn split_paths() -> Scenario {
    let x = conv(b'x', b'x');
    Scenario {
        name: "split-paths",
        description: "A to F, the short path through E pushes a layer F cannot use",
        mesh: mesh(&[
            (A, B),
            (B, C),
            (C, D),
            (D, F),
            (A, E),
            (E, F),
        ]),
        functions: assign(vec![
            (A, vec![x]),
            (B, vec![x]),
            (C, vec![x]),
            (D, vec![conv(b'x', b'y')]),
            (E, vec![AdaptationFunction::encapsulation(b'x', b'y')]),
            (F, vec![conv(b'y', b'y')]),
        ]),
        probe: Some(Probe::new(A, F, "x")),
    }
}

/// Every scenario, smallest first
pub fn all() -> Vec<Scenario> {
    vec![
        single_link(),
        uniform_line(),
        translated_line(),
        tunnel_line(),
        detour(),
        split_paths(),
    ]
}

/// Look a scenario up by name
pub fn by_name(name: &str) -> Option<Scenario> {
    all().into_iter().find(|scenario| scenario.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use adaptnet_core::NetworkTopology;

    #[test]
    fn test_node_names_match_letters() {
        for (node, letter) in [(A, 'A'), (D, 'D'), (G, 'G')] {
            assert_eq!(NodeId::from_letter(letter), Some(node));
        }
    }

    #[test]
    fn test_every_node_has_functions() {
        for scenario in all() {
            for node in scenario.mesh.nodes() {
                assert!(
                    scenario.functions.contains_key(&node),
                    "{} has no functions for node {}",
                    scenario.name,
                    node
                );
            }
        }
    }

    #[test]
    fn test_lookup_by_name() {
        assert_eq!(by_name("detour").unwrap().mesh.edge_count(), 7);
        assert!(by_name("nowhere").is_none());
    }

    #[test]
    fn test_probe_too_long_for_stack() {
        let probe = Probe::new(A, B, "xyz");
        assert!(probe.message(2).is_err());
        assert_eq!(probe.message(3).unwrap().stack.len(), 3);
    }
}
