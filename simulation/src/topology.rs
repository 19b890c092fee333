//! Mesh topologies
//!
//! Provides functions to create various network topologies:
//! - Line: A - B - C - ...
//! - Ring: a line closed on itself
//! - Full mesh: every node connected to every other
//! - Star: one hub connected to every other node
//! - Random: configurable connection probability
//! - Custom: build from an edge list
//!
//! Every edge carries a [`Link`] with the cost of each adaptation function
//! applied across it.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

use rand::Rng;

use adaptnet_core::{AdaptationFunction, Cost, Link, NetworkTopology, NodeId};

/// An undirected network topology with per-edge costs
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    /// Adjacency list representation for quick lookups
    adjacency: BTreeMap<NodeId, BTreeSet<NodeId>>,
    /// Cost tables, keyed by the normalized (smaller, larger) pair
    links: BTreeMap<(NodeId, NodeId), Link>,
}

fn edge_key(a: NodeId, b: NodeId) -> (NodeId, NodeId) {
    if a < b { (a, b) } else { (b, a) }
}

impl Mesh {
    /// Create an empty mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a mesh from `(a, b)` id pairs, every edge with the default link
    pub fn from_edges(edges: &[(u32, u32)]) -> Self {
        let mut mesh = Self::new();
        for &(a, b) in edges {
            mesh.connect(NodeId(a), NodeId(b));
        }
        mesh
    }

    /// Add an isolated node
    pub fn add_node(&mut self, id: NodeId) {
        self.adjacency.entry(id).or_default();
    }

    /// Add a bidirectional connection with the default link
    pub fn connect(&mut self, a: NodeId, b: NodeId) {
        self.connect_with(a, b, Link::default());
    }

    /// Add a bidirectional connection carrying `link`
    ///
    /// Reconnecting an existing edge replaces its link. Self-loops are ignored.
    pub fn connect_with(&mut self, a: NodeId, b: NodeId, link: Link) {
        if a == b {
            return;
        }
        self.adjacency.entry(a).or_default().insert(b);
        self.adjacency.entry(b).or_default().insert(a);
        self.links.insert(edge_key(a, b), link);
    }

    /// Get all neighbors of a node
    pub fn neighbors_of(&self, node: NodeId) -> Option<&BTreeSet<NodeId>> {
        self.adjacency.get(&node)
    }

    /// Check if two nodes are directly connected
    pub fn are_connected(&self, a: NodeId, b: NodeId) -> bool {
        self.adjacency
            .get(&a)
            .is_some_and(|neighbors| neighbors.contains(&b))
    }

    /// Get the link between two nodes
    pub fn link(&self, a: NodeId, b: NodeId) -> Option<&Link> {
        self.links.get(&edge_key(a, b))
    }

    /// Get the mutable link between two nodes
    pub fn link_mut(&mut self, a: NodeId, b: NodeId) -> Option<&mut Link> {
        self.links.get_mut(&edge_key(a, b))
    }

    /// Get all node IDs
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.adjacency.keys().copied().collect()
    }

    /// Get number of nodes
    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Get number of connections (edges)
    pub fn edge_count(&self) -> usize {
        self.links.len()
    }

    /// Print a simple ASCII visualization of the mesh
    pub fn visualize(&self) -> String {
        let mut output = String::new();
        output.push_str("Mesh Topology:\n");
        let _ = writeln!(output, "  Nodes: {}", self.node_count());
        let _ = writeln!(output, "  Edges: {}\n", self.edge_count());

        for (node, neighbors) in &self.adjacency {
            let neighbor_str: Vec<String> = neighbors.iter().map(|n| n.to_string()).collect();
            let _ = writeln!(output, "  {} -> [{}]", node, neighbor_str.join(", "));
        }
        output
    }
}

impl NetworkTopology for Mesh {
    fn nodes(&self) -> Vec<NodeId> {
        self.node_ids()
    }

    fn neighbors(&self, node: NodeId) -> Vec<NodeId> {
        self.neighbors_of(node)
            .map(|neighbors| neighbors.iter().copied().collect())
            .unwrap_or_default()
    }

    fn link_cost(&self, a: NodeId, b: NodeId, function: &AdaptationFunction) -> Cost {
        self.link(a, b)
            .map(|link| link.cost(function))
            .unwrap_or_else(|| Link::default().default_cost())
    }
}

/// Builder for creating mesh topologies over nodes `0..node_count`
pub struct MeshBuilder {
    node_count: u32,
    link: Link,
}

impl MeshBuilder {
    pub fn new(node_count: u32) -> Self {
        Self {
            node_count,
            link: Link::default(),
        }
    }

    /// Use `link` for every edge built
    pub fn with_link(mut self, link: Link) -> Self {
        self.link = link;
        self
    }

    fn empty(&self) -> (Mesh, Vec<NodeId>) {
        let mut mesh = Mesh::new();
        let nodes = NodeId::range(self.node_count);
        for node in &nodes {
            mesh.add_node(*node);
        }
        (mesh, nodes)
    }

    /// 0 - 1 - 2 - ... - n-1
    pub fn line(self) -> Mesh {
        let (mut mesh, nodes) = self.empty();
        for pair in nodes.windows(2) {
            mesh.connect_with(pair[0], pair[1], self.link.clone());
        }
        mesh
    }

    /// A line whose last node connects back to the first
    pub fn ring(self) -> Mesh {
        let (mut mesh, nodes) = self.empty();
        for i in 0..nodes.len() {
            let next = (i + 1) % nodes.len();
            mesh.connect_with(nodes[i], nodes[next], self.link.clone());
        }
        mesh
    }

    /// Every node connected to every other
    pub fn full_mesh(self) -> Mesh {
        let (mut mesh, nodes) = self.empty();
        for (i, a) in nodes.iter().enumerate() {
            for b in &nodes[i + 1..] {
                mesh.connect_with(*a, *b, self.link.clone());
            }
        }
        mesh
    }

    /// Build a random mesh with given connection probability
    pub fn random(self, connection_probability: f64) -> Mesh {
        self.random_with(&mut rand::rng(), connection_probability)
    }

    /// Build a random mesh drawing from `rng`
    ///
    /// Each pair is connected with `connection_probability`, then every node
    /// left isolated is attached to some other node.
    pub fn random_with<R: Rng>(self, rng: &mut R, connection_probability: f64) -> Mesh {
        let (mut mesh, nodes) = self.empty();
        for (i, a) in nodes.iter().enumerate() {
            for b in &nodes[i + 1..] {
                if rng.random::<f64>() < connection_probability {
                    mesh.connect_with(*a, *b, self.link.clone());
                }
            }
        }

        if nodes.len() < 2 {
            return mesh;
        }
        for (i, node) in nodes.iter().enumerate() {
            if mesh.neighbors_of(*node).is_none_or(|neighbors| neighbors.is_empty()) {
                let mut other = rng.random_range(0..nodes.len() - 1);
                if other >= i {
                    other += 1;
                }
                mesh.connect_with(*node, nodes[other], self.link.clone());
            }
        }
        mesh
    }

    /// Node 0 connected to every other node
    pub fn star(self) -> Mesh {
        let (mut mesh, nodes) = self.empty();
        if let Some((hub, spokes)) = nodes.split_first() {
            for spoke in spokes {
                mesh.connect_with(*hub, *spoke, self.link.clone());
            }
        }
        mesh
    }
}
