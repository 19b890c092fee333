//! Routing agent
//!
//! A [`Node`] owns its routing table, its derived In/Out stack sets and its
//! counters. It learns routes from CONF advertisements sent by its neighbors
//! and forwards user messages along the routes it has learned.
//!
//! ```text
//! Initializing -> Waiting <-> Processing
//!                    |
//!                    +-- STOP --> Stopped
//! ```

use std::ops::ControlFlow;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::timeout;
use tracing::{debug, info, trace, warn};

use adaptnet_core::{
    AdaptationFunction, ConfMessage, Cost, Message, NetworkTopology, NodeId, Payload,
    PhysicalMessage, ProtocolStack,
};
use adaptnet_routing::{RouteUpdate, RoutingTable};

use crate::mailboxes::Mailboxes;

/// Lifecycle of a node worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NodeState {
    Initializing,
    Waiting,
    Processing,
    Stopped,
}

/// Per-node counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NodeStats {
    pub conf_sent: u64,
    pub conf_received: u64,
    /// User messages addressed to this node
    pub message_received: u64,
    /// User messages forwarded to a next hop
    pub message_routed: u64,
    /// User messages dropped for lack of a usable route
    pub message_discarded: u64,
}

impl NodeStats {
    /// Add another node's counters to these
    pub fn merge(&mut self, other: &NodeStats) {
        self.conf_sent += other.conf_sent;
        self.conf_received += other.conf_received;
        self.message_received += other.message_received;
        self.message_routed += other.message_routed;
        self.message_discarded += other.message_discarded;
    }
}

/// A routing agent
pub struct Node {
    id: NodeId,
    functions: Vec<AdaptationFunction>,
    max_stack: usize,
    neighbors: Vec<NodeId>,
    topology: Arc<dyn NetworkTopology>,
    mailboxes: Mailboxes,
    in_stacks: Vec<ProtocolStack>,
    out_stacks: Vec<ProtocolStack>,
    table: RoutingTable,
    stats: NodeStats,
    delivered: Vec<Message>,
    state: NodeState,
}

impl Node {
    /// Create a node knowing `functions`, building stacks of at most `max_stack`
    pub fn new(
        id: NodeId,
        functions: Vec<AdaptationFunction>,
        topology: Arc<dyn NetworkTopology>,
        mailboxes: Mailboxes,
        max_stack: usize,
    ) -> Self {
        let neighbors = topology.neighbors(id);
        Self {
            id,
            functions,
            max_stack,
            neighbors,
            topology,
            mailboxes,
            in_stacks: Vec::new(),
            out_stacks: Vec::new(),
            table: RoutingTable::new(),
            stats: NodeStats::default(),
            delivered: Vec::new(),
            state: NodeState::Initializing,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn functions(&self) -> &[AdaptationFunction] {
        &self.functions
    }

    pub fn neighbors(&self) -> &[NodeId] {
        &self.neighbors
    }

    pub fn table(&self) -> &RoutingTable {
        &self.table
    }

    pub fn stats(&self) -> &NodeStats {
        &self.stats
    }

    pub fn state(&self) -> NodeState {
        self.state
    }

    /// Minimal stacks this node accepts, one per distinct shape
    pub fn in_stacks(&self) -> &[ProtocolStack] {
        &self.in_stacks
    }

    /// Minimal stacks this node produces, one per distinct shape
    pub fn out_stacks(&self) -> &[ProtocolStack] {
        &self.out_stacks
    }

    /// User messages that reached this node as their destination
    pub fn delivered(&self) -> &[Message] {
        &self.delivered
    }

    /// Consume the node, keeping only what a report needs
    pub fn into_parts(self) -> (NodeId, NodeStats, RoutingTable, Vec<Message>) {
        (self.id, self.stats, self.table, self.delivered)
    }

    /// Install self-routes, derive In/Out sets and advertise every In stack
    pub fn initialize(&mut self) {
        let mut self_routes = Vec::new();
        for function in feasible(&self.functions, self.max_stack) {
            let Some(input) = function.in_stack(self.max_stack) else {
                continue;
            };
            self_routes.push((*function, input, function.out_stack(self.max_stack)));
        }

        let skipped = self.functions.len() - self_routes.len();
        if skipped > 0 {
            debug!(node = %self.id, skipped, max_stack = self.max_stack, "Infeasible functions ignored");
        }

        for (function, input, output) in self_routes {
            self.table.add_route(self.id, self.id, 0, function, &input);
            if !self.in_stacks.contains(&input) {
                self.in_stacks.push(input);
            }
            // an encapsulation on a single slot produces nothing
            if let Some(output) = output.filter(|output| !self.out_stacks.contains(output)) {
                self.out_stacks.push(output);
            }
        }

        let advertised: Vec<ConfMessage> = self
            .in_stacks
            .iter()
            .map(|stack| ConfMessage::new(self.id, stack.clone(), 0))
            .collect();
        for conf in advertised {
            self.flood(conf);
        }

        self.state = NodeState::Waiting;
    }

    /// Dispatch one queued message
    ///
    /// Breaks on STOP; nothing is processed or sent once stopped.
    pub fn handle(&mut self, message: PhysicalMessage) -> ControlFlow<()> {
        if self.state == NodeState::Stopped {
            return ControlFlow::Break(());
        }

        trace!(node = %self.id, %message, "Handling message");
        self.state = NodeState::Processing;
        match message.payload {
            Payload::Conf(conf) => match message.sender {
                Some(from) => self.handle_conf(from, conf),
                None => warn!(node = %self.id, "CONF without sender ignored"),
            },
            Payload::Data(data) => self.handle_message(data),
            Payload::Stop => {
                self.state = NodeState::Stopped;
                return ControlFlow::Break(());
            }
        }
        self.state = NodeState::Waiting;
        ControlFlow::Continue(())
    }

    /// Learn from an advertisement sent by neighbor `from`
    ///
    /// For each owned function whose reverse can be applied to the advertised
    /// stack, the reversed stack is what this node must be handed to produce the
    /// advertised one. Accepted routes are flooded to every neighbor.
    pub fn handle_conf(&mut self, from: NodeId, conf: ConfMessage) {
        let mut accepted: Vec<ConfMessage> = Vec::new();

        for function in feasible(&self.functions, self.max_stack) {
            let Some(required) = function.reverse().applied(&conf.stack) else {
                continue;
            };
            let fee = self.topology.link_cost(self.id, from, function);
            let cost: Cost = conf.cost.saturating_add(fee);

            match self.table.update(conf.dest, from, cost, *function, &required) {
                RouteUpdate::Rejected { .. } => {}
                update => {
                    debug!(
                        node = %self.id,
                        dest = %conf.dest,
                        stack = %required,
                        next_hop = %from,
                        %function,
                        cost,
                        ?update,
                        "Route accepted"
                    );
                    accepted.push(ConfMessage::new(conf.dest, required, cost));
                }
            }
        }

        self.stats.conf_received += 1;

        for conf in accepted {
            self.flood(conf);
        }
    }

    /// Deliver or forward a user message
    pub fn handle_message(&mut self, mut message: Message) {
        if message.dest == self.id {
            self.stats.message_received += 1;
            info!(node = %self.id, source = %message.source, stack = %message.stack, "Message delivered");
            self.delivered.push(message);
            return;
        }

        let route = match self.table.lookup(message.dest, &message.stack) {
            Ok(route) => route,
            Err(e) => {
                self.stats.message_discarded += 1;
                warn!(node = %self.id, error = %e, "Message discarded");
                return;
            }
        };

        let Some(stack) = route.function.applied(&message.stack) else {
            self.stats.message_discarded += 1;
            warn!(
                node = %self.id,
                function = %route.function,
                stack = %message.stack,
                "Message discarded: function not applicable"
            );
            return;
        };

        let next_hop = route.next_hop;
        trace!(node = %self.id, dest = %message.dest, %next_hop, %stack, "Routing message");
        message.stack = stack;
        self.stats.message_routed += 1;
        self.mailboxes
            .post(PhysicalMessage::data(self.id, next_hop, message));
    }

    /// Send `conf` to every neighbor, including the one it was learned from
    fn flood(&mut self, conf: ConfMessage) {
        for &neighbor in &self.neighbors {
            self.stats.conf_sent += 1;
            self.mailboxes
                .post(PhysicalMessage::conf(self.id, neighbor, conf.clone()));
        }
    }

    /// Initialize, then process the queue until STOP
    ///
    /// Every dequeued message raises `activity`. The node is handed back once
    /// stopped so its table and counters can be reported.
    pub async fn run(
        mut self,
        mut inbox: UnboundedReceiver<PhysicalMessage>,
        activity: Arc<AtomicBool>,
        receive_timeout: Duration,
    ) -> Self {
        info!(node = %self.id, functions = self.functions.len(), neighbors = self.neighbors.len(), "Node started");
        self.initialize();

        loop {
            match timeout(receive_timeout, inbox.recv()).await {
                Ok(Some(message)) => {
                    activity.store(true, Ordering::Release);
                    if self.handle(message).is_break() {
                        break;
                    }
                }
                Ok(None) => {
                    warn!(node = %self.id, "Queue closed before STOP");
                    self.state = NodeState::Stopped;
                    break;
                }
                // idle
                Err(_) => continue,
            }
        }

        info!(
            node = %self.id,
            routes = self.table.len(),
            conf_sent = self.stats.conf_sent,
            conf_received = self.stats.conf_received,
            "Node stopped"
        );
        self
    }
}

fn feasible(
    functions: &[AdaptationFunction],
    max_stack: usize,
) -> impl Iterator<Item = &AdaptationFunction> {
    functions
        .iter()
        .filter(move |function| function.is_feasible(max_stack))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::Mesh;

    use adaptnet_core::AdaptKind;

    fn stack(tags: &str) -> ProtocolStack {
        ProtocolStack::from_tags(4, tags).unwrap()
    }

    /// Line 0 - 1 - 2 with registered queues for every node
    fn line() -> (Arc<dyn NetworkTopology>, Mailboxes, Vec<UnboundedReceiver<PhysicalMessage>>) {
        let mesh = Mesh::from_edges(&[(0, 1), (1, 2)]);
        let mailboxes = Mailboxes::new();
        let inboxes = (0..3).map(|i| mailboxes.register(NodeId(i))).collect();
        (Arc::new(mesh), mailboxes, inboxes)
    }

    fn drain(rx: &mut UnboundedReceiver<PhysicalMessage>) -> Vec<PhysicalMessage> {
        let mut out = Vec::new();
        while let Ok(message) = rx.try_recv() {
            out.push(message);
        }
        out
    }

    #[test]
    fn test_initialize_installs_self_routes() {
        let (topology, mailboxes, _inboxes) = line();
        let functions = vec![
            AdaptationFunction::conversion(b'x', b'y'),
            AdaptationFunction::encapsulation(b'x', b'z'),
            AdaptationFunction::decapsulation(b'z', b'x'),
        ];
        let mut node = Node::new(NodeId(1), functions.clone(), topology, mailboxes, 4);
        node.initialize();

        for function in &functions {
            let input = function.in_stack(4).unwrap();
            let route = node.table().lookup(NodeId(1), &input).unwrap();
            assert_eq!(route.cost, 0);
            assert_eq!(route.next_hop, NodeId(1));
        }
        assert_eq!(node.state(), NodeState::Waiting);
    }

    #[test]
    fn test_initialize_dedups_and_advertises() {
        let (topology, mailboxes, mut inboxes) = line();
        // both accept <x> and produce <y>
        let functions = vec![
            AdaptationFunction::conversion(b'x', b'y'),
            AdaptationFunction::new(b'x'.into(), b'y'.into(), AdaptKind::Conversion),
            AdaptationFunction::conversion(b'z', b'y'),
        ];
        let mut node = Node::new(NodeId(1), functions, topology, mailboxes, 4);
        node.initialize();

        assert_eq!(node.in_stacks(), &[stack("x"), stack("z")]);
        assert_eq!(node.out_stacks(), &[stack("y")]);

        // one CONF per In stack to each of the two neighbors
        assert_eq!(node.stats().conf_sent, 4);
        let to_left = drain(&mut inboxes[0]);
        assert_eq!(to_left.len(), 2);
        assert_eq!(
            to_left[0],
            PhysicalMessage::conf(NodeId(1), NodeId(0), ConfMessage::new(NodeId(1), stack("x"), 0))
        );
        assert_eq!(drain(&mut inboxes[2]).len(), 2);
    }

    #[test]
    fn test_decapsulation_skipped_with_single_slot() {
        let (topology, mailboxes, _inboxes) = line();
        let decap = AdaptationFunction::decapsulation(b'y', b'x');
        let conv = AdaptationFunction::conversion(b'x', b'x');
        let mut node = Node::new(NodeId(0), vec![decap, conv], topology, mailboxes, 1);
        node.initialize();

        assert_eq!(node.in_stacks().len(), 1);
        assert_eq!(node.out_stacks().len(), 1);
        assert!(node.table().iter().all(|route| route.function != decap));

        // an advertisement the reversed decapsulation could otherwise use
        node.handle_conf(NodeId(1), ConfMessage::new(NodeId(1), ProtocolStack::from_tags(1, "x").unwrap(), 0));
        assert!(node.table().iter().all(|route| route.function != decap));
    }

    #[test]
    fn test_encapsulation_kept_with_single_slot() {
        let (topology, mailboxes, mut inboxes) = line();
        let encap = AdaptationFunction::encapsulation(b'x', b'y');
        let mut node = Node::new(NodeId(0), vec![encap], topology, mailboxes, 1);
        node.initialize();

        let single = ProtocolStack::from_tags(1, "x").unwrap();
        let route = node.table().lookup(NodeId(0), &single).unwrap();
        assert_eq!(route.function, encap);
        assert_eq!(route.cost, 0);
        assert_eq!(node.in_stacks(), &[single.clone()]);
        assert!(node.out_stacks().is_empty());

        assert_eq!(
            drain(&mut inboxes[1]),
            vec![PhysicalMessage::conf(NodeId(0), NodeId(1), ConfMessage::new(NodeId(0), single, 0))]
        );
    }

    #[test]
    fn test_conf_accepted_and_flooded() {
        let (topology, mailboxes, mut inboxes) = line();
        let function = AdaptationFunction::conversion(b'x', b'y');
        let mut node = Node::new(NodeId(1), vec![function], topology, mailboxes, 4);

        // node 2 can reach itself if handed <y>
        node.handle_conf(NodeId(2), ConfMessage::new(NodeId(2), stack("y"), 0));

        let route = node.table().lookup(NodeId(2), &stack("x")).unwrap();
        assert_eq!(route.next_hop, NodeId(2));
        assert_eq!(route.cost, 1);
        assert_eq!(route.function, function);
        assert_eq!(node.stats().conf_received, 1);

        // flooded to both neighbors, including the sender
        let expected = ConfMessage::new(NodeId(2), stack("x"), 1);
        assert_eq!(
            drain(&mut inboxes[0]),
            vec![PhysicalMessage::conf(NodeId(1), NodeId(0), expected.clone())]
        );
        assert_eq!(
            drain(&mut inboxes[2]),
            vec![PhysicalMessage::conf(NodeId(1), NodeId(2), expected)]
        );
    }

    #[test]
    fn test_conf_not_improving_is_not_flooded() {
        let (topology, mailboxes, mut inboxes) = line();
        let mut node = Node::new(NodeId(1), vec![AdaptationFunction::conversion(b'x', b'x')], topology, mailboxes, 4);

        node.handle_conf(NodeId(2), ConfMessage::new(NodeId(2), stack("x"), 3));
        node.handle_conf(NodeId(0), ConfMessage::new(NodeId(2), stack("x"), 5));

        assert_eq!(node.stats().conf_received, 2);
        assert_eq!(node.stats().conf_sent, 2);
        assert_eq!(node.table().lookup(NodeId(2), &stack("x")).unwrap().cost, 4);
        assert_eq!(drain(&mut inboxes[0]).len(), 1);
    }

    #[test]
    fn test_conf_with_no_usable_function() {
        let (topology, mailboxes, mut inboxes) = line();
        let mut node = Node::new(NodeId(1), vec![AdaptationFunction::conversion(b'x', b'y')], topology, mailboxes, 4);

        node.handle_conf(NodeId(2), ConfMessage::new(NodeId(2), stack("x"), 0));
        assert!(node.table().is_empty());
        assert_eq!(node.stats().conf_received, 1);
        assert!(drain(&mut inboxes[0]).is_empty());
    }

    #[test]
    fn test_message_forwarded_along_route() {
        let (topology, mailboxes, mut inboxes) = line();
        let function = AdaptationFunction::encapsulation(b'x', b'y');
        let mut node = Node::new(NodeId(1), vec![function], topology, mailboxes, 4);
        node.handle_conf(NodeId(2), ConfMessage::new(NodeId(2), stack("xy"), 0));
        drain(&mut inboxes[2]);

        node.handle_message(Message::new(NodeId(0), NodeId(2), stack("x"), b"hi".to_vec()));

        assert_eq!(node.stats().message_routed, 1);
        let forwarded = drain(&mut inboxes[2]);
        assert_eq!(
            forwarded,
            vec![PhysicalMessage::data(
                NodeId(1),
                NodeId(2),
                Message::new(NodeId(0), NodeId(2), stack("xy"), b"hi".to_vec())
            )]
        );
    }

    #[test]
    fn test_message_delivered_and_discarded() {
        let (topology, mailboxes, _inboxes) = line();
        let mut node = Node::new(NodeId(1), vec![], topology, mailboxes, 4);

        node.handle_message(Message::new(NodeId(0), NodeId(1), stack("x"), vec![]));
        node.handle_message(Message::new(NodeId(0), NodeId(2), stack("x"), vec![]));

        assert_eq!(node.stats().message_received, 1);
        assert_eq!(node.stats().message_discarded, 1);
        assert_eq!(node.delivered().len(), 1);
    }

    #[test]
    fn test_stop_is_terminal() {
        let (topology, mailboxes, mut inboxes) = line();
        let mut node = Node::new(NodeId(1), vec![AdaptationFunction::conversion(b'x', b'x')], topology, mailboxes, 4);

        assert!(node.handle(PhysicalMessage::stop(NodeId(1))).is_break());
        assert_eq!(node.state(), NodeState::Stopped);

        let conf = ConfMessage::new(NodeId(2), stack("x"), 0);
        assert!(node.handle(PhysicalMessage::conf(NodeId(2), NodeId(1), conf)).is_break());
        assert!(node.table().is_empty());
        assert!(drain(&mut inboxes[0]).is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_run_until_stop() {
        let (topology, mailboxes, mut inboxes) = line();
        let inbox = inboxes.remove(1);
        let node = Node::new(NodeId(1), vec![AdaptationFunction::conversion(b'x', b'x')], topology, mailboxes.clone(), 4);
        let activity = Arc::new(AtomicBool::new(false));

        mailboxes
            .send(PhysicalMessage::conf(NodeId(2), NodeId(1), ConfMessage::new(NodeId(2), stack("x"), 0)))
            .unwrap();
        mailboxes.send(PhysicalMessage::stop(NodeId(1))).unwrap();

        let node = node
            .run(inbox, Arc::clone(&activity), Duration::from_millis(5))
            .await;

        assert!(activity.load(Ordering::Acquire));
        assert_eq!(node.state(), NodeState::Stopped);
        assert_eq!(node.stats().conf_received, 1);
        assert!(node.table().contains(NodeId(2), &stack("x")));
    }
}
