//! Messages exchanged between nodes
//!
//! - [`ConfMessage`]: route advertisement ("I can reach `dest` for `cost` if
//!   handed `stack`")
//! - [`Message`]: user payload travelling with its protocol stack
//! - [`PhysicalMessage`]: the envelope actually placed in a node's queue

use std::fmt::{self, Display};

use crate::Cost;
use crate::identity::NodeId;
use crate::stack::ProtocolStack;

/// Route advertisement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfMessage {
    /// Destination the route leads to
    pub dest: NodeId,
    /// Stack the advertising node must be handed
    pub stack: ProtocolStack,
    /// Cost from the advertising node to `dest`
    pub cost: Cost,
}

impl ConfMessage {
    pub fn new(dest: NodeId, stack: ProtocolStack, cost: Cost) -> Self {
        Self { dest, stack, cost }
    }
}

impl Display for ConfMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "∙ → {} : [{}] {}", self.dest, self.cost, self.stack)
    }
}

/// User payload routed through the network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub source: NodeId,
    pub dest: NodeId,
    pub stack: ProtocolStack,
    pub payload: Vec<u8>,
}

impl Message {
    pub fn new(source: NodeId, dest: NodeId, stack: ProtocolStack, payload: Vec<u8>) -> Self {
        Self {
            source,
            dest,
            stack,
            payload,
        }
    }
}

impl Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}) → ({}) : {}", self.source, self.dest, self.stack)
    }
}

/// Tag of a physical message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Msg,
    Conf,
    Stop,
}

impl Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageKind::Msg => f.write_str("MSG"),
            MessageKind::Conf => f.write_str("CONF"),
            MessageKind::Stop => f.write_str("STOP"),
        }
    }
}

/// Content of a physical message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Conf(ConfMessage),
    Data(Message),
    Stop,
}

impl Payload {
    pub fn kind(&self) -> MessageKind {
        match self {
            Payload::Conf(_) => MessageKind::Conf,
            Payload::Data(_) => MessageKind::Msg,
            Payload::Stop => MessageKind::Stop,
        }
    }
}

/// Transport envelope placed in the receiver's queue
///
/// Ownership moves from the sender into the queue and then to the receiving
/// worker, which drops it once dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhysicalMessage {
    /// Sending node, `None` when the network itself is the sender
    pub sender: Option<NodeId>,
    pub receiver: NodeId,
    pub payload: Payload,
}

impl PhysicalMessage {
    /// Wrap a route advertisement
    pub fn conf(sender: NodeId, receiver: NodeId, msg: ConfMessage) -> Self {
        Self {
            sender: Some(sender),
            receiver,
            payload: Payload::Conf(msg),
        }
    }

    /// Wrap a user message
    pub fn data(sender: NodeId, receiver: NodeId, msg: Message) -> Self {
        Self {
            sender: Some(sender),
            receiver,
            payload: Payload::Data(msg),
        }
    }

    /// Stop request issued by the network
    pub fn stop(receiver: NodeId) -> Self {
        Self {
            sender: None,
            receiver,
            payload: Payload::Stop,
        }
    }

    pub fn kind(&self) -> MessageKind {
        self.payload.kind()
    }
}

impl Display for PhysicalMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.sender {
            Some(sender) => write!(f, "[phys: {} → {} : {}]", sender, self.receiver, self.kind()),
            None => write!(f, "[phys: network → {} : {}]", self.receiver, self.kind()),
        }
    }
}
