//! Per-node message queues
//!
//! Every node owns the receiving half of an unbounded channel. The sending
//! halves live in a shared [`Mailboxes`] registry so any worker can enqueue
//! into any other node's queue without blocking.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::trace;

use adaptnet_core::{NodeId, PhysicalMessage};

use crate::error::{SimulationError, SimulationResult};

/// Registry of node queues, cheap to clone
#[derive(Debug, Clone, Default)]
pub struct Mailboxes {
    senders: Arc<DashMap<NodeId, mpsc::UnboundedSender<PhysicalMessage>>>,
}

impl Mailboxes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the queue for `node`, returning its receiving half
    ///
    /// Registering a node twice replaces its previous queue.
    pub fn register(&self, node: NodeId) -> mpsc::UnboundedReceiver<PhysicalMessage> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.senders.insert(node, tx);
        rx
    }

    /// Enqueue `message` into its receiver's queue
    pub fn send(&self, message: PhysicalMessage) -> SimulationResult<()> {
        let receiver = message.receiver;
        let sender = self
            .senders
            .get(&receiver)
            .ok_or(SimulationError::UnknownNode(receiver))?;
        sender
            .send(message)
            .map_err(|_| SimulationError::MailboxClosed(receiver))
    }

    /// Enqueue `message`, dropping it if the receiver is gone
    ///
    /// Returns whether the message was queued.
    pub fn post(&self, message: PhysicalMessage) -> bool {
        let kind = message.kind();
        match self.send(message) {
            Ok(()) => true,
            Err(e) => {
                trace!(%kind, error = %e, "Message dropped");
                false
            }
        }
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.senders.contains_key(&node)
    }

    pub fn len(&self) -> usize {
        self.senders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_and_receive() {
        let mailboxes = Mailboxes::new();
        let mut rx = mailboxes.register(NodeId(1));

        mailboxes.send(PhysicalMessage::stop(NodeId(1))).unwrap();
        let received = rx.try_recv().unwrap();
        assert_eq!(received, PhysicalMessage::stop(NodeId(1)));
        assert_eq!(mailboxes.len(), 1);
    }

    #[test]
    fn test_unknown_node() {
        let mailboxes = Mailboxes::new();
        let err = mailboxes.send(PhysicalMessage::stop(NodeId(9))).unwrap_err();
        assert!(matches!(err, SimulationError::UnknownNode(NodeId(9))));
        assert!(!mailboxes.post(PhysicalMessage::stop(NodeId(9))));
    }

    #[test]
    fn test_closed_mailbox() {
        let mailboxes = Mailboxes::new();
        let rx = mailboxes.register(NodeId(2));
        drop(rx);

        let err = mailboxes.send(PhysicalMessage::stop(NodeId(2))).unwrap_err();
        assert!(matches!(err, SimulationError::MailboxClosed(NodeId(2))));
    }

    #[test]
    fn test_clones_share_registry() {
        let mailboxes = Mailboxes::new();
        let clone = mailboxes.clone();
        let mut rx = clone.register(NodeId(0));

        assert!(mailboxes.contains(NodeId(0)));
        assert!(mailboxes.post(PhysicalMessage::stop(NodeId(0))));
        assert!(rx.try_recv().is_ok());
    }
}
