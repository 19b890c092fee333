//! Run orchestration and convergence detection
//!
//! [`Network::run`] launches one task per node, waits until a whole idle
//! window passes without any node processing a message, optionally injects
//! user traffic and waits again, then stops every node and collects a
//! [`SimulationReport`].
//!
//! The idle window is a heuristic: a slow worker can still hold an
//! unprocessed CONF when STOP is sent. The report exposes this through
//! [`SimulationReport::is_consistent`] instead of failing the run.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use tokio::task::JoinSet;
use tracing::{Instrument, info, info_span, warn};

use adaptnet_core::{FunctionAssignment, Message, NetworkTopology, NodeId, PhysicalMessage};
use adaptnet_logging::spans;

use crate::config::NetworkConfig;
use crate::error::{SimulationError, SimulationResult};
use crate::mailboxes::Mailboxes;
use crate::node::Node;
use crate::report::{NodeReport, SimulationReport};

/// A network of routing agents ready to run
pub struct Network {
    topology: Arc<dyn NetworkTopology>,
    assignment: Arc<dyn FunctionAssignment>,
    config: NetworkConfig,
    scheduled: Vec<Message>,
}

impl Network {
    pub fn new(
        topology: impl NetworkTopology + 'static,
        assignment: impl FunctionAssignment + 'static,
        config: NetworkConfig,
    ) -> Self {
        Self {
            topology: Arc::new(topology),
            assignment: Arc::new(assignment),
            config,
            scheduled: Vec::new(),
        }
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// Queue a user message to be sent from its source once routes converged
    pub fn schedule_message(&mut self, message: Message) {
        self.scheduled.push(message);
    }

    /// Run until convergence and return the final state of every node
    pub async fn run(self) -> SimulationResult<SimulationReport> {
        let nodes = self.topology.nodes();
        let span = info_span!(spans::NETWORK_RUN, nodes = nodes.len());
        self.run_inner(nodes).instrument(span).await
    }

    async fn run_inner(mut self, nodes: Vec<NodeId>) -> SimulationResult<SimulationReport> {
        if nodes.is_empty() {
            return Err(SimulationError::EmptyNetwork);
        }

        let scheduled = std::mem::take(&mut self.scheduled);
        if let Some(message) = scheduled.iter().find(|m| !nodes.contains(&m.source)) {
            return Err(SimulationError::UnknownNode(message.source));
        }

        // every queue exists before any node advertises
        let mailboxes = Mailboxes::new();
        let inboxes: Vec<_> = nodes
            .iter()
            .map(|id| (*id, mailboxes.register(*id)))
            .collect();

        let activity = Arc::new(AtomicBool::new(true));
        let start = Instant::now();
        info!(
            nodes = nodes.len(),
            max_stack = self.config.max_stack,
            idle_ms = self.config.idle_timeout.as_millis() as u64,
            "Network started"
        );

        let mut workers = JoinSet::new();
        for (id, inbox) in inboxes {
            let node = Node::new(
                id,
                self.assignment.functions_of(id),
                Arc::clone(&self.topology),
                mailboxes.clone(),
                self.config.max_stack,
            );
            let span = info_span!(spans::NODE_WORKER, node = %id);
            workers.spawn(
                node.run(inbox, Arc::clone(&activity), self.config.receive_timeout)
                    .instrument(span),
            );
        }

        let mut converged = wait_for_idle(&activity, &self.config, start).await;
        let convergence_time = start.elapsed().saturating_sub(self.config.idle_timeout);
        info!(
            elapsed_ms = convergence_time.as_millis() as u64,
            converged, "Convergence detected"
        );

        if !scheduled.is_empty() {
            info!(messages = scheduled.len(), "Injecting user messages");
            for message in scheduled {
                let source = message.source;
                mailboxes.send(PhysicalMessage::data(source, source, message))?;
            }
            activity.store(true, Ordering::Release);
            converged &= wait_for_idle(&activity, &self.config, start).await;
        }

        info!("Broadcasting STOP");
        for id in &nodes {
            if let Err(e) = mailboxes.send(PhysicalMessage::stop(*id)) {
                warn!(node = %id, error = %e, "STOP not delivered");
            }
        }

        let mut reports = Vec::with_capacity(nodes.len());
        while let Some(joined) = workers.join_next().await {
            let node = joined.map_err(|e| SimulationError::WorkerFailed(e.to_string()))?;
            reports.push(NodeReport::from(node));
        }

        let report = SimulationReport::new(reports, convergence_time, start.elapsed(), converged);
        if !report.is_consistent() {
            warn!(
                conf_sent = report.totals.conf_sent,
                conf_received = report.totals.conf_received,
                "CONF counters disagree after shutdown"
            );
        }
        info!(
            duration_ms = report.duration.as_millis() as u64,
            conf_sent = report.totals.conf_sent,
            reachability = report.reachability(),
            "Network stopped"
        );
        Ok(report)
    }
}

/// Sleep in idle windows until one passes with no activity
///
/// Returns false if the maximum duration ran out first.
async fn wait_for_idle(activity: &AtomicBool, config: &NetworkConfig, start: Instant) -> bool {
    loop {
        activity.store(false, Ordering::Release);
        tokio::time::sleep(config.idle_timeout).await;
        if !activity.load(Ordering::Acquire) {
            return true;
        }
        if config.max_duration.is_some_and(|max| start.elapsed() >= max) {
            warn!(
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Maximum duration reached before convergence"
            );
            return false;
        }
    }
}
