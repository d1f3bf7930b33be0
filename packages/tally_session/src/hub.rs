//! Session Hub
//!
//! Owns the participant registry and the `SessionState`, serializes every
//! mutation behind one lock, and fans a fresh snapshot out to all live
//! participants after each accepted change or membership change.
//!
//! Fan-out happens while the lock is still held, using a non-blocking send
//! into each recipient's ring buffer. Every participant therefore sees
//! snapshots in the same order the mutations were applied. A slow receiver
//! never stalls the mutation path; it skips older snapshots and still
//! catches up to the latest one.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::{DeliveryError, SessionError};
use crate::membership::Membership;
use crate::participant::{Frame, Participant};
use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::{SessionSnapshot, SessionState, VoteOutcome};

/// What an inbound message did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOutcome {
    OptionAdded,
    VoteApplied,
    /// Participant had already voted. No state change, no broadcast.
    VoteIgnored,
    Reordered,
}

impl MessageOutcome {
    /// Whether the message changed state (and so was broadcast).
    pub fn changed_state(self) -> bool {
        !matches!(self, MessageOutcome::VoteIgnored)
    }
}

/// Per-broadcast delivery tally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub recipients: usize,
    pub delivered: usize,
    /// Recipient connection already gone; its own teardown will `leave`.
    pub closed: usize,
}

/// Lifetime counters for the hub.
#[derive(Debug, Default)]
pub struct HubStats {
    pub broadcasts: AtomicU64,
    pub deliveries: AtomicU64,
    pub closed_deliveries: AtomicU64,
    pub encode_failures: AtomicU64,
    pub mutations: AtomicU64,
    pub ignored_votes: AtomicU64,
    pub joins: AtomicU64,
    pub leaves: AtomicU64,
}

impl HubStats {
    fn record_broadcast(&self, report: &BroadcastReport) {
        self.broadcasts.fetch_add(1, Ordering::Relaxed);
        self.deliveries
            .fetch_add(report.delivered as u64, Ordering::Relaxed);
        self.closed_deliveries
            .fetch_add(report.closed as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> HubStatsSnapshot {
        HubStatsSnapshot {
            broadcasts: self.broadcasts.load(Ordering::Relaxed),
            deliveries: self.deliveries.load(Ordering::Relaxed),
            closed_deliveries: self.closed_deliveries.load(Ordering::Relaxed),
            encode_failures: self.encode_failures.load(Ordering::Relaxed),
            mutations: self.mutations.load(Ordering::Relaxed),
            ignored_votes: self.ignored_votes.load(Ordering::Relaxed),
            joins: self.joins.load(Ordering::Relaxed),
            leaves: self.leaves.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of hub stats (for serialization/logging)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HubStatsSnapshot {
    pub broadcasts: u64,
    pub deliveries: u64,
    pub closed_deliveries: u64,
    pub encode_failures: u64,
    pub mutations: u64,
    pub ignored_votes: u64,
    pub joins: u64,
    pub leaves: u64,
}

/// Everything the lock protects: registry and session state together.
#[derive(Default)]
struct HubInner {
    state: SessionState,
    participants: HashMap<String, Participant>,
}

impl HubInner {
    fn snapshot(&self) -> SessionSnapshot {
        self.state.snapshot(self.participants.len())
    }
}

#[derive(Default)]
pub struct SessionHub {
    inner: Mutex<HubInner>,
    stats: HubStats,
}

impl SessionHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a participant and broadcast.
    ///
    /// An existing entry with the same id is replaced. Dropping its outbound
    /// sender is what tells the older connection it has been superseded.
    pub async fn join(&self, participant: Participant) -> BroadcastReport {
        let mut inner = self.inner.lock().await;
        let id = participant.id.clone();
        let conn_id = participant.connection_id;
        if let Some(previous) = inner.participants.insert(id.clone(), participant) {
            warn!(
                participant = %id,
                conn_id = %conn_id,
                replaced_conn_id = %previous.connection_id,
                "Participant id reused; newest connection wins"
            );
        }
        self.stats.joins.fetch_add(1, Ordering::Relaxed);
        info!(
            participant = %id,
            conn_id = %conn_id,
            active = inner.participants.len(),
            "Participant joined"
        );
        self.broadcast_locked(&inner)
    }

    /// Join and hand back a guard that guarantees the matching `leave`.
    pub async fn connect(self: &Arc<Self>, participant: Participant) -> Membership {
        let participant_id = participant.id.clone();
        let connection_id = participant.connection_id;
        self.join(participant).await;
        Membership::new(Arc::clone(self), participant_id, connection_id)
    }

    /// Remove a participant (if present) and broadcast either way.
    ///
    /// Votes already cast by the participant stay counted. Returns whether an
    /// entry was removed.
    pub async fn leave(&self, participant_id: &str) -> bool {
        let mut inner = self.inner.lock().await;
        let removed = inner.participants.remove(participant_id).is_some();
        self.finish_leave(&inner, participant_id, removed);
        removed
    }

    /// Like `leave`, but only removes the entry if it still belongs to
    /// `connection_id`. A connection that was superseded by a newer join with
    /// the same id leaves without evicting its successor.
    pub async fn leave_connection(&self, participant_id: &str, connection_id: Uuid) -> bool {
        let mut inner = self.inner.lock().await;
        let owned = inner
            .participants
            .get(participant_id)
            .is_some_and(|p| p.connection_id == connection_id);
        if owned {
            inner.participants.remove(participant_id);
        } else if inner.participants.contains_key(participant_id) {
            debug!(
                participant = %participant_id,
                conn_id = %connection_id,
                "Superseded connection left; keeping newer registration"
            );
        }
        self.finish_leave(&inner, participant_id, owned);
        owned
    }

    fn finish_leave(&self, inner: &HubInner, participant_id: &str, removed: bool) {
        self.stats.leaves.fetch_add(1, Ordering::Relaxed);
        if removed {
            info!(
                participant = %participant_id,
                active = inner.participants.len(),
                "Participant left"
            );
        } else {
            debug!(participant = %participant_id, "Leave for unregistered participant");
        }
        self.broadcast_locked(inner);
    }

    /// Apply one decoded message from `participant_id`.
    ///
    /// Every accepted mutation is followed by exactly one broadcast; a
    /// duplicate vote changes nothing and broadcasts nothing.
    pub async fn handle_message(
        &self,
        participant_id: &str,
        message: ClientMessage,
    ) -> MessageOutcome {
        let mut inner = self.inner.lock().await;
        let kind = message.kind();
        let outcome = match message {
            ClientMessage::AddOption { option } => {
                inner.state.add_option(option);
                MessageOutcome::OptionAdded
            }
            ClientMessage::Vote { option_id } => {
                match inner.state.cast_vote(participant_id, option_id) {
                    VoteOutcome::Applied => MessageOutcome::VoteApplied,
                    VoteOutcome::Ignored => MessageOutcome::VoteIgnored,
                }
            }
            ClientMessage::Reorder { options } => {
                inner.state.reorder_options(options);
                MessageOutcome::Reordered
            }
        };

        if outcome.changed_state() {
            self.stats.mutations.fetch_add(1, Ordering::Relaxed);
            debug!(participant = %participant_id, kind, ?outcome, "Applied message");
            self.broadcast_locked(&inner);
        } else {
            self.stats.ignored_votes.fetch_add(1, Ordering::Relaxed);
            debug!(participant = %participant_id, "Duplicate vote ignored");
        }
        outcome
    }

    /// Decode a raw text frame and apply it.
    pub async fn handle_text(
        &self,
        participant_id: &str,
        text: &str,
    ) -> Result<MessageOutcome, SessionError> {
        let message = ClientMessage::from_json(text)?;
        Ok(self.handle_message(participant_id, message).await)
    }

    /// Push the current snapshot to every registered participant.
    pub async fn broadcast_status(&self) -> BroadcastReport {
        let inner = self.inner.lock().await;
        self.broadcast_locked(&inner)
    }

    /// Current state without broadcasting.
    pub async fn snapshot(&self) -> SessionSnapshot {
        self.inner.lock().await.snapshot()
    }

    pub async fn participant_count(&self) -> usize {
        self.inner.lock().await.participants.len()
    }

    pub fn stats(&self) -> HubStatsSnapshot {
        self.stats.snapshot()
    }

    /// Serialize the snapshot once and queue it for each participant,
    /// isolating per-recipient failures.
    fn broadcast_locked(&self, inner: &HubInner) -> BroadcastReport {
        let message = ServerMessage::StatusUpdate {
            data: inner.snapshot(),
        };
        let frame: Frame = match message.to_json() {
            Ok(json) => Arc::from(json),
            Err(e) => {
                self.stats.encode_failures.fetch_add(1, Ordering::Relaxed);
                error!("Failed to encode status update: {}", e);
                return BroadcastReport::default();
            }
        };

        let mut report = BroadcastReport {
            recipients: inner.participants.len(),
            ..Default::default()
        };
        for participant in inner.participants.values() {
            match participant.deliver(Arc::clone(&frame)) {
                Ok(()) => report.delivered += 1,
                Err(DeliveryError::Closed) => {
                    report.closed += 1;
                    debug!(
                        participant = %participant.id,
                        conn_id = %participant.connection_id,
                        "Connection closed before status update"
                    );
                }
            }
        }
        self.stats.record_broadcast(&report);
        debug!(
            recipients = report.recipients,
            delivered = report.delivered,
            "Broadcast status"
        );
        report
    }
}
