//! Session State
//!
//! The authoritative in-memory model: ordered option list and vote registry.
//! Holds no locks and knows nothing about connections; `SessionHub` owns it
//! and serializes every call.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::option::{OptionId, VoteOption};

/// Result of a vote attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    /// First vote from this participant; recorded.
    Applied,
    /// The participant already voted; nothing changed.
    Ignored,
}

impl VoteOutcome {
    pub fn is_applied(self) -> bool {
        matches!(self, VoteOutcome::Applied)
    }
}

/// Immutable copy of session state, the `data` of a `STATUS_UPDATE`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub options: Vec<VoteOption>,
    pub total_votes: usize,
    pub active_users: usize,
}

#[derive(Debug, Default)]
pub struct SessionState {
    options: Vec<VoteOption>,
    /// participant id -> chosen option. Never shrinks.
    votes: HashMap<String, OptionId>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append to the end of the option list. Duplicates are allowed.
    pub fn add_option(&mut self, option: VoteOption) {
        self.options.push(option);
    }

    /// Replace the whole option list with `options`, verbatim.
    ///
    /// The new list is not checked against the old one: it may drop,
    /// duplicate or introduce options.
    pub fn reorder_options(&mut self, options: Vec<VoteOption>) {
        self.options = options;
    }

    /// Record `option_id` as the participant's vote unless they already voted.
    ///
    /// `option_id` is not checked against the option list.
    pub fn cast_vote(&mut self, participant_id: &str, option_id: OptionId) -> VoteOutcome {
        if self.votes.contains_key(participant_id) {
            return VoteOutcome::Ignored;
        }
        self.votes.insert(participant_id.to_string(), option_id);
        VoteOutcome::Applied
    }

    /// Copy the current state out. `active_users` comes from the caller,
    /// since participant membership lives in the hub.
    pub fn snapshot(&self, active_users: usize) -> SessionSnapshot {
        SessionSnapshot {
            options: self.options.clone(),
            total_votes: self.votes.len(),
            active_users,
        }
    }

    pub fn options(&self) -> &[VoteOption] {
        &self.options
    }

    pub fn vote_of(&self, participant_id: &str) -> Option<&OptionId> {
        self.votes.get(participant_id)
    }

    pub fn total_votes(&self) -> usize {
        self.votes.len()
    }
}
