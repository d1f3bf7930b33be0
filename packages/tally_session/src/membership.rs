//! Scoped participant membership.
//!
//! A `Membership` is handed out by `SessionHub::connect` and must end in
//! exactly one `leave`. Call `leave().await` on the normal path; if the guard
//! is dropped instead (early return, panic, cancelled task) the leave is
//! spawned onto the current runtime.

use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::SessionError;
use crate::hub::{MessageOutcome, SessionHub};

pub struct Membership {
    hub: Arc<SessionHub>,
    participant_id: String,
    connection_id: Uuid,
    released: bool,
}

impl Membership {
    pub(crate) fn new(hub: Arc<SessionHub>, participant_id: String, connection_id: Uuid) -> Self {
        Self {
            hub,
            participant_id,
            connection_id,
            released: false,
        }
    }

    pub fn participant_id(&self) -> &str {
        &self.participant_id
    }

    pub fn connection_id(&self) -> Uuid {
        self.connection_id
    }

    /// Apply an inbound text frame on behalf of this participant.
    pub async fn handle_text(&self, text: &str) -> Result<MessageOutcome, SessionError> {
        self.hub.handle_text(&self.participant_id, text).await
    }

    /// Leave the session and broadcast the new membership.
    pub async fn leave(mut self) {
        self.released = true;
        self.hub
            .leave_connection(&self.participant_id, self.connection_id)
            .await;
    }
}

impl Drop for Membership {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        let hub = Arc::clone(&self.hub);
        let participant_id = std::mem::take(&mut self.participant_id);
        let connection_id = self.connection_id;
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                debug!(
                    participant = %participant_id,
                    conn_id = %connection_id,
                    "Membership dropped, leaving in background"
                );
                handle.spawn(async move {
                    hub.leave_connection(&participant_id, connection_id).await;
                });
            }
            Err(_) => {
                warn!(
                    participant = %participant_id,
                    "Membership dropped outside a runtime; participant not removed"
                );
            }
        }
    }
}
