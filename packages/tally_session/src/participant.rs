use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::error::DeliveryError;

/// Encoded frame queued for a participant. Shared so one serialization
/// serves every recipient of a broadcast.
pub type Frame = Arc<str>;

/// A connected client as seen by the hub: its id plus the handle used to
/// push snapshots to its connection task.
///
/// The outbound buffer is a bounded ring: when it is full the oldest queued
/// frame is overwritten, and the reader sees `Lagged` before resuming at the
/// oldest frame still held. A slow reader therefore always ends on the most
/// recent snapshot.
#[derive(Debug, Clone)]
pub struct Participant {
    pub id: String,
    /// Unique per connection, even when two connections claim the same id.
    pub connection_id: Uuid,
    outbound: broadcast::Sender<Frame>,
}

impl Participant {
    pub fn new(id: impl Into<String>, outbound: broadcast::Sender<Frame>) -> Self {
        Self {
            id: id.into(),
            connection_id: Uuid::new_v4(),
            outbound,
        }
    }

    /// Create a participant together with the receiving end of its outbound
    /// buffer. `capacity` must be non-zero.
    pub fn channel(
        id: impl Into<String>,
        capacity: usize,
    ) -> (Self, broadcast::Receiver<Frame>) {
        let (tx, rx) = broadcast::channel(capacity);
        (Self::new(id, tx), rx)
    }

    /// Queue a frame without waiting, overwriting the oldest one if the
    /// buffer is full.
    pub fn deliver(&self, frame: Frame) -> Result<(), DeliveryError> {
        self.outbound
            .send(frame)
            .map(|_| ())
            .map_err(|_| DeliveryError::Closed)
    }

    pub fn is_closed(&self) -> bool {
        self.outbound.receiver_count() == 0
    }
}
