/// Errors surfaced by the session engine.
///
/// None of these reach clients: the protocol has no error channel, so the
/// transport logs them and keeps the connection open.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Inbound frame was not JSON, had an unknown `type`, or lacked the
    /// fields its `type` requires.
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    #[error("failed to encode status update: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Why a snapshot could not be queued for one recipient.
///
/// A full buffer is not an error: the oldest queued frame gives way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    /// The recipient's connection task has gone away.
    #[error("connection closed")]
    Closed,
}
