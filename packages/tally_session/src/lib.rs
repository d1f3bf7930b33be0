//! Tally Session - shared voting state with live snapshot fan-out
//!
//! This crate holds the authoritative state of one collaborative voting
//! session (participants, an ordered option list, one vote per participant)
//! and pushes a full `STATUS_UPDATE` snapshot to every participant after each
//! change. It has no transport dependencies: callers hand it decoded frames
//! and drain each participant's outbound channel themselves.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tally_session::{Participant, SessionHub};
//!
//! #[tokio::main]
//! async fn main() {
//!     let hub = Arc::new(SessionHub::new());
//!
//!     let (participant, mut outbound) = Participant::channel("u1", 64);
//!     let membership = hub.connect(participant).await;
//!
//!     membership
//!         .handle_text(r#"{"type":"ADD_OPTION","option":{"label":"Pizza"}}"#)
//!         .await
//!         .unwrap();
//!
//!     while let Ok(frame) = outbound.try_recv() {
//!         println!("{}", frame);
//!     }
//!
//!     membership.leave().await;
//! }
//! ```

mod error;
pub mod hub;
mod membership;
pub mod option;
mod participant;
pub mod protocol;
pub mod state;

pub use error::{DeliveryError, SessionError};
pub use hub::{BroadcastReport, HubStatsSnapshot, MessageOutcome, SessionHub};
pub use membership::Membership;
pub use option::{OptionId, VoteOption};
pub use participant::{Frame, Participant};
pub use protocol::{ClientMessage, ServerMessage};
pub use state::{SessionSnapshot, SessionState, VoteOutcome};
