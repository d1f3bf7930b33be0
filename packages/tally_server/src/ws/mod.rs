//! Session WebSocket transport
//!
//! One WebSocket per participant at `/ws/{user_id}`. Inbound text frames are
//! handed to the `SessionHub`; status updates queued by the hub are written
//! back out.

mod handler;

pub use handler::{handle_session_ws, ws_upgrade};
