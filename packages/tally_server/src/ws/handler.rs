//! WebSocket Handler
//!
//! Per-connection task: registers the participant, pumps inbound frames into
//! the hub and outbound status updates onto the socket, and leaves the
//! session exactly once when either direction ends.

use axum::{
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use tally_session::Participant;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info};

use crate::AppState;

/// Upgrade `GET /ws/{user_id}` to a session connection.
pub async fn ws_upgrade(
    ws: WebSocketUpgrade,
    Path(user_id): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_session_ws(socket, user_id, state))
}

/// Drive one participant connection until the client goes away.
pub async fn handle_session_ws(socket: WebSocket, user_id: String, state: AppState) {
    let (participant, mut outbound) =
        Participant::channel(user_id.clone(), state.config.send_channel_capacity);
    let conn_id = participant.connection_id;
    info!(participant = %user_id, conn_id = %conn_id, "New session WebSocket connection");

    state.metrics.connection_opened();
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let membership = state.hub.connect(participant).await;

    // Hub -> socket. Ends when the socket write fails or the hub drops our
    // sender (a newer connection took over this participant id).
    let metrics_out = state.metrics.clone();
    let sender_task = async move {
        loop {
            match outbound.recv().await {
                Ok(frame) => {
                    let text = Message::Text(frame.to_string().into());
                    if let Err(e) = ws_sender.send(text).await {
                        debug!(conn_id = %conn_id, "Peer gone before send: {}", e);
                        metrics_out.connection_dropped();
                        return;
                    }
                    metrics_out.message_sent();
                }
                Err(RecvError::Lagged(skipped)) => {
                    debug!(conn_id = %conn_id, skipped, "Slow connection skipped stale updates");
                    metrics_out.messages_skipped(skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
        debug!(conn_id = %conn_id, "Participant replaced by a newer connection");
        let _ = ws_sender.send(Message::Close(None)).await;
    };

    // Socket -> hub.
    let metrics_in = state.metrics.clone();
    let membership_ref = &membership;
    let input_task = async move {
        while let Some(msg) = ws_receiver.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    metrics_in.message_received();
                    match membership_ref.handle_text(text.as_str()).await {
                        Ok(outcome) => {
                            debug!(conn_id = %conn_id, ?outcome, "Handled client message");
                        }
                        Err(e) => {
                            metrics_in.message_malformed();
                            debug!(conn_id = %conn_id, "Ignoring client message: {}", e);
                        }
                    }
                }
                Ok(Message::Binary(_)) => {
                    debug!(conn_id = %conn_id, "Binary messages not supported");
                }
                Ok(Message::Close(_)) => {
                    debug!(conn_id = %conn_id, "Client closed connection");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    // Reset or closed without a handshake: an ordinary disconnect.
                    debug!(conn_id = %conn_id, "Connection dropped: {}", e);
                    metrics_in.connection_dropped();
                    break;
                }
            }
        }
    };

    tokio::select! {
        _ = sender_task => debug!(conn_id = %conn_id, "Sender task ended"),
        _ = input_task => debug!(conn_id = %conn_id, "Input task ended"),
    }

    membership.leave().await;
    state.metrics.connection_closed();
    info!(participant = %user_id, conn_id = %conn_id, "Session WebSocket connection closed");
}
