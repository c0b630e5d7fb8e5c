//! WebSocket upgrade handler

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::game::session::{ConnectionId, JoinTicket, SessionError, SessionHandle};
use crate::util::rate_limit::ConnectionRateLimiter;
use crate::ws::protocol::{ClientMsg, ServerMsg};

type WsSink = futures::stream::SplitSink<WebSocket, Message>;
type WsStream = futures::stream::SplitStream<WebSocket>;

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let conn_id = Uuid::new_v4();
    debug!(conn_id = %conn_id, "New WebSocket connection");

    let (mut ws_sink, ws_stream) = socket.split();

    let ticket = match state.session.join(conn_id).await {
        Ok(ticket) => ticket,
        Err(SessionError::Full) => {
            info!(conn_id = %conn_id, "Session full, closing connection");
            let _ = send_msg(&mut ws_sink, &ServerMsg::Full).await;
            let _ = ws_sink.send(Message::Close(None)).await;
            return;
        }
        Err(e) => {
            error!(conn_id = %conn_id, error = %e, "Could not join session");
            return;
        }
    };

    let init = ServerMsg::Init {
        player_id: ticket.slot,
    };
    if let Err(e) = send_msg(&mut ws_sink, &init).await {
        debug!(conn_id = %conn_id, error = %e, "Failed to send init");
        let _ = state.session.leave(conn_id).await;
        return;
    }

    let limiter = ConnectionRateLimiter::new(state.config.input_rate_limit);
    run_connection(conn_id, ticket, ws_sink, ws_stream, &state.session, limiter).await;

    // Frees the slot and broadcasts the new player count
    if state.session.leave(conn_id).await.is_err() {
        warn!(conn_id = %conn_id, "Session stopped before leave");
    }

    info!(conn_id = %conn_id, "WebSocket connection closed");
}

/// Pump broadcasts out and inputs in until either side ends
async fn run_connection(
    conn_id: ConnectionId,
    ticket: JoinTicket,
    mut ws_sink: WsSink,
    mut ws_stream: WsStream,
    session: &SessionHandle,
    limiter: ConnectionRateLimiter,
) {
    let JoinTicket { slot, mut updates } = ticket;

    // Spawn writer task: session broadcasts -> WebSocket
    let writer_handle = tokio::spawn(async move {
        loop {
            match updates.recv().await {
                Ok(msg) => {
                    if let Err(e) = send_msg(&mut ws_sink, &msg).await {
                        debug!(conn_id = %conn_id, error = %e, "WebSocket send failed");
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(
                        conn_id = %conn_id,
                        lagged_count = n,
                        "Client lagged, skipping {} messages", n
                    );
                    // Continue - don't disconnect for lag
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!(conn_id = %conn_id, "Broadcast channel closed");
                    break;
                }
            }
        }
    });

    // Reader loop: WebSocket -> session
    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                if !limiter.check_input() {
                    debug!(conn_id = %conn_id, slot = %slot, "Rate limited input message");
                    continue;
                }

                match ClientMsg::parse(&text) {
                    Some(ClientMsg::Input(input)) => {
                        if session.input(conn_id, input).await.is_err() {
                            debug!(conn_id = %conn_id, "Session closed");
                            break;
                        }
                    }
                    Some(ClientMsg::Unknown) => {
                        debug!(conn_id = %conn_id, "Ignoring unrecognized message type");
                    }
                    None => {
                        debug!(conn_id = %conn_id, "Dropping malformed message");
                    }
                }
            }
            Ok(Message::Binary(_)) => {
                debug!(conn_id = %conn_id, "Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Ok(Message::Close(_)) => {
                debug!(conn_id = %conn_id, slot = %slot, "Client initiated close");
                break;
            }
            Err(e) => {
                debug!(conn_id = %conn_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    writer_handle.abort();
}

/// Send a message over WebSocket
async fn send_msg(sink: &mut WsSink, msg: &ServerMsg) -> Result<(), String> {
    let json = serde_json::to_string(msg).map_err(|e| e.to_string())?;
    sink.send(Message::Text(json)).await.map_err(|e| e.to_string())
}
