//! WebSocket upgrade handler

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::game::{GameCommand, Outbound, PlayerId};
use crate::ws::protocol::{ClientMsg, ServerMsg};

#[derive(Debug, thiserror::Error)]
enum SendError {
    #[error("encode failed: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("socket closed: {0}")]
    Socket(#[from] axum::Error),
}

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let player_id = Uuid::new_v4().to_string();
    info!(player_id = %player_id, "New WebSocket connection");

    let (ws_sink, ws_stream) = socket.split();

    // Register and subscribe before joining so the init and every later
    // broadcast reach this client
    let direct_rx = state.sessions.register(player_id.clone());
    let events_rx = state.arena.subscribe();

    let join = GameCommand::Join {
        player_id: player_id.clone(),
    };
    if state.arena.send(join).await.is_err() {
        error!(player_id = %player_id, "Arena is not running");
        state.sessions.unregister(&player_id);
        return;
    }

    run_session(&player_id, &state, ws_sink, ws_stream, direct_rx, events_rx).await;

    // Cleanup on disconnect
    state.sessions.unregister(&player_id);
    let leave = GameCommand::Leave {
        player_id: player_id.clone(),
    };
    if state.arena.send(leave).await.is_err() {
        debug!(player_id = %player_id, "Arena gone before leave");
    }

    info!(player_id = %player_id, "WebSocket connection closed");
    if state.sessions.is_empty() {
        debug!("No clients connected");
    }
}

/// Run the WebSocket session with read/write split
async fn run_session(
    player_id: &PlayerId,
    state: &AppState,
    mut ws_sink: SplitSink<WebSocket, Message>,
    mut ws_stream: SplitStream<WebSocket>,
    mut direct_rx: mpsc::Receiver<ServerMsg>,
    mut events_rx: broadcast::Receiver<Outbound>,
) {
    // Writer task: direct + broadcast -> WebSocket
    let writer_id = player_id.clone();
    let writer_handle = tokio::spawn(async move {
        loop {
            let msg = tokio::select! {
                // Direct messages first so `init` precedes the broadcasts after it
                biased;

                direct = direct_rx.recv() => match direct {
                    Some(msg) => msg,
                    None => break,
                },
                event = events_rx.recv() => match event {
                    Ok(event) if event.is_for(&writer_id) => event.msg,
                    Ok(_) => continue,
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(player_id = %writer_id, lagged_count = n, "Client lagged, skipping events");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!(player_id = %writer_id, "Event channel closed");
                        break;
                    }
                },
            };

            if let Err(e) = send_msg(&mut ws_sink, &msg).await {
                debug!(player_id = %writer_id, error = %e, "WebSocket send failed");
                break;
            }
        }
    });

    // Reader loop: WebSocket -> arena
    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMsg>(&text) {
                Ok(msg) => {
                    let command = GameCommand::Client {
                        player_id: player_id.clone(),
                        msg,
                    };
                    if state.arena.send(command).await.is_err() {
                        debug!(player_id = %player_id, "Command channel closed");
                        break;
                    }
                }
                Err(e) => {
                    warn!(player_id = %player_id, error = %e, "Failed to parse client message");
                    state.sessions.send_to(
                        player_id,
                        ServerMsg::Error {
                            code: "bad_message".to_string(),
                            message: e.to_string(),
                        },
                    );
                }
            },
            Ok(Message::Binary(_)) => {
                warn!(player_id = %player_id, "Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Ok(Message::Close(_)) => {
                info!(player_id = %player_id, "Client initiated close");
                break;
            }
            Err(e) => {
                error!(player_id = %player_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    writer_handle.abort();
}

/// Send a message over WebSocket
async fn send_msg(sink: &mut SplitSink<WebSocket, Message>, msg: &ServerMsg) -> Result<(), SendError> {
    let json = serde_json::to_string(msg)?;
    sink.send(Message::Text(json)).await?;
    Ok(())
}
