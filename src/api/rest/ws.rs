use std::sync::Arc;

use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use futures::SinkExt;
use futures::StreamExt;
use serde::Deserialize;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{info, warn};

use crate::state::AppState;
use crate::store::StoreError;

// Application close codes, picked out of the 4000-4999 private range.
const CLOSE_UNKNOWN_CODE: u16 = 4404;
const CLOSE_SUPERSEDED: u16 = 4409;

#[derive(Deserialize)]
pub struct WatchQuery {
    pub code: String,
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WatchQuery>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, query.code))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, code: String) {
    let (mut sender, mut receiver) = socket.split();

    let (watcher_id, rx) = match state.relay.register_watcher(&code).await {
        Ok(registration) => registration,
        Err(StoreError::NotFound(_)) => {
            let _ = sender
                .send(Message::Close(Some(CloseFrame {
                    code: CLOSE_UNKNOWN_CODE,
                    reason: "no matching service request".into(),
                })))
                .await;
            return;
        }
        Err(err) => {
            warn!(code = %code, error = %err, "failed to register watcher");
            let _ = sender.close().await;
            return;
        }
    };

    info!(code = %code, "tracking watcher connected");

    let mut updates = ReceiverStream::new(rx);
    loop {
        tokio::select! {
            update = updates.next() => match update {
                Some(message) => {
                    let json = match serde_json::to_string(&message) {
                        Ok(json) => json,
                        Err(err) => {
                            warn!(error = %err, "failed to serialize tracking message");
                            continue;
                        }
                    };

                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                // The relay dropped our sender: a newer watcher took over
                // this code.
                None => {
                    let _ = sender
                        .send(Message::Close(Some(CloseFrame {
                            code: CLOSE_SUPERSEDED,
                            reason: "superseded by a newer watcher".into(),
                        })))
                        .await;
                    break;
                }
            },
            inbound = receiver.next() => match inbound {
                Some(Ok(_)) => {}
                Some(Err(_)) | None => break,
            },
        }
    }

    state.relay.unregister_watcher(&code, watcher_id);
    info!(code = %code, "tracking watcher disconnected");
}
