use crate::relay::SignalingService;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tincan_core::ParticipantId;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

pub struct AppState {
    pub service: SignalingService,
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(participant_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let Ok(id) = Uuid::parse_str(&participant_id) else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    let id = ParticipantId(id);

    ws.on_upgrade(move |socket| handle_socket(socket, id, state.service.clone()))
        .into_response()
}

async fn handle_socket(socket: WebSocket, id: ParticipantId, service: SignalingService) {
    info!(%id, "new signaling connection");

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    service.connect(id.clone(), tx);

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let service = service.clone();
        let id = id.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => match serde_json::from_str(text.as_str()) {
                        Ok(signal) => service.handle_message(&id, signal),
                        Err(e) => warn!(%id, "invalid signal message: {e}"),
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    service.handle_disconnect(&id);
    info!(%id, "signaling connection closed");
}
