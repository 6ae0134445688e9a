use crate::{
    error::CampusPayError,
    handlers::AppState,
    middleware::AuthUser,
    services::AdminService,
};
use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::{IntoResponse, Response},
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::time::{interval, Duration};

/// Streams dashboard stats to staff once per second.
/// Authorization is checked before the upgrade headers.
pub async fn websocket_handler(
    user: AuthUser,
    State(state): State<AppState>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Result<Response, CampusPayError> {
    user.require_staff()?;
    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => return Ok(rejection.into_response()),
    };
    let admin = state.admin.clone();
    tracing::debug!(user_id = %user.id, "Dashboard stream opened");
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, admin)))
}

async fn handle_socket(socket: WebSocket, admin: Arc<AdminService>) {
    let (mut sender, mut receiver) = socket.split();

    let mut interval = interval(Duration::from_secs(1));

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let stats = admin.dashboard_stats().await;

                if let Ok(msg) = serde_json::to_string(&stats) {
                    if sender.send(Message::Text(msg)).await.is_err() {
                        break;
                    }
                }
            }

            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    tracing::debug!("Dashboard stream closed");
}
