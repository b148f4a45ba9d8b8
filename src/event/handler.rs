use axum::extract::ws::Message::{Close, Text};
use axum::extract::ws::WebSocket;
use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;
use log::{debug, error, warn};
use serde_json::from_str;

use super::model::{Action, Frame, Presence};
use crate::{auth, user};

pub async fn ws(
    ws: WebSocketUpgrade,
    State(auth_service): State<auth::Service>,
    State(user_service): State<user::Service>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, auth_service, user_service))
}

async fn handle_socket(mut ws: WebSocket, auth_service: auth::Service, user_service: user::Service) {
    let mut presence = Presence::default();

    while let Some(frame) = ws.recv().await {
        match frame {
            Err(e) => {
                error!("Failed to read WS frame: {e}");
                break;
            }
            Ok(Close(frame)) => {
                debug!("WS connection closed by client: {frame:?}");
                break;
            }
            Ok(Text(content)) => {
                if let Err(e) =
                    handle_text_frame(&mut presence, content.as_str(), &auth_service, &user_service)
                        .await
                {
                    warn!("Closing WS connection: {e}");
                    if let Err(e) = ws.send(Close(None)).await {
                        error!("Failed to close WS connection: {e}");
                    }
                    break;
                }
            }
            Ok(other) => debug!("Skipping non-text WS frame: {other:?}"),
        }
    }

    for id in presence.drain() {
        if let Err(e) = user_service.set_online(id, false).await {
            error!("Failed to set {id} offline: {e}");
        }
    }
}

async fn handle_text_frame(
    presence: &mut Presence,
    content: &str,
    auth_service: &auth::Service,
    user_service: &user::Service,
) -> super::Result<()> {
    let Ok(frame) = from_str::<Frame>(content) else {
        warn!("Skipping text frame, content is malformed: {content}");
        return Ok(());
    };

    let id = auth_service.validate(&frame.token).await?;
    user_service
        .set_online(id, frame.action == Action::SetOnline)
        .await?;
    presence.apply(id, frame.action);

    Ok(())
}
