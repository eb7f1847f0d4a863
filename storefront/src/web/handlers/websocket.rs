//! WebSocket handler for order rooms
//!
//! One connection watches one order. Outgoing hub events are funnelled
//! through an mpsc channel registered with the chat hub; incoming frames are
//! `HubRequest`s handled in order.

use axum::{
    extract::{
        Path, State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
};
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use uuid::Uuid;

use shared::{HubEvent, HubRequest, OrderId, RoomKey, UserId};

use crate::error::StorefrontResult;
use crate::storefront_impl::Storefront;
use crate::types::User;
use crate::web::extract::CurrentUser;

const COMPONENT: &str = "websocket";

/// Outgoing events buffered per client before the hub starts dropping
const CLIENT_BUFFER: usize = 100;

/// `GET /ws/orders/:id`; access is checked before the upgrade
pub async fn order_room(
    ws: WebSocketUpgrade,
    State(storefront): State<Storefront>,
    CurrentUser(user): CurrentUser,
    Path(order_id): Path<OrderId>,
) -> StorefrontResult<Response> {
    storefront.check_chat_access(&user, order_id).await?;
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, storefront, user, order_id)))
}

async fn handle_socket(socket: WebSocket, storefront: Storefront, user: User, order_id: OrderId) {
    let client_id = Uuid::new_v4();
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::channel::<HubEvent>(CLIENT_BUFFER);

    let room = match storefront.join_room(&user, order_id, client_id, tx).await {
        Ok(room) => room,
        Err(e) => {
            shared::component_warn!(COMPONENT, "Client {} could not join order {}: {}", client_id, order_id, e);
            storefront.leave_room(RoomKey::for_order(order_id), client_id).await;
            let error = HubEvent::Error { message: e.to_string() };
            if let Ok(json) = serde_json::to_string(&error) {
                let _ = sink.send(Message::Text(json)).await;
            }
            let _ = sink.close().await;
            return;
        }
    };
    storefront.state().increment_connection_count();

    // Ends when the hub drops this client, e.g. after a reassignment
    let mut outgoing = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(e) => {
                    shared::component_error!(COMPONENT, "Failed to serialize hub event: {}", e);
                    continue;
                }
            };
            if let Err(e) = sink.send(Message::Text(json)).await {
                shared::component_debug!(COMPONENT, "Send to client {} failed: {}", client_id, e);
                return;
            }
        }
        let _ = sink.close().await;
    });

    let user_id = user.id;
    let incoming = async {
        while let Some(message) = stream.next().await {
            let message = match message {
                Ok(message) => message,
                Err(e) => {
                    shared::component_warn!(COMPONENT, "WebSocket error for client {}: {}", client_id, e);
                    break;
                }
            };

            match message {
                Message::Text(text) => {
                    let reply = match serde_json::from_str::<HubRequest>(&text) {
                        Ok(request) => handle_request(&storefront, user_id, room, request).await,
                        Err(e) => Some(HubEvent::Error {
                            message: format!("invalid request: {e}"),
                        }),
                    };
                    if let Some(reply) = reply {
                        if let Err(e) = storefront.hub.send_to(client_id, reply).await {
                            shared::component_warn!(COMPONENT, "Reply to client {} failed: {}", client_id, e);
                        }
                    }
                }
                Message::Binary(_) => {
                    shared::component_warn!(COMPONENT, "Binary frame from client {} ignored", client_id);
                }
                Message::Close(_) => break,
                // axum answers pings itself
                Message::Ping(_) | Message::Pong(_) => {}
            }
        }
    };

    tokio::select! {
        _ = &mut outgoing => {
            shared::component_info!(COMPONENT, "🚪 Client {} dropped from {} by the server", client_id, room);
        }
        _ = incoming => {}
    }

    outgoing.abort();
    storefront.leave_room(room, client_id).await;
    storefront.state().decrement_connection_count();
    shared::component_info!(COMPONENT, "👋 Client {} left {}", client_id, room);
}

/// Reply for the requesting client only; chat messages reach it through the room.
/// The user is reloaded per request so a lock or role change applies at once.
async fn handle_request(
    storefront: &Storefront,
    user_id: UserId,
    room: RoomKey,
    request: HubRequest,
) -> Option<HubEvent> {
    let user = match storefront.active_user(user_id).await {
        Ok(user) => user,
        Err(e) => return Some(HubEvent::Error { message: e.to_string() }),
    };
    let order_id = room.order_id();
    match request {
        HubRequest::Send { body } => match storefront.post_message(&user, order_id, &body).await {
            Ok(_) => None,
            Err(e) => Some(HubEvent::Error { message: e.to_string() }),
        },
        HubRequest::History => match storefront.chat_history(&user, order_id).await {
            Ok(messages) => Some(HubEvent::History { room, messages }),
            Err(e) => Some(HubEvent::Error { message: e.to_string() }),
        },
        HubRequest::Ping => Some(HubEvent::Pong {
            server_time: Utc::now().timestamp(),
        }),
    }
}
