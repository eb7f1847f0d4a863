//! Order chat: history, posting and live room membership

use chrono::Utc;
use tokio::sync::mpsc;
use uuid::Uuid;

use shared::{ChatMessageView, HubEvent, OrderId, RoomKey};

use crate::core::chat;
use crate::error::{StorefrontError, StorefrontResult};
use crate::storefront_impl::Storefront;
use crate::types::{ChatDraft, Order, User};

const COMPONENT: &str = "chat";

impl Storefront {
    async fn chat_order(&self, order_id: OrderId) -> StorefrontResult<Order> {
        self.store
            .order(order_id)
            .await?
            .ok_or_else(|| StorefrontError::not_found("order", order_id))
    }

    async fn history_views(&self, order_id: OrderId) -> StorefrontResult<Vec<ChatMessageView>> {
        Ok(self
            .store
            .messages(order_id)
            .await?
            .into_iter()
            .map(ChatMessageView::from)
            .collect())
    }

    /// Whether `user` may open the order's room
    pub async fn check_chat_access(&self, user: &User, order_id: OrderId) -> StorefrontResult<()> {
        let order = self.chat_order(order_id).await?;
        chat::check_read(&order, user)
    }

    pub async fn chat_history(&self, user: &User, order_id: OrderId) -> StorefrontResult<Vec<ChatMessageView>> {
        let order = self.chat_order(order_id).await?;
        chat::check_read(&order, user)?;
        self.history_views(order_id).await
    }

    /// Persist a message and relay it to the order's room
    pub async fn post_message(&self, user: &User, order_id: OrderId, body: &str) -> StorefrontResult<ChatMessageView> {
        let _guard = self.chat_lock.lock().await;

        // Reloaded under the lock so a concurrent delivery closes the chat first
        let order = self.chat_order(order_id).await?;
        chat::check_send(&order, user)?;
        let body = chat::normalize_body(body)?;

        let message = self
            .store
            .append_message(ChatDraft {
                order_id,
                sender_id: user.id,
                sender_role: user.role,
                sender_name: user.full_name.clone(),
                body,
            })
            .await?;
        let view = ChatMessageView::from(message);

        let delivered = self
            .hub
            .publish(
                RoomKey::for_order(order_id),
                HubEvent::ChatMessage { message: view.clone() },
            )
            .await;
        shared::component_debug!(COMPONENT, "💬 Message {} in order {} reached {} clients", view.id, order_id, delivered);
        Ok(view)
    }

    /// Add a live client to the order's room and send it the ack and history.
    /// Nothing can be published to the room in between.
    pub async fn join_room(
        &self,
        user: &User,
        order_id: OrderId,
        client_id: Uuid,
        sender: mpsc::Sender<HubEvent>,
    ) -> StorefrontResult<RoomKey> {
        let _guard = self.chat_lock.lock().await;

        let order = self.chat_order(order_id).await?;
        chat::check_read(&order, user)?;
        let room = RoomKey::for_order(order_id);
        let messages = self.history_views(order_id).await?;

        self.hub.join(room, client_id, user.id, sender).await;
        self.hub
            .send_to(
                client_id,
                HubEvent::ConnectionAck {
                    session_id: client_id,
                    room,
                    server_time: Utc::now().timestamp(),
                },
            )
            .await?;
        self.hub.send_to(client_id, HubEvent::History { room, messages }).await?;

        shared::component_info!(COMPONENT, "🔌 User {} watching {}", user.id, room);
        Ok(room)
    }

    pub async fn leave_room(&self, room: RoomKey, client_id: Uuid) {
        self.hub.leave(room, client_id).await;
    }
}
