//! Realtime room relay
//!
//! Tracks the outbound channel of every WebSocket client, grouped by the order
//! room it joined, and fans events out to a room. Each client remembers the
//! user behind it so a user who loses access can be dropped.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

use shared::{HubEvent, RoomKey, UserId};

use crate::error::{StorefrontError, StorefrontResult};
use crate::traits::ChatHub;

const COMPONENT: &str = "chat-hub";

/// WebSocket client connection info
#[derive(Debug)]
struct ClientConnection {
    sender: mpsc::Sender<HubEvent>,
    user_id: UserId,
    #[allow(dead_code)]
    joined_at: DateTime<Utc>,
}

type Rooms = HashMap<RoomKey, HashMap<Uuid, ClientConnection>>;

/// Real chat hub implementation
#[derive(Clone, Default)]
pub struct RealChatHub {
    rooms: Arc<RwLock<Rooms>>,
}

impl RealChatHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn remove_clients(rooms: &mut Rooms, room: RoomKey, client_ids: &[Uuid]) {
        if let Some(clients) = rooms.get_mut(&room) {
            for client_id in client_ids {
                if clients.remove(client_id).is_some() {
                    shared::component_info!(COMPONENT, "🗑️ Removed disconnected client {} from {}", client_id, room);
                }
            }
            if clients.is_empty() {
                rooms.remove(&room);
            }
        }
    }
}

#[async_trait]
impl ChatHub for RealChatHub {
    async fn join(&self, room: RoomKey, client_id: Uuid, user_id: UserId, sender: mpsc::Sender<HubEvent>) {
        let connection = ClientConnection {
            sender,
            user_id,
            joined_at: Utc::now(),
        };
        self.rooms
            .write()
            .await
            .entry(room)
            .or_default()
            .insert(client_id, connection);

        shared::component_info!(COMPONENT, "👋 Client {} (user {}) joined {}", client_id, user_id, room);
    }

    async fn leave(&self, room: RoomKey, client_id: Uuid) {
        let mut rooms = self.rooms.write().await;
        let Some(clients) = rooms.get_mut(&room) else {
            return;
        };
        if clients.remove(&client_id).is_some() {
            shared::component_info!(COMPONENT, "👋 Client {} left {}", client_id, room);
        }
        if clients.is_empty() {
            rooms.remove(&room);
        }
    }

    async fn publish(&self, room: RoomKey, event: HubEvent) -> usize {
        // Clone the senders so the lock is not held while sending
        let senders = {
            let rooms = self.rooms.read().await;
            match rooms.get(&room) {
                Some(clients) => clients
                    .iter()
                    .map(|(client_id, connection)| (*client_id, connection.sender.clone()))
                    .collect::<Vec<_>>(),
                None => return 0,
            }
        };

        let mut closed = Vec::new();
        let mut delivered = 0;

        for (client_id, sender) in senders {
            match sender.try_send(event.clone()) {
                Ok(_) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    shared::component_warn!(COMPONENT, "Client {} channel full, dropping message", client_id);
                }
                Err(TrySendError::Closed(_)) => closed.push(client_id),
            }
        }

        if !closed.is_empty() {
            let mut rooms = self.rooms.write().await;
            Self::remove_clients(&mut rooms, room, &closed);
        }

        shared::component_debug!(COMPONENT, "📡 Published to {}/{} clients in {}", delivered, delivered + closed.len(), room);
        delivered
    }

    async fn send_to(&self, client_id: Uuid, event: HubEvent) -> StorefrontResult<()> {
        let found = {
            let rooms = self.rooms.read().await;
            rooms.iter().find_map(|(room, clients)| {
                clients
                    .get(&client_id)
                    .map(|connection| (*room, connection.sender.clone()))
            })
        };

        let Some((room, sender)) = found else {
            return Err(StorefrontError::not_found("client", client_id));
        };

        match sender.try_send(event) {
            Ok(_) => Ok(()),
            Err(TrySendError::Full(_)) => Err(StorefrontError::internal(format!("client {client_id} channel full"))),
            Err(TrySendError::Closed(_)) => {
                let mut rooms = self.rooms.write().await;
                Self::remove_clients(&mut rooms, room, &[client_id]);
                Err(StorefrontError::not_found("client", client_id))
            }
        }
    }

    async fn room_size(&self, room: RoomKey) -> usize {
        self.rooms.read().await.get(&room).map_or(0, HashMap::len)
    }

    async fn client_count(&self) -> usize {
        self.rooms.read().await.values().map(HashMap::len).sum()
    }

    async fn rooms(&self) -> Vec<RoomKey> {
        let mut rooms: Vec<RoomKey> = self.rooms.read().await.keys().copied().collect();
        rooms.sort();
        rooms
    }

    async fn sweep_closed(&self) -> usize {
        let mut rooms = self.rooms.write().await;
        let mut removed = 0;
        rooms.retain(|_, clients| {
            let before = clients.len();
            clients.retain(|_, connection| !connection.sender.is_closed());
            removed += before - clients.len();
            !clients.is_empty()
        });

        if removed > 0 {
            shared::component_info!(COMPONENT, "🧹 Cleaned up {} disconnected clients", removed);
        }
        removed
    }

    async fn evict(&self, user_id: UserId, room: Option<RoomKey>, farewell: HubEvent) -> usize {
        let mut rooms = self.rooms.write().await;
        let mut evicted = 0;
        rooms.retain(|key, clients| {
            if room.is_some_and(|room| room != *key) {
                return true;
            }
            clients.retain(|client_id, connection| {
                if connection.user_id != user_id {
                    return true;
                }
                // Dropping the hub's sender ends the client's outbound stream
                // once the farewell is delivered
                if let Err(e) = connection.sender.try_send(farewell.clone()) {
                    shared::component_debug!(COMPONENT, "Farewell to client {} not sent: {}", client_id, e);
                }
                shared::component_info!(COMPONENT, "🚪 Evicted client {} (user {}) from {}", client_id, user_id, key);
                evicted += 1;
                false
            });
            !clients.is_empty()
        });
        evicted
    }
}
