//! Browser ↔ server realtime protocol for order rooms

use chrono::{DateTime, Utc};
use uuid::Uuid;
use serde::{Deserialize, Serialize};

use crate::types::{MessageId, OrderId, OrderStatus, Role, RoomKey, UserId};

/// Chat message as rendered to room participants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessageView {
    pub id: MessageId,
    pub order_id: OrderId,
    pub sender_id: UserId,
    pub sender_role: Role,
    pub sender_name: String,
    pub body: String,
    pub sent_at: DateTime<Utc>,
}

/// Server → browser events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HubEvent {
    ConnectionAck {
        session_id: Uuid,
        room: RoomKey,
        server_time: i64,
    },
    History {
        room: RoomKey,
        messages: Vec<ChatMessageView>,
    },
    ChatMessage {
        message: ChatMessageView,
    },
    StatusChanged {
        order_id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
        actor_role: Option<Role>,
        at: DateTime<Utc>,
    },
    ChatClosed {
        order_id: OrderId,
        reason: String,
    },
    Error {
        message: String,
    },
    Pong {
        server_time: i64,
    },
}

/// Browser → server requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HubRequest {
    Send { body: String },
    History,
    Ping,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_format() {
        let request: HubRequest = serde_json::from_str(r#"{"type":"send","body":"at the gate"}"#).unwrap();
        assert_eq!(request, HubRequest::Send { body: "at the gate".to_string() });

        let ping: HubRequest = serde_json::from_str(r#"{"type":"ping"}"#).unwrap();
        assert_eq!(ping, HubRequest::Ping);
    }

    #[test]
    fn test_status_changed_is_tagged() {
        let event = HubEvent::StatusChanged {
            order_id: OrderId(7),
            from: OrderStatus::Confirmed,
            to: OrderStatus::Shipped,
            actor_role: Some(Role::Admin),
            at: Utc::now(),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "status_changed");
        assert_eq!(json["order_id"], 7);
        assert_eq!(json["to"], "shipped");
    }
}
