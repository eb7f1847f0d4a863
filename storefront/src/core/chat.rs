//! Chat gating for order rooms

use shared::{OrderStatus, Role};

use crate::error::{StorefrontError, StorefrontResult};
use crate::types::{Order, User};

pub const MAX_MESSAGE_CHARS: usize = 1000;

/// Customer of the order or its currently assigned shipper
pub fn is_participant(order: &Order, user: &User) -> bool {
    order.customer_id == user.id || order.shipper_id == Some(user.id)
}

/// History is readable once a shipper has been assigned, and stays readable
/// after the order finishes.
pub fn check_read(order: &Order, user: &User) -> StorefrontResult<()> {
    if !is_participant(order, user) && user.role != Role::Admin {
        return Err(StorefrontError::not_found("order", order.id));
    }
    if order.shipper_id.is_none() && order.shipped_at.is_none() {
        return Err(StorefrontError::ChatClosed { order_id: order.id });
    }
    Ok(())
}

/// Only participants may send, and only while the order is out for delivery
pub fn check_send(order: &Order, user: &User) -> StorefrontResult<()> {
    if !is_participant(order, user) {
        return if user.role == Role::Admin {
            Err(StorefrontError::forbidden("admins can read order chats but not post"))
        } else {
            Err(StorefrontError::not_found("order", order.id))
        };
    }
    if order.status != OrderStatus::Shipped || order.shipper_id.is_none() {
        return Err(StorefrontError::ChatClosed { order_id: order.id });
    }
    Ok(())
}

/// Trim and bound a message body
pub fn normalize_body(body: &str) -> StorefrontResult<String> {
    let body = body.trim();
    if body.is_empty() {
        return Err(StorefrontError::invalid("message must not be empty"));
    }
    if body.chars().count() > MAX_MESSAGE_CHARS {
        return Err(StorefrontError::invalid(format!(
            "message must be at most {MAX_MESSAGE_CHARS} characters"
        )));
    }
    Ok(body.to_string())
}
