//! Order status state machine
//!
//! ```text
//! Pending ──confirm──▶ Confirmed ──assign shipper──▶ Shipped ──delivered──▶ Completed
//!    │                     │                            │
//!    └──────cancel─────────┴──────────cancel            └──delivery failed──▶ Cancelled
//! ```
//!
//! `plan` validates an action against the current order and actor without
//! touching anything; `apply` produces the updated order. Committing is the
//! store's job (compare-and-set on the status the plan started from).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::{OrderStatus, PaymentMethod, PaymentStatus, Role, UserId};
use std::fmt;

use crate::error::{StorefrontError, StorefrontResult};
use crate::types::{Order, OrderEvent, User};

/// Who performs a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    User { id: UserId, role: Role },
    /// Payment gateway callbacks and other unattended paths
    System,
}

impl Actor {
    pub fn user(user: &User) -> Self {
        Actor::User {
            id: user.id,
            role: user.role,
        }
    }

    pub fn id(&self) -> Option<UserId> {
        match self {
            Actor::User { id, .. } => Some(*id),
            Actor::System => None,
        }
    }

    pub fn role(&self) -> Option<Role> {
        match self {
            Actor::User { role, .. } => Some(*role),
            Actor::System => None,
        }
    }

    fn is_admin(&self) -> bool {
        self.role() == Some(Role::Admin)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum OrderAction {
    Confirm,
    AssignShipper { shipper_id: UserId },
    MarkDelivered,
    DeliveryFailed { reason: String },
    Cancel { reason: String },
}

impl fmt::Display for OrderAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OrderAction::Confirm => "confirm",
            OrderAction::AssignShipper { .. } => "assign a shipper to",
            OrderAction::MarkDelivered => "mark delivered",
            OrderAction::DeliveryFailed { .. } => "report failed delivery for",
            OrderAction::Cancel { .. } => "cancel",
        };
        write!(f, "{name}")
    }
}

/// What a transition does to the order's chat room
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatEffect {
    Unchanged,
    Open,
    Close,
}

/// Validated outcome of an action
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub restock: bool,
    pub payment_status: Option<PaymentStatus>,
    pub shipper_id: Option<UserId>,
    pub chat: ChatEffect,
    pub note: Option<String>,
}

impl Transition {
    fn to(from: OrderStatus, to: OrderStatus) -> Self {
        Self {
            from,
            to,
            restock: false,
            payment_status: None,
            shipper_id: None,
            chat: ChatEffect::Unchanged,
            note: None,
        }
    }

    pub fn changes_status(&self) -> bool {
        self.from != self.to
    }
}

/// Validate `action` on `order` for `actor`
pub fn plan(order: &Order, actor: &Actor, action: &OrderAction) -> StorefrontResult<Transition> {
    use OrderStatus::*;

    let from = order.status;
    let invalid = || StorefrontError::InvalidTransition {
        from,
        action: action.to_string(),
    };

    match action {
        OrderAction::Confirm => {
            require_admin(actor)?;
            if from != Pending {
                return Err(invalid());
            }
            if order.payment_method == PaymentMethod::Online && order.payment_status != PaymentStatus::Paid {
                return Err(StorefrontError::Payment {
                    details: format!("order {} has not been paid online yet", order.id),
                });
            }
            Ok(Transition::to(from, Confirmed))
        }

        OrderAction::AssignShipper { shipper_id } => {
            require_admin(actor)?;
            let mut transition = match from {
                Confirmed => Transition {
                    chat: ChatEffect::Open,
                    ..Transition::to(from, Shipped)
                },
                Shipped => Transition::to(from, Shipped),
                _ => return Err(invalid()),
            };
            transition.shipper_id = Some(*shipper_id);
            transition.note = Some(format!("shipper {shipper_id} assigned"));
            Ok(transition)
        }

        OrderAction::MarkDelivered => {
            require_assigned_shipper_or_admin(order, actor)?;
            if from != Shipped {
                return Err(invalid());
            }
            let mut transition = Transition {
                chat: ChatEffect::Close,
                ..Transition::to(from, Completed)
            };
            if order.payment_method == PaymentMethod::CashOnDelivery {
                transition.payment_status = Some(PaymentStatus::Paid);
            }
            Ok(transition)
        }

        OrderAction::DeliveryFailed { reason } => {
            require_assigned_shipper_or_admin(order, actor)?;
            if from != Shipped {
                return Err(invalid());
            }
            Ok(Transition {
                restock: true,
                payment_status: refund_if_paid(order),
                chat: ChatEffect::Close,
                note: Some(non_empty_reason(reason, "delivery failed")),
                ..Transition::to(from, Cancelled)
            })
        }

        OrderAction::Cancel { reason } => {
            let allowed = match (from, actor) {
                (Pending, Actor::System) => true,
                (Pending, Actor::User { id, role }) => *role == Role::Admin || *id == order.customer_id,
                (Confirmed, actor) => actor.is_admin(),
                (Shipped | Completed | Cancelled, _) => return Err(invalid()),
            };
            if !allowed {
                return Err(StorefrontError::forbidden("not allowed to cancel this order"));
            }
            Ok(Transition {
                restock: true,
                payment_status: refund_if_paid(order),
                note: Some(non_empty_reason(reason, "cancelled")),
                ..Transition::to(from, Cancelled)
            })
        }
    }
}

/// Produce the order after `transition`
pub fn apply(order: &Order, transition: &Transition, actor: &Actor, now: DateTime<Utc>) -> Order {
    let mut next = order.clone();
    next.status = transition.to;
    next.updated_at = now;

    if let Some(payment_status) = transition.payment_status {
        next.payment_status = payment_status;
    }
    if let Some(shipper_id) = transition.shipper_id {
        next.shipper_id = Some(shipper_id);
    }
    match transition.to {
        OrderStatus::Shipped if transition.changes_status() => next.shipped_at = Some(now),
        OrderStatus::Completed => next.delivered_at = Some(now),
        OrderStatus::Cancelled => next.cancel_reason = transition.note.clone(),
        _ => {}
    }

    next.history.push(OrderEvent {
        at: now,
        actor_id: actor.id(),
        actor_role: actor.role(),
        from: Some(transition.from),
        to: transition.to,
        note: transition.note.clone(),
    });
    next
}

/// Owner, assigned shipper and admins may see an order
pub fn can_view(order: &Order, user: &User) -> bool {
    match user.role {
        Role::Admin => true,
        Role::Shipper => order.shipper_id == Some(user.id),
        Role::Customer => order.customer_id == user.id,
    }
}

fn require_admin(actor: &Actor) -> StorefrontResult<()> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(StorefrontError::forbidden("admin role required"))
    }
}

fn require_assigned_shipper_or_admin(order: &Order, actor: &Actor) -> StorefrontResult<()> {
    match actor {
        Actor::User { role: Role::Admin, .. } => Ok(()),
        Actor::User { id, role: Role::Shipper } if order.shipper_id == Some(*id) => Ok(()),
        _ => Err(StorefrontError::forbidden("only the assigned shipper can update delivery")),
    }
}

fn refund_if_paid(order: &Order) -> Option<PaymentStatus> {
    (order.payment_status == PaymentStatus::Paid).then_some(PaymentStatus::Refunded)
}

fn non_empty_reason(reason: &str, fallback: &str) -> String {
    let reason = reason.trim();
    if reason.is_empty() {
        fallback.to_string()
    } else {
        reason.to_string()
    }
}
