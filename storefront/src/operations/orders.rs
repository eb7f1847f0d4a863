//! Order lifecycle: transitions, listings and visibility

use chrono::Utc;

use shared::{HubEvent, OrderId, OrderStatus, Role, RoomKey, UserId};

use crate::core::catalog;
use crate::core::order_flow::{self, Actor, ChatEffect, OrderAction, Transition};
use crate::error::{StorefrontError, StorefrontResult};
use crate::storefront_impl::Storefront;
use crate::types::{Order, OrderListQuery, Page, ShipperSummary, User, UserView};

const COMPONENT: &str = "orders";

fn newest_first(orders: &mut [Order]) {
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
}

fn status_matches(order: &Order, status: Option<OrderStatus>) -> bool {
    status.is_none_or(|status| order.status == status)
}

impl Storefront {
    /// Load an order the user may see; anything else looks missing
    pub async fn order_for(&self, user: &User, order_id: OrderId) -> StorefrontResult<Order> {
        match self.store.order(order_id).await? {
            Some(order) if order_flow::can_view(&order, user) => Ok(order),
            _ => Err(StorefrontError::not_found("order", order_id)),
        }
    }

    /// Perform `action` on an order as `user`
    pub async fn transition(&self, user: &User, order_id: OrderId, action: OrderAction) -> StorefrontResult<Order> {
        let _guard = self.chat_lock.lock().await;
        let order = self.order_for(user, order_id).await?;
        self.commit_planned(order, Actor::user(user), action).await
    }

    /// Plan, apply and commit a transition, then tell the order's room.
    /// Callers hold `chat_lock`.
    pub(crate) async fn commit_planned(&self, order: Order, actor: Actor, action: OrderAction) -> StorefrontResult<Order> {
        let transition = order_flow::plan(&order, &actor, &action)?;
        if let Some(shipper_id) = transition.shipper_id {
            self.require_active_shipper(shipper_id).await?;
        }

        let next = order_flow::apply(&order, &transition, &actor, Utc::now());
        let committed = self.store.commit_order(transition.from, next, transition.restock).await?;

        shared::component_info!(
            COMPONENT,
            "📋 Order {}: {} → {} ({})",
            committed.id,
            transition.from,
            transition.to,
            action
        );
        self.announce(&committed, &transition, &actor).await;
        if let (Some(previous), Some(current)) = (order.shipper_id, committed.shipper_id) {
            if previous != current {
                self.dismiss_shipper(committed.id, previous).await;
            }
        }
        Ok(committed)
    }

    /// Disconnect a shipper who no longer handles the order from its room
    async fn dismiss_shipper(&self, order_id: OrderId, shipper_id: UserId) {
        let farewell = HubEvent::ChatClosed {
            order_id,
            reason: "order reassigned to another shipper".to_string(),
        };
        let dropped = self.hub.evict(shipper_id, Some(RoomKey::for_order(order_id)), farewell).await;
        if dropped > 0 {
            shared::component_info!(COMPONENT, "🚪 Shipper {} left order {} after reassignment", shipper_id, order_id);
        }
    }

    async fn require_active_shipper(&self, shipper_id: UserId) -> StorefrontResult<()> {
        match self.store.user(shipper_id).await? {
            Some(user) if user.role == Role::Shipper && !user.locked => Ok(()),
            _ => Err(StorefrontError::invalid(format!("user {shipper_id} is not an active shipper"))),
        }
    }

    async fn announce(&self, order: &Order, transition: &Transition, actor: &Actor) {
        let room = RoomKey::for_order(order.id);
        if transition.changes_status() {
            self.hub
                .publish(
                    room,
                    HubEvent::StatusChanged {
                        order_id: order.id,
                        from: transition.from,
                        to: transition.to,
                        actor_role: actor.role(),
                        at: order.updated_at,
                    },
                )
                .await;
        }
        if transition.chat == ChatEffect::Close {
            let reason = match transition.to {
                OrderStatus::Completed => "order delivered".to_string(),
                _ => transition.note.clone().unwrap_or_else(|| "order closed".to_string()),
            };
            self.hub
                .publish(
                    room,
                    HubEvent::ChatClosed {
                        order_id: order.id,
                        reason,
                    },
                )
                .await;
        }
    }

    /// A customer's own orders, newest first
    pub async fn customer_orders(&self, customer: &User, query: &OrderListQuery) -> StorefrontResult<Page<Order>> {
        let mut orders: Vec<Order> = self
            .store
            .orders()
            .await?
            .into_iter()
            .filter(|o| o.customer_id == customer.id && status_matches(o, query.status))
            .collect();
        newest_first(&mut orders);
        Ok(catalog::paginate(orders, query.page, query.page_size))
    }

    /// Orders currently or previously assigned to a shipper, newest first
    pub async fn shipper_orders(&self, shipper: &User, query: &OrderListQuery) -> StorefrontResult<Page<Order>> {
        let mut orders: Vec<Order> = self
            .store
            .orders()
            .await?
            .into_iter()
            .filter(|o| o.shipper_id == Some(shipper.id) && status_matches(o, query.status))
            .collect();
        newest_first(&mut orders);
        Ok(catalog::paginate(orders, query.page, query.page_size))
    }

    /// Every order, filtered by status and by customer email or recipient name
    pub async fn admin_orders(&self, query: &OrderListQuery) -> StorefrontResult<Page<Order>> {
        let needle = query
            .q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase);

        let users = self.store.users().await?;
        let email_of = |id: UserId| users.iter().find(|u| u.id == id).map(|u| u.email.as_str()).unwrap_or("");

        let mut orders: Vec<Order> = self
            .store
            .orders()
            .await?
            .into_iter()
            .filter(|o| status_matches(o, query.status))
            .filter(|o| match &needle {
                Some(needle) => {
                    email_of(o.customer_id).contains(needle.as_str())
                        || o.shipping.recipient_name.to_lowercase().contains(needle.as_str())
                }
                None => true,
            })
            .collect();
        newest_first(&mut orders);
        Ok(catalog::paginate(orders, query.page, query.page_size))
    }

    /// Active shippers with how many orders each is delivering right now
    pub async fn shippers(&self) -> StorefrontResult<Vec<ShipperSummary>> {
        let orders = self.store.orders().await?;
        let mut shippers: Vec<ShipperSummary> = self
            .store
            .users()
            .await?
            .iter()
            .filter(|u| u.role == Role::Shipper && !u.locked)
            .map(|shipper| ShipperSummary {
                shipper: UserView::from(shipper),
                active_deliveries: orders
                    .iter()
                    .filter(|o| o.status == OrderStatus::Shipped && o.shipper_id == Some(shipper.id))
                    .count(),
            })
            .collect();
        shippers.sort_by(|a, b| a.active_deliveries.cmp(&b.active_deliveries).then(a.shipper.id.cmp(&b.shipper.id)));
        Ok(shippers)
    }
}
