//! Checkout and online payment callbacks

use chrono::Utc;
use uuid::Uuid;

use shared::{OrderStatus, PaymentMethod, PaymentStatus};

use crate::core::cart::{Cart, shipping_fee};
use crate::core::order_flow::{Actor, OrderAction};
use crate::error::{StorefrontError, StorefrontResult};
use crate::storefront_impl::Storefront;
use crate::types::{
    CheckoutRequest, CheckoutResponse, DevPaymentRequest, Order, OrderDraft, OrderEvent, PaymentCallback,
    ShippingInfo, User,
};

const COMPONENT: &str = "checkout";

fn payment_error(details: impl Into<String>) -> StorefrontError {
    StorefrontError::Payment {
        details: details.into(),
    }
}

fn shipping_info(request: &CheckoutRequest) -> StorefrontResult<ShippingInfo> {
    let field = |name: &str, value: &str| {
        let value = value.trim();
        if value.is_empty() {
            Err(StorefrontError::invalid(format!("{name} must not be empty")))
        } else {
            Ok(value.to_string())
        }
    };

    Ok(ShippingInfo {
        recipient_name: field("recipient name", &request.recipient_name)?,
        phone: field("phone", &request.phone)?,
        address: field("address", &request.address)?,
        note: request
            .note
            .as_deref()
            .map(str::trim)
            .filter(|note| !note.is_empty())
            .map(str::to_string),
    })
}

impl Storefront {
    /// Turn the session cart into an order, reserving stock
    pub async fn checkout(
        &self,
        session_id: Uuid,
        customer: &User,
        request: CheckoutRequest,
    ) -> StorefrontResult<CheckoutResponse> {
        let catalog = self.catalog_index().await?;
        // Taking the cart makes a second checkout of the same session see it empty
        let mut cart = self.sessions.take_cart(session_id).await;
        cart.reprice(&catalog);
        if cart.is_empty() {
            return Err(StorefrontError::EmptyCart);
        }

        let order = match self.place_order(customer, &request, &cart).await {
            Ok(order) => order,
            Err(e) => {
                self.restore_cart(session_id, cart).await;
                return Err(e);
            }
        };

        let payment_url = match order.payment_method {
            PaymentMethod::Online => Some(self.payments.checkout_url(&order)),
            PaymentMethod::CashOnDelivery => None,
        };
        shared::component_info!(
            COMPONENT,
            "🛒 User {} placed order {} ({}, {})",
            customer.id,
            order.id,
            order.payment_method,
            order.total
        );
        Ok(CheckoutResponse { order, payment_url })
    }

    async fn place_order(&self, customer: &User, request: &CheckoutRequest, cart: &Cart) -> StorefrontResult<Order> {
        let shipping = shipping_info(request)?;
        let subtotal = cart.subtotal();
        let fee = shipping_fee(subtotal);
        let txn_ref = match request.payment_method {
            PaymentMethod::Online => Some(Uuid::new_v4().simple().to_string()),
            PaymentMethod::CashOnDelivery => None,
        };

        self.store
            .create_order(OrderDraft {
                customer_id: customer.id,
                payment_method: request.payment_method,
                txn_ref,
                lines: cart.order_lines(),
                subtotal,
                shipping_fee: fee,
                total: subtotal + fee,
                shipping,
            })
            .await
    }

    /// Apply a gateway redirect to its order
    pub async fn payment_callback(&self, callback: PaymentCallback) -> StorefrontResult<Order> {
        if !self.payments.verify(&callback) {
            shared::component_warn!(COMPONENT, "⚠️ Rejected payment callback for order {}: bad signature", callback.order_id);
            return Err(payment_error("invalid signature"));
        }

        let _guard = self.chat_lock.lock().await;
        let order = self
            .store
            .order(callback.order_id)
            .await?
            .ok_or_else(|| StorefrontError::not_found("order", callback.order_id))?;

        if order.payment_method != PaymentMethod::Online {
            return Err(payment_error(format!("order {} is not paid online", order.id)));
        }
        if order.txn_ref.as_deref() != Some(callback.txn_ref.as_str()) || order.total.cents() != callback.amount {
            return Err(payment_error(format!("callback does not match order {}", order.id)));
        }

        if callback.succeeded() {
            if order.payment_status == PaymentStatus::Paid {
                return Ok(order);
            }
            if order.status != OrderStatus::Pending {
                return Err(payment_error(format!("order {} is no longer awaiting payment", order.id)));
            }

            let now = Utc::now();
            let mut paid = order.clone();
            paid.payment_status = PaymentStatus::Paid;
            paid.updated_at = now;
            paid.history.push(OrderEvent {
                at: now,
                actor_id: None,
                actor_role: None,
                from: Some(order.status),
                to: order.status,
                note: Some("payment received".to_string()),
            });
            let committed = self.store.commit_order(order.status, paid, false).await?;
            shared::logging::log_success(COMPONENT, &format!("Order {} paid ({})", committed.id, committed.total));
            return Ok(committed);
        }

        if order.status != OrderStatus::Pending || order.payment_status != PaymentStatus::Unpaid {
            return Ok(order);
        }

        shared::component_warn!(COMPONENT, "💳 Payment for order {} failed with code {}", order.id, callback.code);
        let mut failed = order;
        failed.payment_status = PaymentStatus::Failed;
        let action = OrderAction::Cancel {
            reason: format!("online payment failed (code {})", callback.code),
        };
        self.commit_planned(failed, Actor::System, action).await
    }

    /// Play the gateway in development: sign a callback for one of the
    /// customer's own orders and apply it
    pub async fn dev_complete_payment(&self, customer: &User, request: DevPaymentRequest) -> StorefrontResult<Order> {
        if !self.config.dev {
            return Err(StorefrontError::not_found("route", "/api/payment/dev-complete"));
        }
        let order = self.order_for(customer, request.order_id).await?;
        let txn_ref = order
            .txn_ref
            .clone()
            .ok_or_else(|| payment_error(format!("order {} is not paid online", order.id)))?;

        let mut callback = PaymentCallback {
            order_id: order.id,
            amount: order.total.cents(),
            txn_ref,
            code: request.code.unwrap_or_else(|| PaymentCallback::SUCCESS_CODE.to_string()),
            signature: String::new(),
        };
        callback.signature = self.payments.sign(&callback);
        self.payment_callback(callback).await
    }
}
