//! Test fixtures for storefront service tests

use shared::{CategoryId, Money, PaymentMethod, Role, UserId};

use crate::types::{CategoryDraft, ChatDraft, NewUser, OrderDraft, OrderLine, Product, ProductDraft, ShippingInfo};

pub fn new_user(email: &str, role: Role) -> NewUser {
    NewUser {
        email: email.to_string(),
        password_hash: "00$00".to_string(),
        full_name: format!("Test {email}"),
        phone: "555-0100".to_string(),
        address: "1 Test Street".to_string(),
        role,
    }
}

pub fn category_draft(name: &str) -> CategoryDraft {
    CategoryDraft {
        name: name.to_string(),
        slug: crate::core::catalog::slugify(name),
        description: format!("All things {name}"),
    }
}

pub fn product_draft(category_id: CategoryId, name: &str, price: u64, stock: u32) -> ProductDraft {
    ProductDraft {
        category_id,
        name: name.to_string(),
        slug: crate::core::catalog::slugify(name),
        description: format!("{name} description"),
        price: Money(price),
        stock,
        active: true,
    }
}

pub fn shipping_info() -> ShippingInfo {
    ShippingInfo {
        recipient_name: "Ana Test".to_string(),
        phone: "555-0100".to_string(),
        address: "1 Test Street".to_string(),
        note: None,
    }
}

/// Draft buying `quantity` of each product at its current price
pub fn order_draft(customer_id: UserId, items: &[(&Product, u32)]) -> OrderDraft {
    let lines: Vec<OrderLine> = items
        .iter()
        .map(|(product, quantity)| OrderLine {
            product_id: product.id,
            product_name: product.name.clone(),
            unit_price: product.price,
            quantity: *quantity,
            line_total: product.price.times(*quantity),
        })
        .collect();
    let subtotal: Money = lines.iter().map(|l| l.line_total).sum();

    OrderDraft {
        customer_id,
        payment_method: PaymentMethod::CashOnDelivery,
        txn_ref: None,
        lines,
        subtotal,
        shipping_fee: Money::ZERO,
        total: subtotal,
        shipping: shipping_info(),
    }
}

pub fn chat_draft(order: &crate::types::Order, sender_id: UserId, role: Role, body: &str) -> ChatDraft {
    ChatDraft {
        order_id: order.id,
        sender_id,
        sender_role: role,
        sender_name: format!("User {sender_id}"),
        body: body.to_string(),
    }
}
