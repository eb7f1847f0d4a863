//! Type definitions for the storefront
//!
//! Persisted entities, their drafts, and the views handed to clients.
//! Service traits live in `traits.rs`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::{
    CategoryId, ChatMessageView, MessageId, Money, OrderId, OrderStatus, PaymentMethod, PaymentStatus, ProductId,
    Role, UserId,
};
use uuid::Uuid;

use crate::core::cart::Cart;

/// Registered account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub phone: String,
    pub address: String,
    pub role: Role,
    pub locked: bool,
    pub created_at: DateTime<Utc>,
}

/// Account fields before the store assigns an id
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub phone: String,
    pub address: String,
    pub role: Role,
}

/// Account as shown to clients; never carries the password hash
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserView {
    pub id: UserId,
    pub email: String,
    pub full_name: String,
    pub phone: String,
    pub address: String,
    pub role: Role,
    pub locked: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            phone: user.phone.clone(),
            address: user.address.clone(),
            role: user.role,
            locked: user.locked,
            created_at: user.created_at,
        }
    }
}

/// Field-level change to an account; `None` leaves the stored value alone
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserPatch {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<Role>,
    pub locked: Option<bool>,
}

impl UserPatch {
    pub fn apply(self, user: &mut User) {
        if let Some(full_name) = self.full_name {
            user.full_name = full_name;
        }
        if let Some(phone) = self.phone {
            user.phone = phone;
        }
        if let Some(address) = self.address {
            user.address = address;
        }
        if let Some(password_hash) = self.password_hash {
            user.password_hash = password_hash;
        }
        if let Some(role) = self.role {
            user.role = role;
        }
        if let Some(locked) = self.locked {
            user.locked = locked;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryDraft {
    pub name: String,
    pub slug: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub category_id: CategoryId,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub price: Money,
    pub stock: u32,
    pub image_path: Option<String>,
    pub active: bool,
    /// Units currently sold through non-cancelled orders
    pub sold: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductDraft {
    pub category_id: CategoryId,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub price: Money,
    pub stock: u32,
    pub active: bool,
}

/// Field-level change to a product. `sold` is never patched; it only moves
/// with orders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductPatch {
    pub category_id: Option<CategoryId>,
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    pub stock: Option<u32>,
    pub active: Option<bool>,
    pub image_path: Option<String>,
}

impl ProductPatch {
    pub fn image(path: String) -> Self {
        Self {
            image_path: Some(path),
            ..Self::default()
        }
    }

    pub fn apply(self, product: &mut Product) {
        if let Some(category_id) = self.category_id {
            product.category_id = category_id;
        }
        if let Some(name) = self.name {
            product.name = name;
        }
        if let Some(slug) = self.slug {
            product.slug = slug;
        }
        if let Some(description) = self.description {
            product.description = description;
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(stock) = self.stock {
            product.stock = stock;
        }
        if let Some(active) = self.active {
            product.active = active;
        }
        if let Some(image_path) = self.image_path {
            product.image_path = Some(image_path);
        }
    }
}

impl From<ProductDraft> for ProductPatch {
    fn from(draft: ProductDraft) -> Self {
        Self {
            category_id: Some(draft.category_id),
            name: Some(draft.name),
            slug: Some(draft.slug),
            description: Some(draft.description),
            price: Some(draft.price),
            stock: Some(draft.stock),
            active: Some(draft.active),
            image_path: None,
        }
    }
}

/// Product as it was before and after a patch
#[derive(Debug, Clone, PartialEq)]
pub struct ProductChange {
    pub before: Product,
    pub after: Product,
}

/// Snapshot of a purchased product at checkout time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub unit_price: Money,
    pub quantity: u32,
    pub line_total: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingInfo {
    pub recipient_name: String,
    pub phone: String,
    pub address: String,
    pub note: Option<String>,
}

/// One entry of an order's status history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderEvent {
    pub at: DateTime<Utc>,
    pub actor_id: Option<UserId>,
    pub actor_role: Option<Role>,
    pub from: Option<OrderStatus>,
    pub to: OrderStatus,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: UserId,
    pub shipper_id: Option<UserId>,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub txn_ref: Option<String>,
    pub lines: Vec<OrderLine>,
    pub subtotal: Money,
    pub shipping_fee: Money,
    pub total: Money,
    pub shipping: ShippingInfo,
    pub cancel_reason: Option<String>,
    pub history: Vec<OrderEvent>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
}

impl Order {
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    /// Quantities to take from (or give back to) stock
    pub fn stock_requests(&self) -> Vec<StockRequest> {
        self.lines
            .iter()
            .map(|line| StockRequest {
                product_id: line.product_id,
                quantity: line.quantity,
            })
            .collect()
    }
}

/// Order fields before the store assigns an id and reserves stock
#[derive(Debug, Clone, PartialEq)]
pub struct OrderDraft {
    pub customer_id: UserId,
    pub payment_method: PaymentMethod,
    pub txn_ref: Option<String>,
    pub lines: Vec<OrderLine>,
    pub subtotal: Money,
    pub shipping_fee: Money,
    pub total: Money,
    pub shipping: ShippingInfo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Persisted chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub order_id: OrderId,
    pub sender_id: UserId,
    pub sender_role: Role,
    pub sender_name: String,
    pub body: String,
    pub sent_at: DateTime<Utc>,
}

impl From<ChatMessage> for ChatMessageView {
    fn from(message: ChatMessage) -> Self {
        Self {
            id: message.id,
            order_id: message.order_id,
            sender_id: message.sender_id,
            sender_role: message.sender_role,
            sender_name: message.sender_name,
            body: message.body,
            sent_at: message.sent_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatDraft {
    pub order_id: OrderId,
    pub sender_id: UserId,
    pub sender_role: Role,
    pub sender_name: String,
    pub body: String,
}

/// Server-side browser session
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Option<UserId>,
    pub cart: Cart,
    pub created_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl Session {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id: None,
            cart: Cart::default(),
            created_at: now,
            last_seen: now,
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// One page of a listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            page_size: self.page_size,
            total_pages: self.total_pages,
        }
    }
}

/// Online payment result as reported by the gateway redirect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentCallback {
    pub order_id: OrderId,
    /// Minor units
    pub amount: u64,
    pub txn_ref: String,
    pub code: String,
    #[serde(default)]
    pub signature: String,
}

impl PaymentCallback {
    pub const SUCCESS_CODE: &'static str = "00";

    pub fn succeeded(&self) -> bool {
        self.code == Self::SUCCESS_CODE
    }
}

// Request bodies and query strings

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CartAddRequest {
    pub product_id: ProductId,
    #[serde(default = "one")]
    pub quantity: u32,
}

fn one() -> u32 {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct CartUpdateRequest {
    pub quantity: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    pub recipient_name: String,
    pub phone: String,
    pub address: String,
    pub note: Option<String>,
    pub payment_method: PaymentMethod,
}

/// Development stand-in for the hosted payment page
#[derive(Debug, Clone, Deserialize)]
pub struct DevPaymentRequest {
    pub order_id: OrderId,
    /// Gateway result code, success when absent
    pub code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutResponse {
    pub order: Order,
    /// Present for online payment
    pub payment_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderListQuery {
    pub status: Option<OrderStatus>,
    /// Admin only: matches customer email or recipient name
    pub q: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserListQuery {
    pub role: Option<Role>,
    pub q: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryPayload {
    pub name: String,
    pub slug: Option<String>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductPayload {
    pub category_id: CategoryId,
    pub name: String,
    pub slug: Option<String>,
    #[serde(default)]
    pub description: String,
    pub price: Money,
    pub stock: u32,
    #[serde(default = "active_by_default")]
    pub active: bool,
}

fn active_by_default() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssignShipperRequest {
    pub shipper_id: UserId,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReasonRequest {
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatPostRequest {
    pub body: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoleRequest {
    pub role: Role,
}

/// Product detail page payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductDetail {
    pub product: Product,
    pub category: Option<Category>,
    pub related: Vec<Product>,
}

/// Active shipper with their current delivery load
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipperSummary {
    pub shipper: UserView,
    pub active_deliveries: usize,
}
