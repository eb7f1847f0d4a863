//! Service trait definitions for dependency injection
//!
//! All I/O operations are abstracted through these traits for testability

use async_trait::async_trait;
use tokio::sync::mpsc;
use uuid::Uuid;

use shared::{CategoryId, HubEvent, OrderId, OrderStatus, ProductId, RoomKey, UserId};

use crate::error::StorefrontResult;
use crate::core::cart::Cart;
use crate::types::{
    Category, CategoryDraft, ChatDraft, ChatMessage, NewUser, Order, OrderDraft, PaymentCallback, Product,
    ProductChange, ProductDraft, ProductPatch, Session, User, UserPatch,
};

/// Edit applied to a session's cart; an error leaves the cart untouched
pub type CartEdit = Box<dyn FnOnce(&mut Cart) -> StorefrontResult<()> + Send>;

/// Persistence for users, catalog, orders and chat messages
#[mockall::automock]
#[async_trait]
pub trait Store: Send + Sync {
    /// Insert a user; duplicate email is a conflict
    async fn insert_user(&self, user: NewUser) -> StorefrontResult<User>;

    async fn user(&self, id: UserId) -> StorefrontResult<Option<User>>;

    /// Lookup by already-normalized email
    async fn user_by_email(&self, email: &str) -> StorefrontResult<Option<User>>;

    async fn users(&self) -> StorefrontResult<Vec<User>>;

    /// Apply a field-level change to the stored account
    async fn patch_user(&self, id: UserId, patch: UserPatch) -> StorefrontResult<User>;

    /// Insert a category; duplicate slug is a conflict
    async fn insert_category(&self, draft: CategoryDraft) -> StorefrontResult<Category>;

    async fn categories(&self) -> StorefrontResult<Vec<Category>>;

    async fn update_category(&self, category: Category) -> StorefrontResult<Category>;

    /// Remove a category that no product references
    async fn delete_category(&self, id: CategoryId) -> StorefrontResult<()>;

    /// Insert a product; duplicate slug or unknown category is rejected
    async fn insert_product(&self, draft: ProductDraft) -> StorefrontResult<Product>;

    async fn product(&self, id: ProductId) -> StorefrontResult<Option<Product>>;

    async fn products(&self) -> StorefrontResult<Vec<Product>>;

    /// Apply a field-level change to the stored product; slug and category
    /// are checked against the state at write time
    async fn patch_product(&self, id: ProductId, patch: ProductPatch) -> StorefrontResult<ProductChange>;

    /// Remove a product that no open order references, returning it
    async fn delete_product(&self, id: ProductId) -> StorefrontResult<Product>;

    /// Reserve stock for every line and insert the order, all or nothing
    async fn create_order(&self, draft: OrderDraft) -> StorefrontResult<Order>;

    async fn order(&self, id: OrderId) -> StorefrontResult<Option<Order>>;

    async fn orders(&self) -> StorefrontResult<Vec<Order>>;

    /// Replace an order if its stored status is still `expected`, optionally
    /// returning its lines to stock in the same write
    async fn commit_order(&self, expected: OrderStatus, order: Order, restock: bool) -> StorefrontResult<Order>;

    /// Persist a chat message, assigning id and timestamp
    async fn append_message(&self, draft: ChatDraft) -> StorefrontResult<ChatMessage>;

    /// Messages of one order in persistence order
    async fn messages(&self, order_id: OrderId) -> StorefrontResult<Vec<ChatMessage>>;
}

/// Server-side session storage keyed by the cookie token
#[mockall::automock]
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Start an anonymous session
    async fn create(&self) -> Session;

    /// Fetch a live session and refresh its idle timer; expired sessions are dropped
    async fn get(&self, id: Uuid) -> Option<Session>;

    async fn save(&self, session: Session);

    /// Run an edit against the cart of a session, starting an empty one under
    /// the same token if it expired. The edit sees the latest cart.
    async fn update_cart(&self, id: Uuid, edit: CartEdit) -> StorefrontResult<Cart>;

    /// Empty the cart of a session, returning what it held
    async fn take_cart(&self, id: Uuid) -> Cart;

    /// Move a session to a fresh token, keeping its contents
    async fn rotate(&self, id: Uuid) -> Option<Session>;

    async fn destroy(&self, id: Uuid) -> bool;

    /// Drop idle sessions, returning how many were removed
    async fn sweep_expired(&self) -> usize;

    async fn count(&self) -> usize;
}

/// Realtime relay of events to the clients watching an order
#[mockall::automock]
#[async_trait]
pub trait ChatHub: Send + Sync {
    /// Register a user's outbound channel in a room
    async fn join(&self, room: RoomKey, client_id: Uuid, user_id: UserId, sender: mpsc::Sender<HubEvent>);

    async fn leave(&self, room: RoomKey, client_id: Uuid);

    /// Deliver an event to every client in the room, returning how many got it
    async fn publish(&self, room: RoomKey, event: HubEvent) -> usize;

    /// Deliver an event to a single client
    async fn send_to(&self, client_id: Uuid, event: HubEvent) -> StorefrontResult<()>;

    async fn room_size(&self, room: RoomKey) -> usize;

    /// Connected clients across all rooms
    async fn client_count(&self) -> usize;

    async fn rooms(&self) -> Vec<RoomKey>;

    /// Drop clients whose channel has closed, returning how many were removed
    async fn sweep_closed(&self) -> usize;

    /// Send `farewell` to every client of a user, in one room or all of them,
    /// then drop those clients. Returns how many were dropped.
    async fn evict(&self, user_id: UserId, room: Option<RoomKey>, farewell: HubEvent) -> usize;
}

/// Product image storage
#[mockall::automock]
#[async_trait]
pub trait UploadStore: Send + Sync {
    /// Store an image under a generated name and return its public path
    async fn save_image(&self, original_name: &str, bytes: Vec<u8>) -> StorefrontResult<String>;

    /// Remove a previously stored image by public path; missing files are fine
    async fn delete(&self, public_path: &str) -> StorefrontResult<()>;
}

/// Static file serving service trait
#[mockall::automock]
#[async_trait]
pub trait StaticFileServer: Send + Sync {
    /// Serve static file
    async fn serve_file(&self, path: &str) -> StorefrontResult<StaticFileResponse>;

    /// Check if file exists
    async fn file_exists(&self, path: &str) -> bool;
}

/// Signed-redirect payment gateway
#[mockall::automock]
pub trait PaymentGateway: Send + Sync {
    /// Hosted payment page URL for an order awaiting online payment
    fn checkout_url(&self, order: &Order) -> String;

    /// Signature the gateway attaches to a callback
    fn sign(&self, callback: &PaymentCallback) -> String;

    fn verify(&self, callback: &PaymentCallback) -> bool;
}

/// Static file response
#[derive(Debug, Clone)]
pub struct StaticFileResponse {
    pub content: Vec<u8>,
    pub content_type: String,
    pub cache_control: Option<String>,
}

impl StaticFileResponse {
    /// Create new static file response
    pub fn new(content: Vec<u8>, content_type: String) -> Self {
        Self {
            content,
            content_type,
            cache_control: None,
        }
    }

    /// Set cache control header
    pub fn with_cache_control(mut self, cache_control: String) -> Self {
        self.cache_control = Some(cache_control);
        self
    }
}
