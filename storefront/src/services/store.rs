//! In-memory store with an optional JSON snapshot on disk
//!
//! Every mutation runs under one write guard against a copy of the tables.
//! When a snapshot path is configured the copy is written out (temp file +
//! rename) first, and only a successful write makes it the live state.

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::RwLock;

use shared::{CategoryId, MessageId, OrderId, OrderStatus, PaymentStatus, ProductId, UserId};

use crate::error::{StorefrontError, StorefrontResult};
use crate::traits::Store;
use crate::types::{
    Category, CategoryDraft, ChatDraft, ChatMessage, NewUser, Order, OrderDraft, OrderEvent, Product, ProductChange,
    ProductDraft, ProductPatch, StockRequest, User, UserPatch,
};

const COMPONENT: &str = "store";

/// Live tables
#[derive(Debug, Clone, Default)]
struct Database {
    next: NextIds,
    users: BTreeMap<UserId, User>,
    categories: BTreeMap<CategoryId, Category>,
    products: BTreeMap<ProductId, Product>,
    orders: BTreeMap<OrderId, Order>,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
struct NextIds {
    user: u64,
    category: u64,
    product: u64,
    order: u64,
    message: u64,
}

impl NextIds {
    fn bump(counter: &mut u64) -> u64 {
        *counter += 1;
        *counter
    }
}

/// On-disk form of the database
#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    next: NextIds,
    users: Vec<User>,
    categories: Vec<Category>,
    products: Vec<Product>,
    orders: Vec<Order>,
    messages: Vec<ChatMessage>,
}

impl From<Snapshot> for Database {
    fn from(snapshot: Snapshot) -> Self {
        let mut db = Database {
            next: snapshot.next,
            users: snapshot.users.into_iter().map(|u| (u.id, u)).collect(),
            categories: snapshot.categories.into_iter().map(|c| (c.id, c)).collect(),
            products: snapshot.products.into_iter().map(|p| (p.id, p)).collect(),
            orders: snapshot.orders.into_iter().map(|o| (o.id, o)).collect(),
            messages: snapshot.messages,
        };
        // Counters never go backwards even if the snapshot was edited by hand
        db.next.user = db.next.user.max(db.users.keys().last().map_or(0, |id| id.value()));
        db.next.category = db.next.category.max(db.categories.keys().last().map_or(0, |id| id.value()));
        db.next.product = db.next.product.max(db.products.keys().last().map_or(0, |id| id.value()));
        db.next.order = db.next.order.max(db.orders.keys().last().map_or(0, |id| id.value()));
        db.next.message = db.next.message.max(db.messages.iter().map(|m| m.id.value()).max().unwrap_or(0));
        db
    }
}

impl Database {
    fn snapshot(&self) -> Snapshot {
        Snapshot {
            next: self.next,
            users: self.users.values().cloned().collect(),
            categories: self.categories.values().cloned().collect(),
            products: self.products.values().cloned().collect(),
            orders: self.orders.values().cloned().collect(),
            messages: self.messages.clone(),
        }
    }

    fn product_mut(&mut self, id: ProductId) -> StorefrontResult<&mut Product> {
        self.products
            .get_mut(&id)
            .ok_or_else(|| StorefrontError::not_found("product", id))
    }

    fn slug_taken_by_product(&self, slug: &str, except: Option<ProductId>) -> bool {
        self.products.values().any(|p| p.slug == slug && Some(p.id) != except)
    }

    fn slug_taken_by_category(&self, slug: &str, except: Option<CategoryId>) -> bool {
        self.categories.values().any(|c| c.slug == slug && Some(c.id) != except)
    }

    /// Check every request against stock before touching anything
    fn check_stock(&self, requests: &[StockRequest]) -> StorefrontResult<()> {
        let mut wanted: BTreeMap<ProductId, u32> = BTreeMap::new();
        for request in requests {
            *wanted.entry(request.product_id).or_default() += request.quantity;
        }
        for (product_id, quantity) in wanted {
            let product = self
                .products
                .get(&product_id)
                .filter(|p| p.active)
                .ok_or_else(|| StorefrontError::not_found("product", product_id))?;
            if product.stock < quantity {
                return Err(StorefrontError::OutOfStock {
                    product_id,
                    requested: quantity,
                    available: product.stock,
                });
            }
        }
        Ok(())
    }

    fn restock(&mut self, requests: &[StockRequest]) {
        for request in requests {
            // Products deleted since the order was placed have nothing to restock
            if let Some(product) = self.products.get_mut(&request.product_id) {
                product.stock = product.stock.saturating_add(request.quantity);
                product.sold = product.sold.saturating_sub(request.quantity);
            }
        }
    }
}

/// Real store implementation
#[derive(Clone)]
pub struct RealStore {
    db: Arc<RwLock<Database>>,

    /// Snapshot file; `None` keeps everything in memory
    snapshot_path: Option<PathBuf>,
}

impl RealStore {
    /// Store that never touches the disk
    pub fn in_memory() -> Self {
        Self {
            db: Arc::new(RwLock::new(Database::default())),
            snapshot_path: None,
        }
    }

    /// Load the snapshot at `path` (a missing file is an empty store)
    pub async fn open(path: impl AsRef<Path>) -> StorefrontResult<Self> {
        let path = path.as_ref().to_path_buf();
        let db = match fs::read(&path).await {
            Ok(bytes) => {
                let snapshot: Snapshot = serde_json::from_slice(&bytes)?;
                shared::component_info!(
                    COMPONENT,
                    "📂 Loaded snapshot {} ({} products, {} orders)",
                    path.display(),
                    snapshot.products.len(),
                    snapshot.orders.len()
                );
                Database::from(snapshot)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                shared::component_info!(COMPONENT, "📂 No snapshot at {}, starting empty", path.display());
                Database::default()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            db: Arc::new(RwLock::new(db)),
            snapshot_path: Some(path),
        })
    }

    /// Apply `change` to a copy of the tables and swap it in once it is
    /// persisted. An error from either step leaves the live tables as they were.
    async fn transact<T: Send>(
        &self,
        change: impl FnOnce(&mut Database) -> StorefrontResult<T> + Send,
    ) -> StorefrontResult<T> {
        let mut db = self.db.write().await;
        let mut next = db.clone();
        let value = change(&mut next)?;
        if let Err(e) = self.persist(&next).await {
            shared::component_error!(COMPONENT, "❌ Snapshot write failed, change discarded: {}", e);
            return Err(e);
        }
        *db = next;
        Ok(value)
    }

    async fn persist(&self, db: &Database) -> StorefrontResult<()> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(&db.snapshot())?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, bytes).await?;
        fs::rename(&tmp, path).await?;
        Ok(())
    }
}

impl Default for RealStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

#[async_trait]
impl Store for RealStore {
    async fn insert_user(&self, new_user: NewUser) -> StorefrontResult<User> {
        self.transact(|db| {
            if db.users.values().any(|u| u.email == new_user.email) {
                return Err(StorefrontError::conflict(format!("email {} is already registered", new_user.email)));
            }

            let user = User {
                id: UserId(NextIds::bump(&mut db.next.user)),
                email: new_user.email,
                password_hash: new_user.password_hash,
                full_name: new_user.full_name,
                phone: new_user.phone,
                address: new_user.address,
                role: new_user.role,
                locked: false,
                created_at: Utc::now(),
            };
            db.users.insert(user.id, user.clone());
            Ok(user)
        })
        .await
    }

    async fn user(&self, id: UserId) -> StorefrontResult<Option<User>> {
        Ok(self.db.read().await.users.get(&id).cloned())
    }

    async fn user_by_email(&self, email: &str) -> StorefrontResult<Option<User>> {
        Ok(self.db.read().await.users.values().find(|u| u.email == email).cloned())
    }

    async fn users(&self) -> StorefrontResult<Vec<User>> {
        Ok(self.db.read().await.users.values().cloned().collect())
    }

    async fn patch_user(&self, id: UserId, patch: UserPatch) -> StorefrontResult<User> {
        self.transact(|db| {
            let user = db.users.get_mut(&id).ok_or_else(|| StorefrontError::not_found("user", id))?;
            patch.apply(user);
            Ok(user.clone())
        })
        .await
    }

    async fn insert_category(&self, draft: CategoryDraft) -> StorefrontResult<Category> {
        self.transact(|db| {
            if db.slug_taken_by_category(&draft.slug, None) {
                return Err(StorefrontError::conflict(format!("category slug {} is taken", draft.slug)));
            }

            let category = Category {
                id: CategoryId(NextIds::bump(&mut db.next.category)),
                name: draft.name,
                slug: draft.slug,
                description: draft.description,
            };
            db.categories.insert(category.id, category.clone());
            Ok(category)
        })
        .await
    }

    async fn categories(&self) -> StorefrontResult<Vec<Category>> {
        Ok(self.db.read().await.categories.values().cloned().collect())
    }

    async fn update_category(&self, category: Category) -> StorefrontResult<Category> {
        self.transact(|db| {
            if !db.categories.contains_key(&category.id) {
                return Err(StorefrontError::not_found("category", category.id));
            }
            if db.slug_taken_by_category(&category.slug, Some(category.id)) {
                return Err(StorefrontError::conflict(format!("category slug {} is taken", category.slug)));
            }
            db.categories.insert(category.id, category.clone());
            Ok(category)
        })
        .await
    }

    async fn delete_category(&self, id: CategoryId) -> StorefrontResult<()> {
        self.transact(|db| {
            if !db.categories.contains_key(&id) {
                return Err(StorefrontError::not_found("category", id));
            }
            let in_use = db.products.values().filter(|p| p.category_id == id).count();
            if in_use > 0 {
                return Err(StorefrontError::conflict(format!(
                    "category {id} still has {in_use} product(s)"
                )));
            }
            db.categories.remove(&id);
            Ok(())
        })
        .await
    }

    async fn insert_product(&self, draft: ProductDraft) -> StorefrontResult<Product> {
        self.transact(|db| {
            if !db.categories.contains_key(&draft.category_id) {
                return Err(StorefrontError::not_found("category", draft.category_id));
            }
            if db.slug_taken_by_product(&draft.slug, None) {
                return Err(StorefrontError::conflict(format!("product slug {} is taken", draft.slug)));
            }

            let now = Utc::now();
            let product = Product {
                id: ProductId(NextIds::bump(&mut db.next.product)),
                category_id: draft.category_id,
                name: draft.name,
                slug: draft.slug,
                description: draft.description,
                price: draft.price,
                stock: draft.stock,
                image_path: None,
                active: draft.active,
                sold: 0,
                created_at: now,
                updated_at: now,
            };
            db.products.insert(product.id, product.clone());
            Ok(product)
        })
        .await
    }

    async fn product(&self, id: ProductId) -> StorefrontResult<Option<Product>> {
        Ok(self.db.read().await.products.get(&id).cloned())
    }

    async fn products(&self) -> StorefrontResult<Vec<Product>> {
        Ok(self.db.read().await.products.values().cloned().collect())
    }

    async fn patch_product(&self, id: ProductId, patch: ProductPatch) -> StorefrontResult<ProductChange> {
        self.transact(|db| {
            if let Some(category_id) = patch.category_id {
                if !db.categories.contains_key(&category_id) {
                    return Err(StorefrontError::not_found("category", category_id));
                }
            }
            if let Some(slug) = &patch.slug {
                if db.slug_taken_by_product(slug, Some(id)) {
                    return Err(StorefrontError::conflict(format!("product slug {slug} is taken")));
                }
            }

            let stored = db.product_mut(id)?;
            let before = stored.clone();
            patch.apply(stored);
            stored.updated_at = Utc::now();
            Ok(ProductChange {
                before,
                after: stored.clone(),
            })
        })
        .await
    }

    async fn delete_product(&self, id: ProductId) -> StorefrontResult<Product> {
        self.transact(|db| {
            if !db.products.contains_key(&id) {
                return Err(StorefrontError::not_found("product", id));
            }
            let open_orders = db
                .orders
                .values()
                .filter(|o| !o.status.is_terminal() && o.lines.iter().any(|l| l.product_id == id))
                .count();
            if open_orders > 0 {
                return Err(StorefrontError::conflict(format!(
                    "product {id} is part of {open_orders} open order(s); deactivate it instead"
                )));
            }
            db.products
                .remove(&id)
                .ok_or_else(|| StorefrontError::not_found("product", id))
        })
        .await
    }

    async fn create_order(&self, draft: OrderDraft) -> StorefrontResult<Order> {
        let order = self
            .transact(|db| {
                let requests: Vec<StockRequest> = draft
                    .lines
                    .iter()
                    .map(|line| StockRequest {
                        product_id: line.product_id,
                        quantity: line.quantity,
                    })
                    .collect();
                db.check_stock(&requests)?;

                for request in &requests {
                    let product = db.product_mut(request.product_id)?;
                    product.stock -= request.quantity;
                    product.sold = product.sold.saturating_add(request.quantity);
                }

                let now = Utc::now();
                let order = Order {
                    id: OrderId(NextIds::bump(&mut db.next.order)),
                    customer_id: draft.customer_id,
                    shipper_id: None,
                    status: OrderStatus::Pending,
                    payment_method: draft.payment_method,
                    payment_status: PaymentStatus::Unpaid,
                    txn_ref: draft.txn_ref,
                    lines: draft.lines,
                    subtotal: draft.subtotal,
                    shipping_fee: draft.shipping_fee,
                    total: draft.total,
                    shipping: draft.shipping,
                    cancel_reason: None,
                    history: vec![OrderEvent {
                        at: now,
                        actor_id: Some(draft.customer_id),
                        actor_role: Some(shared::Role::Customer),
                        from: None,
                        to: OrderStatus::Pending,
                        note: Some("order placed".to_string()),
                    }],
                    created_at: now,
                    updated_at: now,
                    shipped_at: None,
                    delivered_at: None,
                };
                db.orders.insert(order.id, order.clone());
                Ok(order)
            })
            .await?;

        shared::component_info!(COMPONENT, "🧾 Order {} created ({} lines, total {})", order.id, order.lines.len(), order.total);
        Ok(order)
    }

    async fn order(&self, id: OrderId) -> StorefrontResult<Option<Order>> {
        Ok(self.db.read().await.orders.get(&id).cloned())
    }

    async fn orders(&self) -> StorefrontResult<Vec<Order>> {
        Ok(self.db.read().await.orders.values().cloned().collect())
    }

    async fn commit_order(&self, expected: OrderStatus, order: Order, restock: bool) -> StorefrontResult<Order> {
        self.transact(|db| {
            let current = db
                .orders
                .get(&order.id)
                .ok_or_else(|| StorefrontError::not_found("order", order.id))?;
            if current.status != expected {
                return Err(StorefrontError::conflict(format!(
                    "order {} changed from {} to {} concurrently",
                    order.id, expected, current.status
                )));
            }

            if restock {
                db.restock(&order.stock_requests());
            }
            db.orders.insert(order.id, order.clone());
            Ok(order)
        })
        .await
    }

    async fn append_message(&self, draft: ChatDraft) -> StorefrontResult<ChatMessage> {
        self.transact(|db| {
            if !db.orders.contains_key(&draft.order_id) {
                return Err(StorefrontError::not_found("order", draft.order_id));
            }

            let message = ChatMessage {
                id: MessageId(NextIds::bump(&mut db.next.message)),
                order_id: draft.order_id,
                sender_id: draft.sender_id,
                sender_role: draft.sender_role,
                sender_name: draft.sender_name,
                body: draft.body,
                sent_at: Utc::now(),
            };
            db.messages.push(message.clone());
            Ok(message)
        })
        .await
    }

    async fn messages(&self, order_id: OrderId) -> StorefrontResult<Vec<ChatMessage>> {
        Ok(self
            .db
            .read()
            .await
            .messages
            .iter()
            .filter(|m| m.order_id == order_id)
            .cloned()
            .collect())
    }
}
