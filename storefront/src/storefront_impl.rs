//! Main storefront implementation
//!
//! `Storefront` owns every service behind its trait and implements the
//! operations the HTTP layer exposes (see `operations/`). Handlers receive a
//! clone of it as axum state.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::interval;

use shared::logging;

use crate::config::StoreConfig;
use crate::core::AnalyticsEngine;
use crate::error::{StorefrontError, StorefrontResult};
use crate::services::{
    RealChatHub, RealPaymentGateway, RealSessionStore, RealStaticFileServer, RealStore, RealUploadStore,
};
use crate::state::ServerState;
use crate::traits::{ChatHub, PaymentGateway, SessionStore, StaticFileServer, Store, UploadStore};

const COMPONENT: &str = "storefront";

const SESSION_SWEEP_EVERY: Duration = Duration::from_secs(60);
const HUB_SWEEP_EVERY: Duration = Duration::from_secs(30);

/// Services the storefront is assembled from
pub struct Services {
    pub store: Arc<dyn Store>,
    pub sessions: Arc<dyn SessionStore>,
    pub hub: Arc<dyn ChatHub>,
    pub uploads: Arc<dyn UploadStore>,
    pub static_files: Arc<dyn StaticFileServer>,
    pub upload_files: Arc<dyn StaticFileServer>,
    pub payments: Arc<dyn PaymentGateway>,
}

impl Services {
    /// Real implementations for `config`, loading the store snapshot if any
    pub async fn from_config(config: &StoreConfig) -> StorefrontResult<Self> {
        let store = match config.snapshot_path() {
            Some(path) => RealStore::open(path).await?,
            None => RealStore::in_memory(),
        };

        Ok(Self {
            store: Arc::new(store),
            sessions: Arc::new(RealSessionStore::new(config.session_ttl)),
            hub: Arc::new(RealChatHub::new()),
            uploads: Arc::new(RealUploadStore::new(&config.upload_dir, config.max_upload_bytes)),
            static_files: Arc::new(RealStaticFileServer::new(&config.static_dir)),
            upload_files: Arc::new(RealStaticFileServer::new(&config.upload_dir)),
            payments: Arc::new(RealPaymentGateway::new(
                config.payment_secret.clone(),
                &config.payment_gateway_url,
                config.payment_return_url.clone(),
            )?),
        })
    }
}

/// Main storefront struct with dependency injection
#[derive(Clone)]
pub struct Storefront {
    pub(crate) config: Arc<StoreConfig>,
    pub(crate) state: Arc<ServerState>,
    pub(crate) store: Arc<dyn Store>,
    pub(crate) sessions: Arc<dyn SessionStore>,
    pub(crate) hub: Arc<dyn ChatHub>,
    pub(crate) uploads: Arc<dyn UploadStore>,
    pub(crate) static_files: Arc<dyn StaticFileServer>,
    pub(crate) upload_files: Arc<dyn StaticFileServer>,
    pub(crate) payments: Arc<dyn PaymentGateway>,
    pub(crate) analytics: Arc<AnalyticsEngine>,

    /// Serializes persist-then-publish for chat messages and status changes so
    /// room delivery order matches store order
    pub(crate) chat_lock: Arc<Mutex<()>>,
}

impl Storefront {
    /// Create a new storefront with dependency injection
    pub fn new(config: StoreConfig, services: Services) -> Self {
        let state = Arc::new(ServerState::new(config.bind_address));
        Self {
            config: Arc::new(config),
            state,
            store: services.store,
            sessions: services.sessions,
            hub: services.hub,
            uploads: services.uploads,
            static_files: services.static_files,
            upload_files: services.upload_files,
            payments: services.payments,
            analytics: Arc::new(AnalyticsEngine::new()),
            chat_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Build from configuration with real services and bootstrap the admin account
    pub async fn from_config(config: StoreConfig) -> StorefrontResult<Self> {
        config.validate()?;
        let services = Services::from_config(&config).await?;
        let storefront = Self::new(config, services);
        storefront.bootstrap_admin().await?;
        Ok(storefront)
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Get server state for external access
    pub fn state(&self) -> &Arc<ServerState> {
        &self.state
    }

    /// Periodic session expiry and hub cleanup
    fn spawn_maintenance(&self) -> tokio::task::JoinHandle<()> {
        let sessions = self.sessions.clone();
        let hub = self.hub.clone();

        tokio::spawn(async move {
            let mut session_tick = interval(SESSION_SWEEP_EVERY);
            let mut hub_tick = interval(HUB_SWEEP_EVERY);
            loop {
                tokio::select! {
                    _ = session_tick.tick() => {
                        let expired = sessions.sweep_expired().await;
                        if expired > 0 {
                            shared::component_info!(COMPONENT, "🧹 Expired {} idle sessions", expired);
                        }
                    }
                    _ = hub_tick.tick() => {
                        hub.sweep_closed().await;
                    }
                }
            }
        })
    }

    /// Start the HTTP server and run until Ctrl+C
    pub async fn run(&self) -> StorefrontResult<()> {
        let router = self.build_router();
        let bind_address = self.state.bind_address;

        let listener = tokio::net::TcpListener::bind(bind_address)
            .await
            .map_err(|e| StorefrontError::Config(format!("Failed to bind to {bind_address}: {e}")))?;

        logging::log_startup(COMPONENT, &format!("HTTP server on http://{bind_address}"));
        if self.config.dev {
            shared::component_warn!(COMPONENT, "⚠️ Development mode: built-in payment secret and fake gateway enabled");
        }

        let maintenance = self.spawn_maintenance();
        let state = self.state.clone();

        let result = axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                match tokio::signal::ctrl_c().await {
                    Ok(()) => logging::log_shutdown(COMPONENT, "Received Ctrl+C signal"),
                    Err(e) => logging::log_error(COMPONENT, "Signal handling", &e),
                }
                state.set_running(false);
            })
            .await;

        maintenance.abort();
        result.map_err(StorefrontError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use shared::{CategoryId, Money, OrderId, ProductId};

    use crate::traits::{
        MockChatHub, MockPaymentGateway, MockSessionStore, MockStaticFileServer, MockStore, MockUploadStore,
    };
    use crate::types::{PaymentCallback, Product, ProductChange, ProductPatch};

    fn mocked(store: MockStore, uploads: MockUploadStore, payments: MockPaymentGateway) -> Storefront {
        let services = Services {
            store: Arc::new(store),
            sessions: Arc::new(MockSessionStore::new()),
            hub: Arc::new(MockChatHub::new()),
            uploads: Arc::new(uploads),
            static_files: Arc::new(MockStaticFileServer::new()),
            upload_files: Arc::new(MockStaticFileServer::new()),
            payments: Arc::new(payments),
        };
        Storefront::new(StoreConfig::development("/tmp/storefront-mocked"), services)
    }

    #[tokio::test]
    async fn test_forged_callback_never_reaches_store() {
        let mut payments = MockPaymentGateway::new();
        payments.expect_verify().times(1).return_const(false);
        let storefront = mocked(MockStore::new(), MockUploadStore::new(), payments);

        let callback = PaymentCallback {
            order_id: OrderId(7),
            amount: 1200,
            txn_ref: "abc".to_string(),
            code: "00".to_string(),
            signature: "forged".to_string(),
        };
        let result = storefront.payment_callback(callback).await;
        assert!(matches!(result, Err(StorefrontError::Payment { .. })));
    }

    fn green_tea(image_path: Option<&str>) -> Product {
        let now = Utc::now();
        Product {
            id: ProductId(1),
            category_id: CategoryId(1),
            name: "Green Tea".to_string(),
            slug: "green-tea".to_string(),
            description: String::new(),
            price: Money(450),
            stock: 10,
            image_path: image_path.map(str::to_string),
            active: true,
            sold: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_image_replacement_survives_failed_cleanup() {
        let mut store = MockStore::new();
        // The image at write time is what gets replaced, not the one read earlier
        store
            .expect_product()
            .returning(|_| Ok(Some(green_tea(Some("/uploads/earlier.png")))));
        store
            .expect_patch_product()
            .withf(|id, patch| *id == ProductId(1) && *patch == ProductPatch::image("/uploads/new.png".to_string()))
            .times(1)
            .returning(|_, _| {
                Ok(ProductChange {
                    before: green_tea(Some("/uploads/old.png")),
                    after: green_tea(Some("/uploads/new.png")),
                })
            });

        let mut uploads = MockUploadStore::new();
        uploads
            .expect_save_image()
            .times(1)
            .returning(|_, _| Ok("/uploads/new.png".to_string()));
        uploads
            .expect_delete()
            .withf(|path| path == "/uploads/old.png")
            .times(1)
            .returning(|_| Err(StorefrontError::internal("disk gone")));

        let storefront = mocked(store, uploads, MockPaymentGateway::new());
        let updated = storefront
            .set_product_image(ProductId(1), "new.png", vec![1, 2, 3])
            .await
            .unwrap();
        assert_eq!(updated.image_path.as_deref(), Some("/uploads/new.png"));
    }

    #[tokio::test]
    async fn test_image_is_discarded_when_product_vanishes() {
        let mut store = MockStore::new();
        store.expect_product().returning(|_| Ok(Some(green_tea(None))));
        store
            .expect_patch_product()
            .times(1)
            .returning(|id, _| Err(StorefrontError::not_found("product", id)));

        let mut uploads = MockUploadStore::new();
        uploads
            .expect_save_image()
            .returning(|_, _| Ok("/uploads/new.png".to_string()));
        uploads
            .expect_delete()
            .withf(|path| path == "/uploads/new.png")
            .times(1)
            .returning(|_| Ok(()));

        let storefront = mocked(store, uploads, MockPaymentGateway::new());
        let result = storefront.set_product_image(ProductId(1), "new.png", vec![1]).await;
        assert!(matches!(result, Err(StorefrontError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_product_delete_survives_failed_image_cleanup() {
        let mut store = MockStore::new();
        store
            .expect_delete_product()
            .times(1)
            .returning(|_| Ok(green_tea(Some("/uploads/tea.png"))));

        let mut uploads = MockUploadStore::new();
        uploads
            .expect_delete()
            .withf(|path| path == "/uploads/tea.png")
            .times(1)
            .returning(|_| Err(StorefrontError::internal("permission denied")));

        let storefront = mocked(store, uploads, MockPaymentGateway::new());
        assert!(storefront.delete_product(ProductId(1)).await.is_ok());
    }
}
