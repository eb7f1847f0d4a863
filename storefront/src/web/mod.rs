//! HTTP surface: routes, middleware and handlers

pub mod extract;
pub mod handlers;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::storefront_impl::Storefront;
use handlers::{account, admin, cart, catalog, checkout, health, orders, shipper, static_files, websocket};

/// Room above the image limit for multipart framing and form fields
const MULTIPART_OVERHEAD: usize = 64 * 1024;

impl Storefront {
    /// Build the Axum router with all routes
    pub fn build_router(&self) -> Router {
        // Everything that reads or writes session state
        let session_routes = Router::new()
            // Catalog
            .route("/api/categories", get(catalog::categories))
            .route("/api/products", get(catalog::products))
            .route("/api/products/:id_or_slug", get(catalog::product_detail))
            // Account
            .route("/api/auth/register", post(account::register))
            .route("/api/auth/login", post(account::login))
            .route("/api/auth/logout", post(account::logout))
            .route("/api/auth/me", get(account::me).put(account::update_me))
            .route("/api/auth/password", post(account::change_password))
            // Cart and checkout
            .route("/api/cart", get(cart::view).delete(cart::clear))
            .route("/api/cart/items", post(cart::add_item))
            .route(
                "/api/cart/items/:product_id",
                put(cart::update_item).delete(cart::remove_item),
            )
            .route("/api/checkout", post(checkout::checkout))
            .route("/api/payment/callback", get(checkout::payment_callback))
            .route("/api/payment/dev-complete", post(checkout::dev_complete))
            // Customer orders and chat
            .route("/api/orders", get(orders::list))
            .route("/api/orders/:id", get(orders::detail))
            .route("/api/orders/:id/cancel", post(orders::cancel))
            .route("/api/orders/:id/messages", get(orders::messages).post(orders::post_message))
            .route("/ws/orders/:id", get(websocket::order_room))
            // Back office
            .route("/api/admin/dashboard", get(admin::dashboard))
            .route("/api/admin/categories", get(admin::categories).post(admin::create_category))
            .route(
                "/api/admin/categories/:id",
                put(admin::update_category).delete(admin::delete_category),
            )
            .route("/api/admin/products", get(admin::products).post(admin::create_product))
            .route(
                "/api/admin/products/:id",
                put(admin::update_product).delete(admin::delete_product),
            )
            .route("/api/admin/products/:id/image", post(admin::upload_image))
            .route("/api/admin/orders", get(admin::orders))
            .route("/api/admin/orders/:id", get(admin::order_detail))
            .route("/api/admin/orders/:id/confirm", post(admin::confirm_order))
            .route("/api/admin/orders/:id/assign-shipper", post(admin::assign_shipper))
            .route("/api/admin/orders/:id/cancel", post(admin::cancel_order))
            .route("/api/admin/orders/:id/delivered", post(admin::mark_delivered))
            .route("/api/admin/users", get(admin::users))
            .route("/api/admin/users/:id/role", post(admin::set_role))
            .route("/api/admin/users/:id/lock", post(admin::lock_user))
            .route("/api/admin/users/:id/unlock", post(admin::unlock_user))
            .route("/api/admin/shippers", get(admin::shippers))
            // Delivery
            .route("/api/shipper/orders", get(shipper::orders))
            .route("/api/shipper/orders/:id/delivered", post(shipper::delivered))
            .route("/api/shipper/orders/:id/failed", post(shipper::failed))
            .route_layer(middleware::from_fn_with_state(self.clone(), extract::ensure_session));

        Router::new()
            .merge(session_routes)
            // Static file routes
            .route("/", get(static_files::serve_index))
            .route("/static/*path", get(static_files::serve_static))
            .route("/uploads/*path", get(static_files::serve_upload))
            // Health check
            .route("/health", get(health::health_check))
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(CorsLayer::permissive())
                    .layer(DefaultBodyLimit::max(self.config.max_upload_bytes + MULTIPART_OVERHEAD))
                    .into_inner(),
            )
            .with_state(self.clone())
    }
}
