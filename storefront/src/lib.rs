//! Storefront web service library
//!
//! An online shop backend: catalog, session carts, checkout with cash on
//! delivery or a signed-redirect payment gateway, an order lifecycle with
//! shipper delivery, and a per-order realtime chat between customer and
//! shipper.

pub mod config;
pub mod core;
pub mod error;
pub mod operations;
pub mod services;
pub mod state;
pub mod storefront_impl;
pub mod traits;
pub mod types;
pub mod web;

// Re-export main types
pub use config::{Args, StoreConfig};
pub use error::{StorefrontError, StorefrontResult};
pub use state::ServerState;
pub use storefront_impl::{Services, Storefront};
pub use types::*;

// Re-export trait definitions
pub use traits::{ChatHub, PaymentGateway, SessionStore, StaticFileServer, Store, UploadStore};

// Re-export service implementations
pub use services::{
    RealChatHub, RealPaymentGateway, RealSessionStore, RealStaticFileServer, RealStore, RealUploadStore,
};
