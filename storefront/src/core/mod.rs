//! Core business logic modules
//!
//! Pure business logic with no I/O dependencies

pub mod analytics;
pub mod cart;
pub mod catalog;
pub mod chat;
pub mod credentials;
pub mod order_flow;

// Re-export commonly used types
pub use analytics::{AnalyticsEngine, DashboardStats};
pub use cart::{Cart, CartView};
pub use catalog::{ProductFilter, ProductQuery, SortOrder};
pub use order_flow::{Actor, ChatEffect, OrderAction, Transition};
