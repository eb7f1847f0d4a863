//! Service tests for the storefront
//!
//! Exercises every real service implementation against its trait.

pub mod fixtures;
pub mod helpers;
pub mod static_server;
pub mod store;
