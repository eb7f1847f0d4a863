//! Storefront operations
//!
//! Each submodule adds an `impl Storefront` block for one area. Operations
//! combine the pure rules in `core` with the services behind `traits`; the
//! HTTP handlers in `web` are thin wrappers over them.

mod account;
mod admin;
mod cart;
mod catalog;
mod chat;
mod checkout;
mod orders;
