//! HTTP request handlers, one module per area

pub mod account;
pub mod admin;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod health;
pub mod orders;
pub mod shipper;
pub mod static_files;
pub mod websocket;
