//! Shared error types for the storefront service

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SharedError {
    #[error("Invalid role: {input}")]
    InvalidRole { input: String },

    #[error("Invalid order status: {input}")]
    InvalidStatus { input: String },

    #[error("Invalid payment method: {input}")]
    InvalidPaymentMethod { input: String },

    #[error("Invalid chat room key: {input}")]
    InvalidRoomKey { input: String },

    #[error("Invalid configuration: {field} = {value}")]
    InvalidConfig { field: String, value: String },
}

pub type SharedResult<T> = Result<T, SharedError>;
