//! Service implementations
//!
//! Real implementations of all service traits for production use

pub mod chat_hub;
pub mod payment_gateway;
pub mod session_store;
pub mod static_server;
pub mod store;
pub mod upload_store;

#[cfg(test)]
pub mod tests;

// Re-export service implementations
pub use chat_hub::RealChatHub;
pub use payment_gateway::RealPaymentGateway;
pub use session_store::RealSessionStore;
pub use static_server::RealStaticFileServer;
pub use store::RealStore;
pub use upload_store::RealUploadStore;
