//! Shared types for the storefront service
//!
//! Contains the domain vocabulary (roles, order states, money, identifiers)
//! and the realtime hub protocol spoken between browsers and the server.
//! Server-internal types are kept in the `storefront` crate.

pub mod errors;
pub mod logging;
pub mod messages;
pub mod types;

pub use errors::*;
pub use types::*;

// Re-export the realtime protocol
pub use messages::{ChatMessageView, HubEvent, HubRequest};
