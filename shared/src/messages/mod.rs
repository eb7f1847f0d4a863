//! Message types exchanged over the realtime channel
//!
//! Browsers talk to the server over one WebSocket per order room.

pub mod hub;

pub use hub::{ChatMessageView, HubEvent, HubRequest};
