//! Liveness endpoint

use axum::{extract::State, response::IntoResponse};
use chrono::Utc;
use serde_json::json;

use crate::storefront_impl::Storefront;
use crate::web::extract::ok;

pub async fn health_check(State(storefront): State<Storefront>) -> impl IntoResponse {
    let state = storefront.state();
    ok(json!({
        "healthy": state.is_running(),
        "timestamp": Utc::now().timestamp(),
        "uptime_seconds": state.uptime_seconds(),
        "websocket_connections": state.connection_count(),
        "chat_clients": storefront.hub.client_count().await,
        "sessions": storefront.sessions.count().await,
    }))
}
