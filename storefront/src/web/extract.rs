//! Session cookie handling and request extractors

use async_trait::async_trait;
use axum::{
    Json,
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, HeaderValue, header, request::Parts},
    middleware::Next,
    response::Response,
};
use serde::Serialize;
use uuid::Uuid;

use shared::Role;

use crate::error::{StorefrontError, StorefrontResult};
use crate::storefront_impl::Storefront;
use crate::types::User;

pub const SESSION_COOKIE: &str = "sid";

/// Success envelope shared by every JSON endpoint
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub status: &'static str,
    pub data: T,
}

pub fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse { status: "ok", data })
}

/// `Set-Cookie` value binding the browser to a session
pub fn session_cookie(session_id: Uuid) -> String {
    format!("{SESSION_COOKIE}={session_id}; HttpOnly; SameSite=Lax; Path=/")
}

/// `Set-Cookie` value that makes the browser forget its session
pub fn expired_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0")
}

/// Session id from the request's `Cookie` headers, if well-formed
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

/// Session the current request belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionContext {
    pub id: Uuid,
}

/// Attach a live session to every request, starting an anonymous one (and
/// setting the cookie) when the browser has none
pub async fn ensure_session(State(storefront): State<Storefront>, mut request: Request, next: Next) -> Response {
    let existing = match session_id_from_headers(request.headers()) {
        Some(id) => storefront.sessions.get(id).await.map(|session| session.id),
        None => None,
    };
    let (session_id, fresh) = match existing {
        Some(id) => (id, false),
        None => (storefront.sessions.create().await.id, true),
    };

    request.extensions_mut().insert(SessionContext { id: session_id });
    let mut response = next.run(request).await;

    // Login and logout set their own cookie
    if fresh && !response.headers().contains_key(header::SET_COOKIE) {
        if let Ok(value) = HeaderValue::from_str(&session_cookie(session_id)) {
            response.headers_mut().insert(header::SET_COOKIE, value);
        }
    }
    response
}

#[async_trait]
impl FromRequestParts<Storefront> for SessionContext {
    type Rejection = StorefrontError;

    async fn from_request_parts(parts: &mut Parts, _state: &Storefront) -> StorefrontResult<Self> {
        parts
            .extensions
            .get::<SessionContext>()
            .copied()
            .ok_or_else(|| StorefrontError::internal("session middleware is not installed on this route"))
    }
}

/// Logged-in, unlocked user
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<Storefront> for CurrentUser {
    type Rejection = StorefrontError;

    async fn from_request_parts(parts: &mut Parts, storefront: &Storefront) -> StorefrontResult<Self> {
        let session = SessionContext::from_request_parts(parts, storefront).await?;
        storefront.current_user(session.id).await.map(CurrentUser)
    }
}

fn require_role(user: User, role: Role) -> StorefrontResult<User> {
    if user.role == role {
        Ok(user)
    } else {
        Err(StorefrontError::forbidden(format!("{role} role required")))
    }
}

/// Logged-in admin
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

#[async_trait]
impl FromRequestParts<Storefront> for AdminUser {
    type Rejection = StorefrontError;

    async fn from_request_parts(parts: &mut Parts, storefront: &Storefront) -> StorefrontResult<Self> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, storefront).await?;
        require_role(user, Role::Admin).map(AdminUser)
    }
}

/// Logged-in shipper
#[derive(Debug, Clone)]
pub struct ShipperUser(pub User);

#[async_trait]
impl FromRequestParts<Storefront> for ShipperUser {
    type Rejection = StorefrontError;

    async fn from_request_parts(parts: &mut Parts, storefront: &Storefront) -> StorefrontResult<Self> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, storefront).await?;
        require_role(user, Role::Shipper).map(ShipperUser)
    }
}
