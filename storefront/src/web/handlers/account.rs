//! Registration, login and profile endpoints

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::{AppendHeaders, IntoResponse},
};

use crate::error::StorefrontResult;
use crate::storefront_impl::Storefront;
use crate::types::{LoginRequest, PasswordChange, ProfileUpdate, RegisterRequest, UserView};
use crate::web::extract::{CurrentUser, SessionContext, expired_session_cookie, ok, session_cookie};

pub async fn register(
    State(storefront): State<Storefront>,
    Json(request): Json<RegisterRequest>,
) -> StorefrontResult<impl IntoResponse> {
    let user = storefront.register(request).await?;
    Ok((StatusCode::CREATED, ok(UserView::from(&user))))
}

/// Rotates the session token on success
pub async fn login(
    State(storefront): State<Storefront>,
    session: SessionContext,
    Json(request): Json<LoginRequest>,
) -> StorefrontResult<impl IntoResponse> {
    let (user, session_id) = storefront.login(session.id, request).await?;
    Ok((
        AppendHeaders([(header::SET_COOKIE, session_cookie(session_id))]),
        ok(UserView::from(&user)),
    ))
}

pub async fn logout(State(storefront): State<Storefront>, session: SessionContext) -> impl IntoResponse {
    storefront.logout(session.id).await;
    (
        AppendHeaders([(header::SET_COOKIE, expired_session_cookie())]),
        ok(serde_json::json!({ "logged_out": true })),
    )
}

pub async fn me(CurrentUser(user): CurrentUser) -> impl IntoResponse {
    ok(UserView::from(&user))
}

pub async fn update_me(
    State(storefront): State<Storefront>,
    CurrentUser(user): CurrentUser,
    Json(update): Json<ProfileUpdate>,
) -> StorefrontResult<impl IntoResponse> {
    let user = storefront.update_profile(&user, update).await?;
    Ok(ok(UserView::from(&user)))
}

pub async fn change_password(
    State(storefront): State<Storefront>,
    CurrentUser(user): CurrentUser,
    Json(change): Json<PasswordChange>,
) -> StorefrontResult<impl IntoResponse> {
    storefront.change_password(&user, change).await?;
    Ok(ok(serde_json::json!({ "password_changed": true })))
}
