//! Customer order endpoints and order chat over REST

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use shared::OrderId;

use crate::core::OrderAction;
use crate::error::StorefrontResult;
use crate::storefront_impl::Storefront;
use crate::types::{ChatPostRequest, OrderListQuery, ReasonRequest};
use crate::web::extract::{CurrentUser, ok};

pub async fn list(
    State(storefront): State<Storefront>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<OrderListQuery>,
) -> StorefrontResult<impl IntoResponse> {
    Ok(ok(storefront.customer_orders(&user, &query).await?))
}

pub async fn detail(
    State(storefront): State<Storefront>,
    CurrentUser(user): CurrentUser,
    Path(order_id): Path<OrderId>,
) -> StorefrontResult<impl IntoResponse> {
    Ok(ok(storefront.order_for(&user, order_id).await?))
}

pub async fn cancel(
    State(storefront): State<Storefront>,
    CurrentUser(user): CurrentUser,
    Path(order_id): Path<OrderId>,
    request: Option<Json<ReasonRequest>>,
) -> StorefrontResult<impl IntoResponse> {
    let Json(request) = request.unwrap_or_default();
    let order = storefront
        .transition(&user, order_id, OrderAction::Cancel { reason: request.reason })
        .await?;
    Ok(ok(order))
}

pub async fn messages(
    State(storefront): State<Storefront>,
    CurrentUser(user): CurrentUser,
    Path(order_id): Path<OrderId>,
) -> StorefrontResult<impl IntoResponse> {
    Ok(ok(storefront.chat_history(&user, order_id).await?))
}

pub async fn post_message(
    State(storefront): State<Storefront>,
    CurrentUser(user): CurrentUser,
    Path(order_id): Path<OrderId>,
    Json(request): Json<ChatPostRequest>,
) -> StorefrontResult<impl IntoResponse> {
    let message = storefront.post_message(&user, order_id, &request.body).await?;
    Ok((StatusCode::CREATED, ok(message)))
}
