//! Session cart endpoints; anonymous visitors have carts too

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use shared::ProductId;

use crate::error::StorefrontResult;
use crate::storefront_impl::Storefront;
use crate::types::{CartAddRequest, CartUpdateRequest};
use crate::web::extract::{SessionContext, ok};

pub async fn view(State(storefront): State<Storefront>, session: SessionContext) -> StorefrontResult<impl IntoResponse> {
    Ok(ok(storefront.cart_view(session.id).await?))
}

pub async fn add_item(
    State(storefront): State<Storefront>,
    session: SessionContext,
    Json(request): Json<CartAddRequest>,
) -> StorefrontResult<impl IntoResponse> {
    let cart = storefront
        .add_to_cart(session.id, request.product_id, request.quantity)
        .await?;
    Ok(ok(cart))
}

pub async fn update_item(
    State(storefront): State<Storefront>,
    session: SessionContext,
    Path(product_id): Path<ProductId>,
    Json(request): Json<CartUpdateRequest>,
) -> StorefrontResult<impl IntoResponse> {
    let cart = storefront
        .update_cart_item(session.id, product_id, request.quantity)
        .await?;
    Ok(ok(cart))
}

pub async fn remove_item(
    State(storefront): State<Storefront>,
    session: SessionContext,
    Path(product_id): Path<ProductId>,
) -> StorefrontResult<impl IntoResponse> {
    Ok(ok(storefront.remove_cart_item(session.id, product_id).await?))
}

pub async fn clear(State(storefront): State<Storefront>, session: SessionContext) -> StorefrontResult<impl IntoResponse> {
    Ok(ok(storefront.clear_cart(session.id).await?))
}
