//! Delivery workflow for shippers

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};

use shared::OrderId;

use crate::core::OrderAction;
use crate::error::StorefrontResult;
use crate::storefront_impl::Storefront;
use crate::types::{OrderListQuery, ReasonRequest};
use crate::web::extract::{ShipperUser, ok};

pub async fn orders(
    State(storefront): State<Storefront>,
    ShipperUser(shipper): ShipperUser,
    Query(query): Query<OrderListQuery>,
) -> StorefrontResult<impl IntoResponse> {
    Ok(ok(storefront.shipper_orders(&shipper, &query).await?))
}

pub async fn delivered(
    State(storefront): State<Storefront>,
    ShipperUser(shipper): ShipperUser,
    Path(order_id): Path<OrderId>,
) -> StorefrontResult<impl IntoResponse> {
    let order = storefront
        .transition(&shipper, order_id, OrderAction::MarkDelivered)
        .await?;
    Ok(ok(order))
}

pub async fn failed(
    State(storefront): State<Storefront>,
    ShipperUser(shipper): ShipperUser,
    Path(order_id): Path<OrderId>,
    request: Option<Json<ReasonRequest>>,
) -> StorefrontResult<impl IntoResponse> {
    let Json(request) = request.unwrap_or_default();
    let order = storefront
        .transition(&shipper, order_id, OrderAction::DeliveryFailed { reason: request.reason })
        .await?;
    Ok(ok(order))
}
