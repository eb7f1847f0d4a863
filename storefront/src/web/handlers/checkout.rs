//! Checkout and payment gateway endpoints

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::error::StorefrontResult;
use crate::storefront_impl::Storefront;
use crate::types::{CheckoutRequest, DevPaymentRequest, PaymentCallback};
use crate::web::extract::{CurrentUser, SessionContext, ok};

pub async fn checkout(
    State(storefront): State<Storefront>,
    session: SessionContext,
    CurrentUser(user): CurrentUser,
    Json(request): Json<CheckoutRequest>,
) -> StorefrontResult<impl IntoResponse> {
    let response = storefront.checkout(session.id, &user, request).await?;
    Ok((StatusCode::CREATED, ok(response)))
}

/// Where the gateway redirects the customer after payment
pub async fn payment_callback(
    State(storefront): State<Storefront>,
    Query(callback): Query<PaymentCallback>,
) -> StorefrontResult<impl IntoResponse> {
    Ok(ok(storefront.payment_callback(callback).await?))
}

pub async fn dev_complete(
    State(storefront): State<Storefront>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<DevPaymentRequest>,
) -> StorefrontResult<impl IntoResponse> {
    Ok(ok(storefront.dev_complete_payment(&user, request).await?))
}
