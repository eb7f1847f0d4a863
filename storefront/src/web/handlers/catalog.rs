//! Public catalog endpoints

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};

use crate::core::ProductQuery;
use crate::error::StorefrontResult;
use crate::storefront_impl::Storefront;
use crate::web::extract::ok;

pub async fn categories(State(storefront): State<Storefront>) -> StorefrontResult<impl IntoResponse> {
    Ok(ok(storefront.categories().await?))
}

pub async fn products(
    State(storefront): State<Storefront>,
    Query(query): Query<ProductQuery>,
) -> StorefrontResult<impl IntoResponse> {
    Ok(ok(storefront.list_products(&query, false).await?))
}

pub async fn product_detail(
    State(storefront): State<Storefront>,
    Path(id_or_slug): Path<String>,
) -> StorefrontResult<impl IntoResponse> {
    Ok(ok(storefront.product_detail(&id_or_slug).await?))
}
