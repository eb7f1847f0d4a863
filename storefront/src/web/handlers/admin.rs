//! Back-office endpoints; every handler requires the admin role

use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use shared::{CategoryId, OrderId, ProductId, UserId};

use crate::core::{OrderAction, ProductQuery};
use crate::error::{StorefrontError, StorefrontResult};
use crate::storefront_impl::Storefront;
use crate::types::{
    AssignShipperRequest, CategoryPayload, OrderListQuery, ProductPayload, ReasonRequest, RoleRequest, UserListQuery,
};
use crate::web::extract::{AdminUser, ok};

const IMAGE_FIELD: &str = "image";

pub async fn dashboard(
    State(storefront): State<Storefront>,
    AdminUser(_admin): AdminUser,
) -> StorefrontResult<impl IntoResponse> {
    Ok(ok(storefront.dashboard().await?))
}

// Categories

pub async fn categories(
    State(storefront): State<Storefront>,
    AdminUser(_admin): AdminUser,
) -> StorefrontResult<impl IntoResponse> {
    Ok(ok(storefront.categories().await?))
}

pub async fn create_category(
    State(storefront): State<Storefront>,
    AdminUser(_admin): AdminUser,
    Json(payload): Json<CategoryPayload>,
) -> StorefrontResult<impl IntoResponse> {
    let category = storefront.create_category(payload).await?;
    Ok((StatusCode::CREATED, ok(category)))
}

pub async fn update_category(
    State(storefront): State<Storefront>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<CategoryId>,
    Json(payload): Json<CategoryPayload>,
) -> StorefrontResult<impl IntoResponse> {
    Ok(ok(storefront.update_category(id, payload).await?))
}

pub async fn delete_category(
    State(storefront): State<Storefront>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<CategoryId>,
) -> StorefrontResult<impl IntoResponse> {
    storefront.delete_category(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Products

/// All products, inactive included
pub async fn products(
    State(storefront): State<Storefront>,
    AdminUser(_admin): AdminUser,
    Query(query): Query<ProductQuery>,
) -> StorefrontResult<impl IntoResponse> {
    Ok(ok(storefront.list_products(&query, true).await?))
}

pub async fn create_product(
    State(storefront): State<Storefront>,
    AdminUser(_admin): AdminUser,
    Json(payload): Json<ProductPayload>,
) -> StorefrontResult<impl IntoResponse> {
    let product = storefront.create_product(payload).await?;
    Ok((StatusCode::CREATED, ok(product)))
}

pub async fn update_product(
    State(storefront): State<Storefront>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<ProductId>,
    Json(payload): Json<ProductPayload>,
) -> StorefrontResult<impl IntoResponse> {
    Ok(ok(storefront.update_product(id, payload).await?))
}

pub async fn delete_product(
    State(storefront): State<Storefront>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<ProductId>,
) -> StorefrontResult<impl IntoResponse> {
    storefront.delete_product(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Multipart upload; the file goes in the `image` field
pub async fn upload_image(
    State(storefront): State<Storefront>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<ProductId>,
    mut multipart: Multipart,
) -> StorefrontResult<impl IntoResponse> {
    let upload_error = |e: axum::extract::multipart::MultipartError| StorefrontError::Upload {
        details: e.to_string(),
    };

    while let Some(field) = multipart.next_field().await.map_err(upload_error)? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(upload_error)?;
        let product = storefront.set_product_image(id, &file_name, bytes.to_vec()).await?;
        return Ok(ok(product));
    }

    Err(StorefrontError::Upload {
        details: format!("multipart field {IMAGE_FIELD:?} is missing"),
    })
}

// Orders

pub async fn orders(
    State(storefront): State<Storefront>,
    AdminUser(_admin): AdminUser,
    Query(query): Query<OrderListQuery>,
) -> StorefrontResult<impl IntoResponse> {
    Ok(ok(storefront.admin_orders(&query).await?))
}

pub async fn order_detail(
    State(storefront): State<Storefront>,
    AdminUser(admin): AdminUser,
    Path(order_id): Path<OrderId>,
) -> StorefrontResult<impl IntoResponse> {
    Ok(ok(storefront.order_for(&admin, order_id).await?))
}

pub async fn confirm_order(
    State(storefront): State<Storefront>,
    AdminUser(admin): AdminUser,
    Path(order_id): Path<OrderId>,
) -> StorefrontResult<impl IntoResponse> {
    Ok(ok(storefront.transition(&admin, order_id, OrderAction::Confirm).await?))
}

pub async fn assign_shipper(
    State(storefront): State<Storefront>,
    AdminUser(admin): AdminUser,
    Path(order_id): Path<OrderId>,
    Json(request): Json<AssignShipperRequest>,
) -> StorefrontResult<impl IntoResponse> {
    let action = OrderAction::AssignShipper {
        shipper_id: request.shipper_id,
    };
    Ok(ok(storefront.transition(&admin, order_id, action).await?))
}

pub async fn cancel_order(
    State(storefront): State<Storefront>,
    AdminUser(admin): AdminUser,
    Path(order_id): Path<OrderId>,
    request: Option<Json<ReasonRequest>>,
) -> StorefrontResult<impl IntoResponse> {
    let Json(request) = request.unwrap_or_default();
    let action = OrderAction::Cancel { reason: request.reason };
    Ok(ok(storefront.transition(&admin, order_id, action).await?))
}

pub async fn mark_delivered(
    State(storefront): State<Storefront>,
    AdminUser(admin): AdminUser,
    Path(order_id): Path<OrderId>,
) -> StorefrontResult<impl IntoResponse> {
    Ok(ok(storefront.transition(&admin, order_id, OrderAction::MarkDelivered).await?))
}

// Users

pub async fn users(
    State(storefront): State<Storefront>,
    AdminUser(_admin): AdminUser,
    Query(query): Query<UserListQuery>,
) -> StorefrontResult<impl IntoResponse> {
    Ok(ok(storefront.list_users(&query).await?))
}

pub async fn set_role(
    State(storefront): State<Storefront>,
    AdminUser(admin): AdminUser,
    Path(user_id): Path<UserId>,
    Json(request): Json<RoleRequest>,
) -> StorefrontResult<impl IntoResponse> {
    Ok(ok(storefront.set_role(&admin, user_id, request.role).await?))
}

pub async fn lock_user(
    State(storefront): State<Storefront>,
    AdminUser(admin): AdminUser,
    Path(user_id): Path<UserId>,
) -> StorefrontResult<impl IntoResponse> {
    Ok(ok(storefront.set_locked(&admin, user_id, true).await?))
}

pub async fn unlock_user(
    State(storefront): State<Storefront>,
    AdminUser(admin): AdminUser,
    Path(user_id): Path<UserId>,
) -> StorefrontResult<impl IntoResponse> {
    Ok(ok(storefront.set_locked(&admin, user_id, false).await?))
}

pub async fn shippers(
    State(storefront): State<Storefront>,
    AdminUser(_admin): AdminUser,
) -> StorefrontResult<impl IntoResponse> {
    Ok(ok(storefront.shippers().await?))
}
