use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    dto::order_details::{
        CreateOrderDetailRequest, OrderDetailList, UpdateOrderDetailRequest,
    },
    entity::{
        order_details::{ActiveModel, Column, Entity as OrderDetails},
        orders::Entity as Orders,
        products::Entity as Products,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::OrderDetail,
    response::{ApiResponse, Meta},
    routes::params::OrderDetailListQuery,
    services::order_service::order_detail_from_entity,
    state::AppState,
};

pub async fn list_order_details(
    state: &AppState,
    user: &AuthUser,
    query: OrderDetailListQuery,
) -> AppResult<ApiResponse<OrderDetailList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination.normalize();

    let mut condition = Condition::all();
    if let Some(order_id) = query.order_id {
        condition = condition.add(Column::OrderId.eq(order_id));
    }

    let finder = OrderDetails::find()
        .filter(condition)
        .order_by_asc(Column::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_detail_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Order details",
        OrderDetailList { items },
        Some(meta),
    ))
}

pub async fn get_order_detail(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderDetail>> {
    ensure_admin(user)?;
    let detail = OrderDetails::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(order_detail_from_entity);
    let detail = match detail {
        Some(d) => d,
        None => return Err(AppError::NotFound),
    };
    Ok(ApiResponse::success("Order detail", detail, None))
}

/// Manual correction path; checkout is the normal producer of detail lines.
pub async fn create_order_detail(
    state: &AppState,
    user: &AuthUser,
    payload: CreateOrderDetailRequest,
) -> AppResult<ApiResponse<OrderDetail>> {
    ensure_admin(user)?;
    if payload.quantity <= 0 {
        return Err(AppError::Validation(
            "quantity must be greater than 0".into(),
        ));
    }

    let order = Orders::find_by_id(payload.order_id).one(&state.orm).await?;
    if order.is_none() {
        return Err(AppError::Validation("order not found".into()));
    }
    let product = Products::find_by_id(payload.product_id)
        .one(&state.orm)
        .await?;
    if product.is_none() {
        return Err(AppError::Validation("product not found".into()));
    }

    let detail = ActiveModel {
        id: Set(Uuid::new_v4()),
        order_id: Set(payload.order_id),
        product_id: Set(payload.product_id),
        quantity: Set(payload.quantity),
        subtotal: Set(payload.subtotal),
        discount: Set(payload.discount.unwrap_or(0)),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(ApiResponse::success(
        "Order detail created",
        order_detail_from_entity(detail),
        Some(Meta::empty()),
    ))
}

pub async fn update_order_detail(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderDetailRequest,
) -> AppResult<ApiResponse<OrderDetail>> {
    ensure_admin(user)?;
    let existing = OrderDetails::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(d) => d,
        None => return Err(AppError::NotFound),
    };

    let mut active: ActiveModel = existing.into();
    if let Some(quantity) = payload.quantity {
        if quantity <= 0 {
            return Err(AppError::Validation(
                "quantity must be greater than 0".into(),
            ));
        }
        active.quantity = Set(quantity);
    }
    if let Some(subtotal) = payload.subtotal {
        active.subtotal = Set(subtotal);
    }
    if let Some(discount) = payload.discount {
        active.discount = Set(discount);
    }
    active.updated_at = Set(Utc::now().into());
    let detail = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Updated",
        order_detail_from_entity(detail),
        Some(Meta::empty()),
    ))
}

pub async fn delete_order_detail(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = OrderDetails::delete_by_id(id).exec(&state.orm).await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
