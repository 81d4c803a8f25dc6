use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::orders::{
        CreateOrderRequest, OrderList, OrderWithDetails, UpdateOrderRequest,
        UpdateOrderStatusRequest,
    },
    entity::{
        cart_items::{Column as CartCol, Entity as CartItems},
        order_details::{
            ActiveModel as OrderDetailActive, Column as OrderDetailCol, Entity as OrderDetails,
            Model as OrderDetailModel,
        },
        orders::{
            ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel,
            OrderStatus,
        },
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Order, OrderDetail},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::product_service,
    state::AppState,
};

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all().add(OrderCol::UserId.eq(user.user_id));
    if let Some(status) = query.status {
        condition = condition.add(OrderCol::Status.eq(status));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);

    let mut finder = Orders::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Ok",
        OrderList { items: orders },
        Some(meta),
    ))
}

/// Convert the caller's cart into an order. Everything — the stock
/// decrements, the order row, the detail lines and the cart clearing —
/// commits in one transaction or not at all.
pub async fn checkout(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<OrderWithDetails>> {
    let txn = state.orm.begin().await?;

    // The whole cart, not a page: a cart larger than any fixed window
    // must not be silently truncated. Ascending product id gives every
    // checkout the same product lock order, so two overlapping
    // checkouts cannot deadlock.
    let lines = CartItems::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .order_by_asc(CartCol::ProductId)
        .lock(LockType::Update)
        .all(&txn)
        .await?;

    if lines.is_empty() {
        return Err(AppError::EmptyCart);
    }

    let mut total_price: i64 = 0;
    for line in &lines {
        if line.quantity <= 0 {
            return Err(AppError::Validation(format!(
                "cart line {} has invalid quantity",
                line.id
            )));
        }
        total_price += line.price * i64::from(line.quantity);
    }

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        total_price: Set(total_price),
        status: Set(OrderStatus::Unpaid),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut details: Vec<OrderDetail> = Vec::with_capacity(lines.len());
    for line in &lines {
        // Locks the product row and fails the whole checkout when stock
        // is short; the transaction rolls back any earlier decrements.
        product_service::decrement_stock(&txn, line.product_id, line.quantity).await?;

        let detail = OrderDetailActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(line.product_id),
            quantity: Set(line.quantity),
            subtotal: Set(line.price),
            discount: Set(0),
            created_at: NotSet,
            updated_at: NotSet,
        }
        .insert(&txn)
        .await?;

        details.push(order_detail_from_entity(detail));
    }

    // The cart is consumed by the checkout.
    CartItems::delete_many()
        .filter(CartCol::UserId.eq(user.user_id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "checkout",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "total_price": total_price })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Checkout success",
        OrderWithDetails {
            order: order_from_entity(order),
            details,
        },
        Some(Meta::empty()),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithDetails>> {
    let mut condition = Condition::all().add(OrderCol::Id.eq(id));
    if user.role != "admin" {
        condition = condition.add(OrderCol::UserId.eq(user.user_id));
    }

    let order = Orders::find().filter(condition).one(&state.orm).await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let details = OrderDetails::find()
        .filter(OrderDetailCol::OrderId.eq(order.id))
        .order_by_asc(OrderDetailCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_detail_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "OK",
        OrderWithDetails {
            order: order_from_entity(order),
            details,
        },
        Some(Meta::empty()),
    ))
}

pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    let txn = state.orm.begin().await?;

    let mut condition = Condition::all().add(OrderCol::Id.eq(id));
    if user.role != "admin" {
        condition = condition.add(OrderCol::UserId.eq(user.user_id));
    }

    let order = Orders::find()
        .filter(condition)
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    validate_status_transition(order.status, payload.status)?;

    let mut active: OrderActive = order.into();
    active.status = Set(payload.status);
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "order_status_update",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "status": order.status.as_str() })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order updated",
        order_from_entity(order),
        Some(Meta::empty()),
    ))
}

/// Admin escape hatch; bypasses the cart and never touches stock.
pub async fn create_order(
    state: &AppState,
    user: &AuthUser,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;
    if payload.total_price < 0 {
        return Err(AppError::Validation(
            "total_price must not be negative".into(),
        ));
    }

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(payload.user_id),
        total_price: Set(payload.total_price),
        status: Set(OrderStatus::Unpaid),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(ApiResponse::success(
        "Order created",
        order_from_entity(order),
        Some(Meta::empty()),
    ))
}

pub async fn update_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;
    let existing = Orders::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let mut active: OrderActive = existing.into();
    if let Some(total_price) = payload.total_price {
        if total_price < 0 {
            return Err(AppError::Validation(
                "total_price must not be negative".into(),
            ));
        }
        active.total_price = Set(total_price);
    }
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Updated",
        order_from_entity(order),
        Some(Meta::empty()),
    ))
}

/// Hard delete; detail lines go with the order via the foreign key.
pub async fn delete_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = Orders::delete_by_id(id).exec(&state.orm).await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

fn validate_status_transition(current: OrderStatus, next: OrderStatus) -> Result<(), AppError> {
    match (current, next) {
        (OrderStatus::Unpaid, OrderStatus::Paid) | (OrderStatus::Unpaid, OrderStatus::Cancelled) => {
            Ok(())
        }
        (current, next) => Err(AppError::Validation(format!(
            "cannot change order status from {} to {}",
            current.as_str(),
            next.as_str()
        ))),
    }
}

pub fn order_from_entity(model: OrderModel) -> Order {
    Order {
        id: model.id,
        user_id: model.user_id,
        total_price: model.total_price,
        status: model.status,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

pub fn order_detail_from_entity(model: OrderDetailModel) -> OrderDetail {
    OrderDetail {
        id: model.id,
        order_id: model.order_id,
        product_id: model.product_id,
        quantity: model.quantity,
        subtotal: model.subtotal,
        discount: model.discount,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unpaid_orders_can_be_paid_or_cancelled() {
        assert!(validate_status_transition(OrderStatus::Unpaid, OrderStatus::Paid).is_ok());
        assert!(validate_status_transition(OrderStatus::Unpaid, OrderStatus::Cancelled).is_ok());
    }

    #[test]
    fn paid_orders_cannot_go_back_to_unpaid() {
        assert!(validate_status_transition(OrderStatus::Paid, OrderStatus::Unpaid).is_err());
        assert!(validate_status_transition(OrderStatus::Paid, OrderStatus::Cancelled).is_err());
        assert!(validate_status_transition(OrderStatus::Cancelled, OrderStatus::Paid).is_err());
    }

    #[test]
    fn same_status_is_not_a_transition() {
        assert!(validate_status_transition(OrderStatus::Unpaid, OrderStatus::Unpaid).is_err());
        assert!(validate_status_transition(OrderStatus::Paid, OrderStatus::Paid).is_err());
    }
}
