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
    dto::payments::{CreatePaymentRequest, PaymentList, UpdatePaymentRequest},
    entity::{
        orders::{ActiveModel as OrderActive, Entity as Orders, OrderStatus},
        payments::{ActiveModel, Column, Entity as Payments, Model as PaymentModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Payment,
    response::{ApiResponse, Meta},
    routes::params::PaymentListQuery,
    state::AppState,
};

pub async fn list_payments(
    state: &AppState,
    user: &AuthUser,
    query: PaymentListQuery,
) -> AppResult<ApiResponse<PaymentList>> {
    let (page, limit, offset) = query.pagination.normalize();

    let mut condition = Condition::all().add(Column::UserId.eq(user.user_id));
    if let Some(order_id) = query.order_id {
        condition = condition.add(Column::OrderId.eq(order_id));
    }

    let finder = Payments::find()
        .filter(condition)
        .order_by_desc(Column::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(payment_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Payments",
        PaymentList { items },
        Some(meta),
    ))
}

pub async fn get_payment(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Payment>> {
    let mut condition = Condition::all().add(Column::Id.eq(id));
    if user.role != "admin" {
        condition = condition.add(Column::UserId.eq(user.user_id));
    }

    let payment = Payments::find()
        .filter(condition)
        .one(&state.orm)
        .await?
        .map(payment_from_entity);
    let payment = match payment {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };
    Ok(ApiResponse::success("Payment", payment, None))
}

/// Recording a payment marks its order paid in the same transaction, so
/// the payment table and the order status cannot disagree.
pub async fn create_payment(
    state: &AppState,
    user: &AuthUser,
    payload: CreatePaymentRequest,
) -> AppResult<ApiResponse<Payment>> {
    if payload.payment_method.trim().is_empty() {
        return Err(AppError::Validation(
            "payment_method must not be empty".into(),
        ));
    }

    let txn = state.orm.begin().await?;

    let order = Orders::find_by_id(payload.order_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    if order.user_id != user.user_id {
        return Err(AppError::Forbidden);
    }
    if order.status != OrderStatus::Unpaid {
        return Err(AppError::Validation(format!(
            "order is {}, not payable",
            order.status.as_str()
        )));
    }
    if payload.amount != order.total_price {
        return Err(AppError::Validation(
            "payment amount does not match order total".into(),
        ));
    }

    let payment = ActiveModel {
        id: Set(Uuid::new_v4()),
        order_id: Set(order.id),
        user_id: Set(user.user_id),
        payment_method: Set(payload.payment_method),
        amount: Set(payload.amount),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut active: OrderActive = order.into();
    active.status = Set(OrderStatus::Paid);
    active.updated_at = Set(Utc::now().into());
    active.update(&txn).await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "payment_create",
        Some("payments"),
        Some(serde_json::json!({ "payment_id": payment.id, "order_id": payment.order_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Payment recorded",
        payment_from_entity(payment),
        Some(Meta::empty()),
    ))
}

/// Correction path only; never re-derives the order status.
pub async fn update_payment(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdatePaymentRequest,
) -> AppResult<ApiResponse<Payment>> {
    ensure_admin(user)?;
    let existing = Payments::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    let mut active: ActiveModel = existing.into();
    if let Some(payment_method) = payload.payment_method {
        if payment_method.trim().is_empty() {
            return Err(AppError::Validation(
                "payment_method must not be empty".into(),
            ));
        }
        active.payment_method = Set(payment_method);
    }
    if let Some(amount) = payload.amount {
        active.amount = Set(amount);
    }
    active.updated_at = Set(Utc::now().into());
    let payment = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Updated",
        payment_from_entity(payment),
        Some(Meta::empty()),
    ))
}

pub async fn delete_payment(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = Payments::delete_by_id(id).exec(&state.orm).await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

fn payment_from_entity(model: PaymentModel) -> Payment {
    Payment {
        id: model.id,
        order_id: model.order_id,
        user_id: model.user_id,
        payment_method: model.payment_method,
        amount: model.amount,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
