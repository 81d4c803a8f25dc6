use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::order_details::{
        CreateOrderDetailRequest, OrderDetailList, UpdateOrderDetailRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::OrderDetail,
    response::ApiResponse,
    routes::params::OrderDetailListQuery,
    services::order_detail_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_order_details).post(create_order_detail))
        .route(
            "/{id}",
            get(get_order_detail)
                .put(update_order_detail)
                .delete(delete_order_detail),
        )
}

#[utoipa::path(
    get,
    path = "/api/order-details",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("order_id" = Option<Uuid>, Query, description = "Filter by order")
    ),
    responses(
        (status = 200, description = "List order details", body = ApiResponse<OrderDetailList>)
    ),
    security(("bearer_auth" = [])),
    tag = "OrderDetails"
)]
pub async fn list_order_details(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderDetailListQuery>,
) -> AppResult<Json<ApiResponse<OrderDetailList>>> {
    let resp = order_detail_service::list_order_details(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/order-details/{id}",
    security(("bearer_auth" = [])),
    tag = "OrderDetails"
)]
pub async fn get_order_detail(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderDetail>>> {
    let resp = order_detail_service::get_order_detail(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/order-details",
    request_body = CreateOrderDetailRequest,
    security(("bearer_auth" = [])),
    tag = "OrderDetails"
)]
pub async fn create_order_detail(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateOrderDetailRequest>,
) -> AppResult<Json<ApiResponse<OrderDetail>>> {
    let resp = order_detail_service::create_order_detail(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/order-details/{id}",
    request_body = UpdateOrderDetailRequest,
    security(("bearer_auth" = [])),
    tag = "OrderDetails"
)]
pub async fn update_order_detail(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderDetailRequest>,
) -> AppResult<Json<ApiResponse<OrderDetail>>> {
    let resp = order_detail_service::update_order_detail(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/order-details/{id}",
    security(("bearer_auth" = [])),
    tag = "OrderDetails"
)]
pub async fn delete_order_detail(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = order_detail_service::delete_order_detail(&state, &user, id).await?;
    Ok(Json(resp))
}
