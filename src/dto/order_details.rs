use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::OrderDetail;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderDetailRequest {
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub subtotal: i64,
    pub discount: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderDetailRequest {
    pub quantity: Option<i32>,
    pub subtotal: Option<i64>,
    pub discount: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct OrderDetailList {
    #[schema(value_type = Vec<OrderDetail>)]
    pub items: Vec<OrderDetail>,
}
