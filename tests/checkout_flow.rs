use axum_storefront_api::{
    dto::cart::AddToCartRequest,
    entity::{
        cart_items::{Column as CartCol, Entity as CartItems},
        orders::{Column as OrderCol, Entity as Orders},
        products::Entity as Products,
    },
    error::AppError,
    models::OrderStatus,
    services::{cart_service, order_service},
    state::AppState,
};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use uuid::Uuid;

mod common;

// Integration flow: cart lines become an order with detail lines, stock
// drops and the cart is emptied; a short-stocked line aborts everything;
// an empty cart never creates an order.
#[tokio::test]
async fn checkout_flow() -> anyhow::Result<()> {
    let state = match common::setup_state().await? {
        Some(state) => state,
        None => return Ok(()),
    };

    successful_checkout_consumes_cart(&state).await?;
    short_stock_aborts_the_whole_checkout(&state).await?;
    empty_cart_creates_no_order(&state).await?;

    Ok(())
}

async fn successful_checkout_consumes_cart(state: &AppState) -> anyhow::Result<()> {
    let shopper = common::create_user(state, "user", "shopper@example.com").await?;
    let category = common::create_category(state, "Gadgets").await?;
    let product_a = common::create_product(state, Some(category), "Widget A", 100, 5).await?;
    let product_b = common::create_product(state, Some(category), "Widget B", 50, 1).await?;

    cart_service::add_to_cart(
        &state.pool,
        &shopper,
        AddToCartRequest {
            product_id: product_a,
            quantity: 2,
        },
    )
    .await?;
    cart_service::add_to_cart(
        &state.pool,
        &shopper,
        AddToCartRequest {
            product_id: product_b,
            quantity: 1,
        },
    )
    .await?;

    let resp = order_service::checkout(state, &shopper).await?;
    let data = resp.data.expect("checkout payload");

    assert_eq!(data.order.total_price, 250);
    assert_eq!(data.order.status, OrderStatus::Unpaid);
    assert_eq!(data.details.len(), 2);

    let detail_a = data
        .details
        .iter()
        .find(|d| d.product_id == product_a)
        .expect("detail line for product A");
    assert_eq!(detail_a.quantity, 2);
    assert_eq!(detail_a.subtotal, 100);
    assert_eq!(detail_a.discount, 0);

    let detail_b = data
        .details
        .iter()
        .find(|d| d.product_id == product_b)
        .expect("detail line for product B");
    assert_eq!(detail_b.quantity, 1);
    assert_eq!(detail_b.subtotal, 50);

    assert_eq!(stock_of(state, product_a).await?, 3);
    assert_eq!(stock_of(state, product_b).await?, 0);

    // The cart is consumed by a successful checkout.
    assert_eq!(cart_count(state, shopper.user_id).await?, 0);

    Ok(())
}

async fn short_stock_aborts_the_whole_checkout(state: &AppState) -> anyhow::Result<()> {
    let shopper = common::create_user(state, "user", "shopper2@example.com").await?;
    let product_a = common::create_product(state, None, "Widget A2", 100, 5).await?;
    let product_b = common::create_product(state, None, "Widget B2", 50, 0).await?;

    cart_service::add_to_cart(
        &state.pool,
        &shopper,
        AddToCartRequest {
            product_id: product_a,
            quantity: 2,
        },
    )
    .await?;
    cart_service::add_to_cart(
        &state.pool,
        &shopper,
        AddToCartRequest {
            product_id: product_b,
            quantity: 1,
        },
    )
    .await?;

    let err = order_service::checkout(state, &shopper)
        .await
        .expect_err("checkout must fail on short stock");
    match err {
        AppError::InsufficientStock(id) => assert_eq!(id, product_b),
        other => panic!("expected InsufficientStock, got {other:?}"),
    }

    // Nothing moved: stock, orders and the cart are as before.
    assert_eq!(stock_of(state, product_a).await?, 5);
    assert_eq!(stock_of(state, product_b).await?, 0);
    assert_eq!(order_count(state, shopper.user_id).await?, 0);
    assert_eq!(cart_count(state, shopper.user_id).await?, 2);

    Ok(())
}

async fn empty_cart_creates_no_order(state: &AppState) -> anyhow::Result<()> {
    let shopper = common::create_user(state, "user", "shopper3@example.com").await?;

    let err = order_service::checkout(state, &shopper)
        .await
        .expect_err("empty cart must be rejected");
    assert!(matches!(err, AppError::EmptyCart));

    assert_eq!(order_count(state, shopper.user_id).await?, 0);

    Ok(())
}

async fn stock_of(state: &AppState, id: Uuid) -> anyhow::Result<i32> {
    let product = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .expect("product exists");
    Ok(product.stock)
}

async fn cart_count(state: &AppState, user_id: Uuid) -> anyhow::Result<u64> {
    Ok(CartItems::find()
        .filter(CartCol::UserId.eq(user_id))
        .count(&state.orm)
        .await?)
}

async fn order_count(state: &AppState, user_id: Uuid) -> anyhow::Result<u64> {
    Ok(Orders::find()
        .filter(OrderCol::UserId.eq(user_id))
        .count(&state.orm)
        .await?)
}
