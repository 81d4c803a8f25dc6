use axum_storefront_api::{
    dto::{
        cart::AddToCartRequest, orders::UpdateOrderStatusRequest, payments::CreatePaymentRequest,
    },
    error::AppError,
    models::OrderStatus,
    services::{cart_service, order_service, payment_service},
};

mod common;

// Paying an order flips it to paid in the same transaction; a paid order
// cannot be paid again or pushed back to unpaid.
#[tokio::test]
async fn payment_flow() -> anyhow::Result<()> {
    let state = match common::setup_state().await? {
        Some(state) => state,
        None => return Ok(()),
    };

    let shopper = common::create_user(&state, "user", "payer@example.com").await?;
    let product = common::create_product(&state, None, "Payable Widget", 120, 3).await?;

    cart_service::add_to_cart(
        &state.pool,
        &shopper,
        AddToCartRequest {
            product_id: product,
            quantity: 2,
        },
    )
    .await?;

    let order = order_service::checkout(&state, &shopper)
        .await?
        .data
        .expect("checkout payload")
        .order;
    assert_eq!(order.total_price, 240);
    assert_eq!(order.status, OrderStatus::Unpaid);

    // Amount must match the order total.
    let err = payment_service::create_payment(
        &state,
        &shopper,
        CreatePaymentRequest {
            order_id: order.id,
            payment_method: "bank_transfer".into(),
            amount: 100,
        },
    )
    .await
    .expect_err("mismatched amount must be rejected");
    assert!(matches!(err, AppError::Validation(_)));

    let payment = payment_service::create_payment(
        &state,
        &shopper,
        CreatePaymentRequest {
            order_id: order.id,
            payment_method: "bank_transfer".into(),
            amount: 240,
        },
    )
    .await?
    .data
    .expect("payment payload");
    assert_eq!(payment.amount, 240);

    let paid = order_service::get_order(&state, &shopper, order.id)
        .await?
        .data
        .expect("order payload")
        .order;
    assert_eq!(paid.status, OrderStatus::Paid);

    // A paid order is no longer payable.
    let err = payment_service::create_payment(
        &state,
        &shopper,
        CreatePaymentRequest {
            order_id: order.id,
            payment_method: "cash".into(),
            amount: 240,
        },
    )
    .await
    .expect_err("paying a paid order must fail");
    assert!(matches!(err, AppError::Validation(_)));

    // paid -> unpaid is not a legal transition.
    let err = order_service::update_order_status(
        &state,
        &shopper,
        order.id,
        UpdateOrderStatusRequest {
            status: OrderStatus::Unpaid,
        },
    )
    .await
    .expect_err("paid orders cannot go back to unpaid");
    assert!(matches!(err, AppError::Validation(_)));

    // A fresh unpaid order can still be cancelled.
    cart_service::add_to_cart(
        &state.pool,
        &shopper,
        AddToCartRequest {
            product_id: product,
            quantity: 1,
        },
    )
    .await?;
    let cancellable = order_service::checkout(&state, &shopper)
        .await?
        .data
        .expect("checkout payload")
        .order;
    let cancelled = order_service::update_order_status(
        &state,
        &shopper,
        cancellable.id,
        UpdateOrderStatusRequest {
            status: OrderStatus::Cancelled,
        },
    )
    .await?
    .data
    .expect("order payload");
    assert_eq!(cancelled.status, OrderStatus::Cancelled);

    Ok(())
}
