use axum_storefront_api::{
    dto::cart::AddToCartRequest,
    entity::products::Entity as Products,
    services::{cart_service, order_service},
};
use sea_orm::EntityTrait;

mod common;

// Two checkouts race for the last unit; the product row lock serializes
// them, so exactly one wins and stock never goes negative.
#[tokio::test]
async fn concurrent_checkouts_cannot_oversell() -> anyhow::Result<()> {
    let state = match common::setup_state().await? {
        Some(state) => state,
        None => return Ok(()),
    };

    let first = common::create_user(&state, "user", "first@example.com").await?;
    let second = common::create_user(&state, "user", "second@example.com").await?;
    let product = common::create_product(&state, None, "Last Unit", 100, 1).await?;

    for shopper in [&first, &second] {
        cart_service::add_to_cart(
            &state.pool,
            shopper,
            AddToCartRequest {
                product_id: product,
                quantity: 1,
            },
        )
        .await?;
    }

    let (r1, r2) = tokio::join!(
        order_service::checkout(&state, &first),
        order_service::checkout(&state, &second),
    );

    assert!(
        r1.is_ok() != r2.is_ok(),
        "exactly one of the two checkouts must win, got {:?} / {:?}",
        r1.as_ref().err(),
        r2.as_ref().err()
    );

    let stock = Products::find_by_id(product)
        .one(&state.orm)
        .await?
        .expect("product exists")
        .stock;
    assert_eq!(stock, 0);

    Ok(())
}
