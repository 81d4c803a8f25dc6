use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        cart::{CartLineDto, CartList},
        categories::CategoryList,
        order_details::OrderDetailList,
        orders::{OrderList, OrderWithDetails},
        payments::PaymentList,
        products::ProductList,
    },
    models::{CartLine, Category, Order, OrderDetail, OrderStatus, Payment, Product, User},
    response::{ApiResponse, Meta},
    routes::{
        auth, cart, categories, health, order_details, orders, params, payments, products, users,
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        users::me,
        users::update_profile,
        users::update_password,
        categories::list_categories,
        categories::get_category,
        categories::create_category,
        categories::update_category,
        categories::delete_category,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        cart::cart_list,
        cart::add_to_cart,
        cart::update_cart_line,
        cart::remove_cart_line,
        orders::list_orders,
        orders::checkout,
        orders::get_order,
        orders::update_order_status,
        orders::create_order,
        orders::update_order,
        orders::delete_order,
        order_details::list_order_details,
        order_details::get_order_detail,
        order_details::create_order_detail,
        order_details::update_order_detail,
        order_details::delete_order_detail,
        payments::list_payments,
        payments::get_payment,
        payments::create_payment,
        payments::update_payment,
        payments::delete_payment
    ),
    components(
        schemas(
            User,
            Category,
            Product,
            CartLine,
            CartLineDto,
            Order,
            OrderDetail,
            OrderStatus,
            Payment,
            CategoryList,
            ProductList,
            CartList,
            OrderList,
            OrderWithDetails,
            OrderDetailList,
            PaymentList,
            params::Pagination,
            params::ProductQuery,
            params::OrderListQuery,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<OrderWithDetails>,
            ApiResponse<OrderList>,
            ApiResponse<CartList>,
            ApiResponse<PaymentList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Users", description = "User profile endpoints"),
        (name = "Categories", description = "Category endpoints"),
        (name = "Products", description = "Product endpoints"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Orders", description = "Order and checkout endpoints"),
        (name = "OrderDetails", description = "Order detail endpoints"),
        (name = "Payments", description = "Payment endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
