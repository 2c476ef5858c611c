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
        auth::{LoginRequest, LoginResponse, Role},
        cart::{AddToCartRequest, CartLine, CartView, RemoveCartItemRequest, UpdateCartItemRequest},
        categories::{CategoryList, CategoryRequest, ProductCategoriesRequest},
        feedback::CreateFeedbackRequest,
        orders::{CheckoutRequest, OrderList, OrderWithItems},
        products::{CreateProductRequest, ProductDetail, ProductList, UpdateProductRequest},
        stores::{RegisterStoreRequest, UpdateStoreRequest},
        users::{RegisterUserRequest, UpdateProfileRequest},
    },
    models::{CartItem, Category, Feedback, Order, OrderItem, Product, Store, User},
    response::{ApiResponse, Meta},
    routes::{cart, categories, health, orders, params, products, stores, users},
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
        users::register,
        users::login,
        users::logout,
        users::profile,
        users::update_profile,
        stores::register,
        stores::login,
        stores::logout,
        stores::me,
        stores::update_me,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        products::list_product_categories,
        products::add_product_categories,
        products::remove_product_categories,
        categories::create_category,
        categories::list_categories,
        categories::get_category,
        categories::update_category,
        categories::delete_category,
        cart::add_to_cart,
        cart::view_cart,
        cart::update_cart_item,
        cart::remove_cart_item,
        orders::checkout,
        orders::list_orders,
        orders::get_order,
        orders::create_feedback,
        orders::get_feedback
    ),
    components(
        schemas(
            User,
            Store,
            Product,
            Category,
            CartItem,
            Order,
            OrderItem,
            Feedback,
            Role,
            LoginRequest,
            LoginResponse,
            RegisterUserRequest,
            UpdateProfileRequest,
            RegisterStoreRequest,
            UpdateStoreRequest,
            CreateProductRequest,
            UpdateProductRequest,
            ProductList,
            ProductDetail,
            CategoryRequest,
            CategoryList,
            ProductCategoriesRequest,
            AddToCartRequest,
            UpdateCartItemRequest,
            RemoveCartItemRequest,
            CartLine,
            CartView,
            CheckoutRequest,
            OrderList,
            OrderWithItems,
            CreateFeedbackRequest,
            params::Pagination,
            params::SortOrder,
            params::ProductSortBy,
            Meta,
            ApiResponse<User>,
            ApiResponse<Store>,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<ProductDetail>,
            ApiResponse<CategoryList>,
            ApiResponse<CartView>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<Feedback>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Users", description = "Shopper accounts"),
        (name = "Stores", description = "Seller accounts"),
        (name = "Products", description = "Product catalogue"),
        (name = "Categories", description = "Store categories"),
        (name = "Cart", description = "Shopping cart"),
        (name = "Orders", description = "Checkout and orders"),
        (name = "Feedback", description = "Order feedback"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
