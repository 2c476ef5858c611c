mod common;

use marketplace_api::{
    dto::{
        cart::{AddToCartRequest, RemoveCartItemRequest, UpdateCartItemRequest},
        categories::{CategoryRequest, ProductCategoriesRequest},
        feedback::CreateFeedbackRequest,
        orders::{CheckoutRequest, DEFAULT_PAYMENT_METHOD},
        products::{CreateProductRequest, UpdateProductRequest},
    },
    entity::products::Entity as Products,
    error::AppError,
    routes::params::{OrderListQuery, ProductQuery},
    services::{
        cart_service, category_service, feedback_service, order_service, product_service,
    },
};
use sea_orm::EntityTrait;

fn product_request(name: &str, price: i64, stock: i32) -> CreateProductRequest {
    CreateProductRequest {
        name: name.into(),
        description: Some(format!("{name} for testing")),
        price,
        stock_quantity: stock,
        image_url: None,
        location: Some("Jakarta".into()),
    }
}

// Shopper fills a cart from one store, checks out, then leaves feedback.
#[tokio::test]
async fn cart_checkout_and_feedback_flow() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };

    let store = common::seller(&state).await?;
    let user = common::shopper(&state).await?;

    let widget = product_service::create_product(&state, &store, product_request("Widget", 1000, 10))
        .await?
        .data
        .expect("product");
    let gadget = product_service::create_product(&state, &store, product_request("Gadget", 250, 5))
        .await?
        .data
        .expect("product");

    // Empty cart cannot be checked out.
    let err = order_service::checkout(&state, &user, CheckoutRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(ref m) if m == "Cart is empty"));

    // Adding the same product twice merges into one line.
    for _ in 0..2 {
        let resp = cart_service::add_to_cart(
            &state,
            &user,
            AddToCartRequest {
                product_id: widget.id,
                quantity: 1,
            },
        )
        .await?;
        assert_eq!(resp.message, "Product added to cart successfully");
    }
    cart_service::add_to_cart(
        &state,
        &user,
        AddToCartRequest {
            product_id: gadget.id,
            quantity: 1,
        },
    )
    .await?;

    let cart = cart_service::view_cart(&state, &user).await?.data.expect("cart");
    assert_eq!(cart.items.len(), 2);
    let widget_line = cart
        .items
        .iter()
        .find(|line| line.product_id == widget.id)
        .expect("widget line");
    assert_eq!(widget_line.quantity, 2);
    assert_eq!(cart.total_price, 2 * 1000 + 250);

    // Quantity updates replace, removal drops the line.
    cart_service::update_cart_item(
        &state,
        &user,
        UpdateCartItemRequest {
            product_id: gadget.id,
            quantity: 4,
        },
    )
    .await?;
    let err = cart_service::update_cart_item(
        &state,
        &user,
        UpdateCartItemRequest {
            product_id: gadget.id,
            quantity: 0,
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.to_string(), "Invalid quantity");

    let cart = cart_service::view_cart(&state, &user).await?.data.expect("cart");
    assert_eq!(cart.total_price, 2 * 1000 + 4 * 250);

    // Price changes before checkout are picked up at checkout time.
    product_service::update_product(
        &state,
        &store,
        widget.id,
        UpdateProductRequest {
            price: Some(1200),
            ..Default::default()
        },
    )
    .await?;

    let order = order_service::checkout(
        &state,
        &user,
        CheckoutRequest {
            shipping_address: Some("2 Market Street".into()),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(order.message, "Checkout success");
    let order = order.data.expect("order");
    assert_eq!(order.order.total_price, 2 * 1200 + 4 * 250);
    assert_eq!(order.order.status, order_service::STATUS_PENDING);
    assert_eq!(order.order.payment_method, DEFAULT_PAYMENT_METHOD);
    assert_eq!(order.items.len(), 2);

    // Stock decremented, cart emptied.
    let widget_row = Products::find_by_id(widget.id).one(&state.orm).await?.expect("widget");
    let gadget_row = Products::find_by_id(gadget.id).one(&state.orm).await?.expect("gadget");
    assert_eq!(widget_row.stock_quantity, 8);
    assert_eq!(gadget_row.stock_quantity, 1);

    let cart = cart_service::view_cart(&state, &user).await?.data.expect("cart");
    assert!(cart.items.is_empty());
    assert_eq!(cart.total_price, 0);

    // Order is listed and readable by its owner.
    let listed = order_service::list_orders(&state, &user, OrderListQuery::default()).await?;
    assert_eq!(listed.meta.as_ref().and_then(|m| m.total), Some(1));
    let fetched = order_service::get_order(&state, &user, order.order.id)
        .await?
        .data
        .expect("order");
    assert_eq!(fetched.items.len(), 2);

    // Another shopper cannot see it.
    let stranger = common::shopper(&state).await?;
    let err = order_service::get_order(&state, &stranger, order.order.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    // Feedback: rating bounds, once per order.
    let err = feedback_service::create_feedback(
        &state,
        &user,
        order.order.id,
        CreateFeedbackRequest {
            rating: 6,
            comment: None,
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.to_string(), "Rating must be between 1 and 5");

    let feedback = feedback_service::create_feedback(
        &state,
        &user,
        order.order.id,
        CreateFeedbackRequest {
            rating: 5,
            comment: Some("Great".into()),
        },
    )
    .await?
    .data
    .expect("feedback");
    assert_eq!(feedback.rating, 5);

    let err = feedback_service::create_feedback(
        &state,
        &user,
        order.order.id,
        CreateFeedbackRequest {
            rating: 4,
            comment: None,
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.to_string(), "Feedback already submitted");

    let stored = feedback_service::get_feedback(&state, &user, order.order.id)
        .await?
        .data
        .expect("feedback");
    assert_eq!(stored.id, feedback.id);

    Ok(())
}

#[tokio::test]
async fn checkout_rejects_insufficient_stock_and_keeps_cart() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };

    let store = common::seller(&state).await?;
    let user = common::shopper(&state).await?;

    let scarce = product_service::create_product(&state, &store, product_request("Scarce", 500, 1))
        .await?
        .data
        .expect("product");

    cart_service::add_to_cart(
        &state,
        &user,
        AddToCartRequest {
            product_id: scarce.id,
            quantity: 3,
        },
    )
    .await?;

    let err = order_service::checkout(&state, &user, CheckoutRequest::default())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Insufficient stock for product Scarce");

    let row = Products::find_by_id(scarce.id).one(&state.orm).await?.expect("product");
    assert_eq!(row.stock_quantity, 1);

    let cart = cart_service::view_cart(&state, &user).await?.data.expect("cart");
    assert_eq!(cart.items.len(), 1);

    cart_service::remove_cart_item(
        &state,
        &user,
        RemoveCartItemRequest {
            product_id: scarce.id,
        },
    )
    .await?;
    let err = cart_service::remove_cart_item(
        &state,
        &user,
        RemoveCartItemRequest {
            product_id: scarce.id,
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.to_string(), "Product not found in cart");

    Ok(())
}

#[tokio::test]
async fn stores_manage_only_their_own_catalog() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };

    let store = common::seller(&state).await?;
    let rival = common::seller(&state).await?;
    let user = common::shopper(&state).await?;

    let product = product_service::create_product(&state, &store, product_request("Lamp", 900, 3))
        .await?
        .data
        .expect("product");

    // Shoppers cannot create products.
    let err = product_service::create_product(&state, &user, product_request("Nope", 1, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    // Another store cannot edit it.
    let err = product_service::update_product(
        &state,
        &rival,
        product.id,
        UpdateProductRequest {
            name: Some("Stolen".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let category = category_service::create_category(
        &state,
        &store,
        CategoryRequest {
            name: "Lighting".into(),
            description: None,
        },
    )
    .await?
    .data
    .expect("category");
    let foreign = category_service::create_category(
        &state,
        &rival,
        CategoryRequest {
            name: "Foreign".into(),
            description: None,
        },
    )
    .await?
    .data
    .expect("category");

    // Foreign category ids are skipped, repeats are ignored.
    let linked = category_service::add_product_categories(
        &state,
        &store,
        product.id,
        ProductCategoriesRequest {
            category_ids: vec![category.id, foreign.id, category.id],
        },
    )
    .await?
    .data
    .expect("categories");
    assert_eq!(linked.items.len(), 1);
    assert_eq!(linked.items[0].id, category.id);

    let filtered = product_service::list_products(
        &state,
        ProductQuery {
            category_id: Some(category.id),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("products");
    assert_eq!(filtered.items.len(), 1);
    assert_eq!(filtered.items[0].id, product.id);

    let detail = product_service::get_product(&state, product.id)
        .await?
        .data
        .expect("detail");
    assert_eq!(detail.categories.len(), 1);

    let unlinked = category_service::remove_product_categories(
        &state,
        &store,
        product.id,
        ProductCategoriesRequest {
            category_ids: vec![category.id],
        },
    )
    .await?
    .data
    .expect("categories");
    assert!(unlinked.items.is_empty());

    product_service::delete_product(&state, &store, product.id).await?;
    let err = product_service::get_product(&state, product.id).await.unwrap_err();
    assert_eq!(err.to_string(), "Product not found");

    Ok(())
}

#[tokio::test]
async fn concurrent_checkouts_of_one_cart_create_one_order() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };

    let store = common::seller(&state).await?;
    let user = common::shopper(&state).await?;

    let product = product_service::create_product(&state, &store, product_request("Popular", 300, 100))
        .await?
        .data
        .expect("product");
    cart_service::add_to_cart(
        &state,
        &user,
        AddToCartRequest {
            product_id: product.id,
            quantity: 2,
        },
    )
    .await?;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let state = state.clone();
        let user = user.clone();
        handles.push(tokio::spawn(async move {
            order_service::checkout(&state, &user, CheckoutRequest::default()).await
        }));
    }

    let mut succeeded = 0;
    for handle in handles {
        match handle.await? {
            Ok(_) => succeeded += 1,
            Err(err) => assert_eq!(err.to_string(), "Cart is empty"),
        }
    }
    assert_eq!(succeeded, 1);

    let row = Products::find_by_id(product.id).one(&state.orm).await?.expect("product");
    assert_eq!(row.stock_quantity, 98);

    let listed = order_service::list_orders(&state, &user, OrderListQuery::default()).await?;
    assert_eq!(listed.meta.as_ref().and_then(|m| m.total), Some(1));

    Ok(())
}

#[tokio::test]
async fn concurrent_adds_merge_into_one_line() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };

    let store = common::seller(&state).await?;
    let user = common::shopper(&state).await?;
    let product = product_service::create_product(&state, &store, product_request("Bolt", 10, 50))
        .await?
        .data
        .expect("product");

    let mut handles = Vec::new();
    for _ in 0..6 {
        let state = state.clone();
        let user = user.clone();
        handles.push(tokio::spawn(async move {
            cart_service::add_to_cart(
                &state,
                &user,
                AddToCartRequest {
                    product_id: product.id,
                    quantity: 1,
                },
            )
            .await
        }));
    }
    for handle in handles {
        handle.await??;
    }

    let cart = cart_service::view_cart(&state, &user).await?.data.expect("cart");
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 6);

    Ok(())
}

#[tokio::test]
async fn concurrent_feedback_is_accepted_once() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };

    let store = common::seller(&state).await?;
    let user = common::shopper(&state).await?;
    let product = product_service::create_product(&state, &store, product_request("Pen", 5, 5))
        .await?
        .data
        .expect("product");
    cart_service::add_to_cart(
        &state,
        &user,
        AddToCartRequest {
            product_id: product.id,
            quantity: 1,
        },
    )
    .await?;
    let order = order_service::checkout(&state, &user, CheckoutRequest::default())
        .await?
        .data
        .expect("order");

    let mut handles = Vec::new();
    for rating in 1..=5 {
        let state = state.clone();
        let user = user.clone();
        let order_id = order.order.id;
        handles.push(tokio::spawn(async move {
            feedback_service::create_feedback(
                &state,
                &user,
                order_id,
                CreateFeedbackRequest {
                    rating,
                    comment: None,
                },
            )
            .await
        }));
    }

    let mut accepted = 0;
    for handle in handles {
        match handle.await? {
            Ok(_) => accepted += 1,
            Err(err) => assert_eq!(err.to_string(), "Feedback already submitted"),
        }
    }
    assert_eq!(accepted, 1);

    Ok(())
}

#[tokio::test]
async fn huge_cart_totals_are_rejected_not_panicking() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };

    let store = common::seller(&state).await?;
    let user = common::shopper(&state).await?;
    let product = product_service::create_product(
        &state,
        &store,
        product_request("Diamond", i64::MAX / 2, 10),
    )
    .await?
    .data
    .expect("product");
    cart_service::add_to_cart(
        &state,
        &user,
        AddToCartRequest {
            product_id: product.id,
            quantity: 3,
        },
    )
    .await?;

    let err = cart_service::view_cart(&state, &user).await.unwrap_err();
    assert!(matches!(err, AppError::BadRequest(ref m) if m == "Cart total is too large"));

    let err = order_service::checkout(&state, &user, CheckoutRequest::default())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Order total is too large");

    Ok(())
}

#[tokio::test]
async fn overlong_names_are_bad_requests() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };

    let store = common::seller(&state).await?;
    let err = product_service::create_product(&state, &store, product_request(&"n".repeat(101), 1, 1))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Name must be at most 100 characters");

    let err = category_service::create_category(
        &state,
        &store,
        CategoryRequest {
            name: "c".repeat(101),
            description: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    Ok(())
}
