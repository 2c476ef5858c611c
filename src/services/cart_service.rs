use sea_orm::sea_query::{LockType, OnConflict};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, ConnectionTrait, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::cart::{AddToCartRequest, CartLine, CartView, RemoveCartItemRequest, UpdateCartItemRequest},
    entity::{
        Products,
        cart_items::{ActiveModel as CartItemActive, Column as CartItemCol, Entity as CartItems, Model as CartItemModel},
        carts::{ActiveModel as CartActive, Column as CartCol, Entity as Carts, Model as CartModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_user},
    models::CartItem,
    response::ApiResponse,
    state::AppState,
};

pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartItem>> {
    ensure_user(user)?;
    validate_quantity(payload.quantity)?;

    let txn = state.orm.begin().await?;

    let product = Products::find_by_id(payload.product_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;

    let cart = find_or_create_cart(&txn, user.id).await?;

    let existing = CartItems::find()
        .filter(CartItemCol::CartId.eq(cart.id))
        .filter(CartItemCol::ProductId.eq(product.id))
        .one(&txn)
        .await?;

    let cart_item = match existing {
        Some(item) => {
            let quantity = item
                .quantity
                .checked_add(payload.quantity)
                .ok_or_else(|| AppError::BadRequest("Invalid quantity".into()))?;
            let mut active: CartItemActive = item.into();
            active.quantity = Set(quantity);
            active.update(&txn).await?
        }
        None => {
            CartItemActive {
                id: Set(Uuid::new_v4()),
                cart_id: Set(cart.id),
                product_id: Set(product.id),
                quantity: Set(payload.quantity),
                price: Set(product.price),
                created_at: NotSet,
            }
            .insert(&txn)
            .await?
        }
    };

    txn.commit().await?;

    audit::record(
        &state.pool,
        user.id,
        "cart_add",
        "cart_items",
        serde_json::json!({ "product_id": payload.product_id, "quantity": payload.quantity }),
    )
    .await;

    Ok(ApiResponse::ok(
        "Product added to cart successfully",
        CartItem::from(cart_item),
    ))
}

pub async fn view_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartView>> {
    ensure_user(user)?;

    let Some(cart) = Carts::find()
        .filter(CartCol::UserId.eq(user.id))
        .one(&state.orm)
        .await?
    else {
        return Ok(ApiResponse::ok(
            "Cart is empty",
            CartView {
                cart_id: None,
                items: Vec::new(),
                total_price: 0,
            },
        ));
    };

    let rows = CartItems::find()
        .filter(CartItemCol::CartId.eq(cart.id))
        .order_by_asc(CartItemCol::CreatedAt)
        .find_also_related(Products)
        .all(&state.orm)
        .await?;

    let mut items: Vec<CartLine> = Vec::with_capacity(rows.len());
    for (item, product) in rows {
        let Some(product) = product else { continue };
        items.push(CartLine {
            product_id: item.product_id,
            total_price: line_total(product.price, item.quantity)?,
            product_name: product.name,
            quantity: item.quantity,
            price: product.price,
        });
    }

    let total_price = cart_total(&items)?;
    let message = if items.is_empty() { "Cart is empty" } else { "OK" };

    Ok(ApiResponse::ok(
        message,
        CartView {
            cart_id: Some(cart.id),
            items,
            total_price,
        },
    ))
}

pub async fn update_cart_item(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateCartItemRequest,
) -> AppResult<ApiResponse<CartItem>> {
    ensure_user(user)?;
    validate_quantity(payload.quantity)?;

    let item = find_cart_item(state, user.id, payload.product_id).await?;
    let mut active: CartItemActive = item.into();
    active.quantity = Set(payload.quantity);
    let item = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        user.id,
        "cart_update",
        "cart_items",
        serde_json::json!({ "product_id": payload.product_id, "quantity": payload.quantity }),
    )
    .await;

    Ok(ApiResponse::ok(
        "Cart item updated successfully",
        CartItem::from(item),
    ))
}

pub async fn remove_cart_item(
    state: &AppState,
    user: &AuthUser,
    payload: RemoveCartItemRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_user(user)?;

    let item = find_cart_item(state, user.id, payload.product_id).await?;
    CartItems::delete_by_id(item.id).exec(&state.orm).await?;

    audit::record(
        &state.pool,
        user.id,
        "cart_remove",
        "cart_items",
        serde_json::json!({ "product_id": payload.product_id }),
    )
    .await;

    Ok(ApiResponse::message("Cart item removed successfully"))
}

pub fn validate_quantity(quantity: i32) -> AppResult<()> {
    if quantity <= 0 {
        return Err(AppError::BadRequest("Invalid quantity".into()));
    }
    Ok(())
}

fn total_too_large() -> AppError {
    AppError::BadRequest("Cart total is too large".into())
}

/// price × quantity, 400 on overflow.
pub fn line_total(price: i64, quantity: i32) -> AppResult<i64> {
    price
        .checked_mul(i64::from(quantity))
        .ok_or_else(total_too_large)
}

pub fn cart_total(lines: &[CartLine]) -> AppResult<i64> {
    lines
        .iter()
        .try_fold(0_i64, |total, line| total.checked_add(line.total_price))
        .ok_or_else(total_too_large)
}

/// The user's cart, created when missing and row-locked until the enclosing
/// transaction ends. Adds and checkouts for one user queue on this lock.
async fn find_or_create_cart<C: ConnectionTrait>(db: &C, user_id: Uuid) -> AppResult<CartModel> {
    let inserted = Carts::insert(CartActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        created_at: NotSet,
    })
    .on_conflict(OnConflict::column(CartCol::UserId).do_nothing().to_owned())
    .exec_without_returning(db)
    .await?;
    if inserted > 0 {
        tracing::debug!(user_id = %user_id, "cart created");
    }

    Carts::find()
        .filter(CartCol::UserId.eq(user_id))
        .lock(LockType::Update)
        .one(db)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("cart for {user_id} vanished")))
}

/// A missing cart and a product absent from the cart are the same 404.
async fn find_cart_item(
    state: &AppState,
    user_id: Uuid,
    product_id: Uuid,
) -> AppResult<CartItemModel> {
    let not_in_cart = || AppError::NotFound("Product not found in cart".into());

    let cart = Carts::find()
        .filter(CartCol::UserId.eq(user_id))
        .one(&state.orm)
        .await?
        .ok_or_else(not_in_cart)?;

    CartItems::find()
        .filter(CartItemCol::CartId.eq(cart.id))
        .filter(CartItemCol::ProductId.eq(product_id))
        .one(&state.orm)
        .await?
        .ok_or_else(not_in_cart)
}
