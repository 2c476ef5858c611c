use std::collections::HashMap;

use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::orders::{CheckoutRequest, OrderList, OrderWithItems},
    entity::{
        cart_items::{Column as CartItemCol, Entity as CartItems},
        carts::{Column as CartCol, Entity as Carts},
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_user},
    models::{Order, OrderItem},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    state::AppState,
    validation::optional_text,
};

pub const STATUS_PENDING: &str = "pending";

/// A cart line priced at checkout time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutLine {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub price: i64,
}

/// Σ quantity × price, `None` on overflow.
pub fn order_total(lines: &[CheckoutLine]) -> Option<i64> {
    lines.iter().try_fold(0_i64, |total, line| {
        line.price
            .checked_mul(i64::from(line.quantity))
            .and_then(|subtotal| total.checked_add(subtotal))
    })
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_user(user)?;
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all().add(OrderCol::UserId.eq(user.id));
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Status.eq(status.clone()));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);

    let mut finder = Orders::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Ok",
        OrderList { items: orders },
        Some(meta),
    ))
}

/// Turns the caller's cart into an order in a single transaction: prices come
/// from the products at checkout time, stock is decremented and the cart is
/// emptied. Returning early drops `txn`, which rolls everything back.
pub async fn checkout(
    state: &AppState,
    user: &AuthUser,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_user(user)?;
    let payment_method = payload.payment_method.trim().to_string();
    if payment_method.is_empty() {
        return Err(AppError::BadRequest("Payment Method is required".into()));
    }
    if payment_method.chars().count() > 50 {
        return Err(AppError::BadRequest(
            "Payment Method must be at most 50 characters".into(),
        ));
    }
    let shipping_address = optional_text("shipping_address", payload.shipping_address, 255)?;

    let txn = state.orm.begin().await?;

    // A concurrent checkout waits here, then finds the cart emptied.
    let cart = Carts::find()
        .filter(CartCol::UserId.eq(user.id))
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::BadRequest("Cart is empty".into()))?;

    let cart_items = CartItems::find()
        .filter(CartItemCol::CartId.eq(cart.id))
        .order_by_asc(CartItemCol::CreatedAt)
        .all(&txn)
        .await?;

    if cart_items.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".into()));
    }

    let product_ids: Vec<Uuid> = cart_items.iter().map(|item| item.product_id).collect();
    let products: HashMap<Uuid, _> = Products::find()
        .filter(ProdCol::Id.is_in(product_ids))
        .lock(LockType::Update)
        .all(&txn)
        .await?
        .into_iter()
        .map(|product| (product.id, product))
        .collect();

    let mut lines = Vec::with_capacity(cart_items.len());
    for item in &cart_items {
        let product = products.get(&item.product_id).ok_or_else(|| {
            AppError::BadRequest(format!("Product {} is no longer available", item.product_id))
        })?;
        if item.quantity <= 0 {
            return Err(AppError::BadRequest("Cart has invalid quantity".into()));
        }
        if product.stock_quantity < item.quantity {
            return Err(AppError::BadRequest(format!(
                "Insufficient stock for product {}",
                product.name
            )));
        }
        lines.push(CheckoutLine {
            product_id: product.id,
            product_name: product.name.clone(),
            quantity: item.quantity,
            price: product.price,
        });
    }

    let total_price = order_total(&lines)
        .ok_or_else(|| AppError::BadRequest("Order total is too large".into()))?;

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.id),
        total_price: Set(total_price),
        payment_method: Set(payment_method),
        status: Set(STATUS_PENDING.into()),
        shipping_address: Set(shipping_address),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut order_items: Vec<OrderItem> = Vec::with_capacity(lines.len());

    for line in &lines {
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(Some(line.product_id)),
            product_name: Set(line.product_name.clone()),
            quantity: Set(line.quantity),
            price: Set(line.price),
        }
        .insert(&txn)
        .await?;

        order_items.push(OrderItem::from(item));

        Products::update_many()
            .col_expr(
                ProdCol::StockQuantity,
                Expr::col(ProdCol::StockQuantity).sub(line.quantity),
            )
            .filter(ProdCol::Id.eq(line.product_id))
            .exec(&txn)
            .await?;
    }

    CartItems::delete_many()
        .filter(CartItemCol::CartId.eq(cart.id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    tracing::info!(
        order_id = %order.id,
        user_id = %user.id,
        total_price,
        items = order_items.len(),
        "checkout completed"
    );
    audit::record(
        &state.pool,
        user.id,
        "checkout",
        "orders",
        serde_json::json!({ "order_id": order.id, "total_price": total_price }),
    )
    .await;

    Ok(ApiResponse::ok(
        "Checkout success",
        OrderWithItems {
            order: Order::from(order),
            items: order_items,
        },
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_user(user)?;
    let order = find_user_order(state, user.id, id).await?;

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .order_by_asc(OrderItemCol::ProductName)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(OrderItem::from)
        .collect();

    Ok(ApiResponse::ok(
        "OK",
        OrderWithItems {
            order: Order::from(order),
            items,
        },
    ))
}

/// Another user's order is reported as missing.
pub(crate) async fn find_user_order(
    state: &AppState,
    user_id: Uuid,
    id: Uuid,
) -> AppResult<OrderModel> {
    Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user_id))
                .add(OrderCol::Id.eq(id)),
        )
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Order"))
}
