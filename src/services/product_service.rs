use chrono::Utc;
use sea_orm::sea_query::{Expr, Query, extension::postgres::PgExpr};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::products::{CreateProductRequest, ProductDetail, ProductList, UpdateProductRequest},
    entity::{
        Categories, ProductCategories, product_categories,
        products::{ActiveModel, Column, Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_store},
    models::{Category, Product},
    response::{ApiResponse, Meta},
    routes::params::{ProductQuery, ProductSortBy, SortOrder},
    state::AppState,
    validation::{check_lengths, optional_text, require_fields},
};

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();

    if let Some(search) = query.q.as_ref().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(Column::Name).ilike(pattern.clone()))
                .add(Expr::col(Column::Description).ilike(pattern)),
        );
    }

    if let Some(min_price) = query.min_price {
        condition = condition.add(Column::Price.gte(min_price));
    }

    if let Some(max_price) = query.max_price {
        condition = condition.add(Column::Price.lte(max_price));
    }

    if let Some(store_id) = query.store_id {
        condition = condition.add(Column::StoreId.eq(store_id));
    }

    if let Some(category_id) = query.category_id {
        let tagged = Query::select()
            .column(product_categories::Column::ProductId)
            .from(ProductCategories)
            .and_where(product_categories::Column::CategoryId.eq(category_id))
            .to_owned();
        condition = condition.add(Column::Id.in_subquery(tagged));
    }

    let sort_by = query.sort_by.unwrap_or(ProductSortBy::CreatedAt);
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let sort_col = match sort_by {
        ProductSortBy::CreatedAt => Column::CreatedAt,
        ProductSortBy::Price => Column::Price,
        ProductSortBy::Name => Column::Name,
    };

    let mut finder = Products::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    let data = ProductList { items };
    Ok(ApiResponse::success("Products", data, Some(meta)))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<ProductDetail>> {
    let product = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;

    let categories = product
        .find_related(Categories)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Category::from)
        .collect();

    Ok(ApiResponse::success(
        "Product",
        ProductDetail {
            product: Product::from(product),
            categories,
        },
        None,
    ))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_store(user)?;
    require_fields(&[("name", payload.name.as_str())])?;
    check_lengths(&[("name", payload.name.as_str(), 100)])?;
    validate_amounts(Some(payload.price), Some(payload.stock_quantity))?;

    let active = ActiveModel {
        id: Set(Uuid::new_v4()),
        store_id: Set(user.id),
        name: Set(payload.name.trim().to_string()),
        description: Set(optional_text("description", payload.description, 10_000)?),
        price: Set(payload.price),
        stock_quantity: Set(payload.stock_quantity),
        image_url: Set(optional_text("image_url", payload.image_url, 255)?),
        location: Set(optional_text("location", payload.location, 255)?),
        created_at: NotSet,
        updated_at: NotSet,
    };
    let product = active.insert(&state.orm).await?;

    audit::record(
        &state.pool,
        user.id,
        "product_create",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::ok("Product created", Product::from(product)))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_store(user)?;
    validate_amounts(payload.price, payload.stock_quantity)?;

    let existing = find_owned_product(&state.orm, user.id, id).await?;

    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name {
        require_fields(&[("name", name.as_str())])?;
        check_lengths(&[("name", name.as_str(), 100)])?;
        active.name = Set(name.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(optional_text("description", Some(description), 10_000)?);
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(stock_quantity) = payload.stock_quantity {
        active.stock_quantity = Set(stock_quantity);
    }
    if let Some(image_url) = payload.image_url {
        active.image_url = Set(optional_text("image_url", Some(image_url), 255)?);
    }
    if let Some(location) = payload.location {
        active.location = Set(optional_text("location", Some(location), 255)?);
    }
    active.updated_at = Set(Utc::now().into());
    let product = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        user.id,
        "product_update",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::ok("Updated", Product::from(product)))
}

pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_store(user)?;
    let result = Products::delete_many()
        .filter(Column::Id.eq(id))
        .filter(Column::StoreId.eq(user.id))
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::not_found("Product"));
    }

    audit::record(
        &state.pool,
        user.id,
        "product_delete",
        "products",
        serde_json::json!({ "product_id": id }),
    )
    .await;

    Ok(ApiResponse::message("Deleted"))
}

/// A product of another store is reported as missing.
pub(crate) async fn find_owned_product<C>(
    db: &C,
    store_id: Uuid,
    id: Uuid,
) -> AppResult<ProductModel>
where
    C: sea_orm::ConnectionTrait,
{
    Products::find()
        .filter(Column::Id.eq(id))
        .filter(Column::StoreId.eq(store_id))
        .one(db)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))
}

pub fn validate_amounts(price: Option<i64>, stock_quantity: Option<i32>) -> AppResult<()> {
    if price.is_some_and(|p| p < 0) {
        return Err(AppError::BadRequest("Price must not be negative".into()));
    }
    if stock_quantity.is_some_and(|s| s < 0) {
        return Err(AppError::BadRequest(
            "Stock quantity must not be negative".into(),
        ));
    }
    Ok(())
}
