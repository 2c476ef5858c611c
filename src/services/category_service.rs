use std::collections::HashSet;

use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::categories::{CategoryList, CategoryRequest, ProductCategoriesRequest},
    entity::{
        Products,
        categories::{ActiveModel as CategoryActive, Column as CategoryCol, Entity as Categories, Model as CategoryModel},
        product_categories::{
            ActiveModel as LinkActive, Column as LinkCol, Entity as ProductCategories,
        },
        products::Model as ProductModel,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_store},
    models::Category,
    response::ApiResponse,
    services::product_service::find_owned_product,
    state::AppState,
    validation::{check_lengths, optional_text, require_fields},
};

pub async fn create_category(
    state: &AppState,
    user: &AuthUser,
    payload: CategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    ensure_store(user)?;
    require_fields(&[("name", payload.name.as_str())])?;
    check_lengths(&[("name", payload.name.as_str(), 100)])?;

    let category = CategoryActive {
        id: Set(Uuid::new_v4()),
        store_id: Set(user.id),
        name: Set(payload.name.trim().to_string()),
        description: Set(description_or_empty(payload.description)?),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        user.id,
        "category_create",
        "categories",
        serde_json::json!({ "category_id": category.id }),
    )
    .await;

    Ok(ApiResponse::ok(
        "Category created successfully",
        Category::from(category),
    ))
}

pub async fn list_categories(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<CategoryList>> {
    ensure_store(user)?;
    let items = Categories::find()
        .filter(CategoryCol::StoreId.eq(user.id))
        .order_by_asc(CategoryCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Category::from)
        .collect();
    Ok(ApiResponse::ok("OK", CategoryList { items }))
}

pub async fn get_category(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Category>> {
    ensure_store(user)?;
    let category = find_owned_category(state, user.id, id).await?;
    Ok(ApiResponse::ok("OK", Category::from(category)))
}

pub async fn update_category(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: CategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    ensure_store(user)?;
    require_fields(&[("name", payload.name.as_str())])?;
    check_lengths(&[("name", payload.name.as_str(), 100)])?;

    let category = find_owned_category(state, user.id, id).await?;
    let mut active: CategoryActive = category.into();
    active.name = Set(payload.name.trim().to_string());
    active.description = Set(description_or_empty(payload.description)?);
    let category = active.update(&state.orm).await?;

    Ok(ApiResponse::ok(
        "Category updated successfully",
        Category::from(category),
    ))
}

pub async fn delete_category(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_store(user)?;
    let result = Categories::delete_many()
        .filter(CategoryCol::Id.eq(id))
        .filter(CategoryCol::StoreId.eq(user.id))
        .exec(&state.orm)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::not_found("Category"));
    }

    audit::record(
        &state.pool,
        user.id,
        "category_delete",
        "categories",
        serde_json::json!({ "category_id": id }),
    )
    .await;

    Ok(ApiResponse::message("Category deleted successfully"))
}

/// Links the store's own categories among `category_ids` to one of its products.
/// Unknown, foreign and already linked ids are skipped.
pub async fn add_product_categories(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    payload: ProductCategoriesRequest,
) -> AppResult<ApiResponse<CategoryList>> {
    ensure_store(user)?;
    let txn = state.orm.begin().await?;

    let product = find_owned_product(&txn, user.id, product_id).await?;

    let categories = Categories::find()
        .filter(CategoryCol::Id.is_in(payload.category_ids))
        .filter(CategoryCol::StoreId.eq(user.id))
        .all(&txn)
        .await?;

    let linked: HashSet<Uuid> = ProductCategories::find()
        .filter(LinkCol::ProductId.eq(product.id))
        .all(&txn)
        .await?
        .into_iter()
        .map(|link| link.category_id)
        .collect();

    let mut added = Vec::new();
    for category in categories.iter().filter(|c| !linked.contains(&c.id)) {
        LinkActive {
            product_id: Set(product.id),
            category_id: Set(category.id),
        }
        .insert(&txn)
        .await?;
        added.push(category.id);
    }

    let items = product_categories(&txn, &product).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        user.id,
        "product_categories_add",
        "product_categories",
        serde_json::json!({ "product_id": product_id, "category_ids": added }),
    )
    .await;

    Ok(ApiResponse::ok(
        "Categories added to product successfully",
        CategoryList { items },
    ))
}

pub async fn remove_product_categories(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    payload: ProductCategoriesRequest,
) -> AppResult<ApiResponse<CategoryList>> {
    ensure_store(user)?;
    let txn = state.orm.begin().await?;

    let product = find_owned_product(&txn, user.id, product_id).await?;

    ProductCategories::delete_many()
        .filter(LinkCol::ProductId.eq(product.id))
        .filter(LinkCol::CategoryId.is_in(payload.category_ids.clone()))
        .exec(&txn)
        .await?;

    let items = product_categories(&txn, &product).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        user.id,
        "product_categories_remove",
        "product_categories",
        serde_json::json!({ "product_id": product_id, "category_ids": payload.category_ids }),
    )
    .await;

    Ok(ApiResponse::ok(
        "Categories removed from product successfully",
        CategoryList { items },
    ))
}

pub async fn list_product_categories(
    state: &AppState,
    product_id: Uuid,
) -> AppResult<ApiResponse<CategoryList>> {
    let product = Products::find_by_id(product_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;
    let items = product_categories(&state.orm, &product).await?;
    Ok(ApiResponse::ok("OK", CategoryList { items }))
}

async fn product_categories<C>(db: &C, product: &ProductModel) -> AppResult<Vec<Category>>
where
    C: sea_orm::ConnectionTrait,
{
    Ok(product
        .find_related(Categories)
        .order_by_asc(CategoryCol::Name)
        .all(db)
        .await?
        .into_iter()
        .map(Category::from)
        .collect())
}

async fn find_owned_category(
    state: &AppState,
    store_id: Uuid,
    id: Uuid,
) -> AppResult<CategoryModel> {
    Categories::find()
        .filter(CategoryCol::Id.eq(id))
        .filter(CategoryCol::StoreId.eq(store_id))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Category"))
}

fn description_or_empty(description: Option<String>) -> AppResult<String> {
    Ok(optional_text("description", description, 255)?.unwrap_or_default())
}
