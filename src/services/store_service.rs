use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, EntityTrait, QueryFilter, Set,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::{
        auth::{LoginRequest, LoginResponse, Role},
        stores::{RegisterStoreRequest, UpdateStoreRequest},
    },
    entity::stores::{ActiveModel as StoreActive, Column as StoreCol, Entity as Stores},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_store},
    models::Store,
    response::ApiResponse,
    services::auth_service::{hash_password, issue_token, revoke},
    state::AppState,
    validation::{check_lengths, normalize_email, require_fields},
};

pub async fn register(
    state: &AppState,
    payload: RegisterStoreRequest,
) -> AppResult<ApiResponse<Store>> {
    require_fields(&[
        ("seller_full_name", payload.seller_full_name.as_str()),
        ("username", payload.username.as_str()),
        ("email", payload.email.as_str()),
        ("store_name", payload.store_name.as_str()),
        ("description", payload.description.as_str()),
        ("bank_account", payload.bank_account.as_str()),
        ("contact_number", payload.contact_number.as_str()),
        ("image_url", payload.image_url.as_str()),
        ("address", payload.address.as_str()),
        ("city", payload.city.as_str()),
        ("state", payload.state.as_str()),
        ("zip_code", payload.zip_code.as_str()),
        ("password", payload.password.as_str()),
    ])?;
    check_lengths(&[
        ("seller_full_name", payload.seller_full_name.as_str(), 50),
        ("username", payload.username.as_str(), 50),
        ("email", payload.email.as_str(), 100),
        ("store_name", payload.store_name.as_str(), 100),
        ("description", payload.description.as_str(), 255),
        ("image_url", payload.image_url.as_str(), 255),
        ("bank_account", payload.bank_account.as_str(), 20),
        ("contact_number", payload.contact_number.as_str(), 15),
        ("address", payload.address.as_str(), 255),
        ("city", payload.city.as_str(), 100),
        ("state", payload.state.as_str(), 100),
        ("zip_code", payload.zip_code.as_str(), 20),
    ])?;
    let email = normalize_email(&payload.email)?;

    let exist = Stores::find()
        .filter(StoreCol::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?;
    if exist.is_some() {
        return Err(AppError::BadRequest("Email is already taken".to_string()));
    }

    let password_hash = hash_password(&payload.password)?;

    let store = StoreActive {
        id: Set(Uuid::new_v4()),
        seller_full_name: Set(payload.seller_full_name.trim().to_string()),
        username: Set(payload.username.trim().to_string()),
        email: Set(email),
        password_hash: Set(password_hash),
        store_name: Set(payload.store_name.trim().to_string()),
        description: Set(payload.description.trim().to_string()),
        image_url: Set(payload.image_url.trim().to_string()),
        bank_account: Set(payload.bank_account.trim().to_string()),
        contact_number: Set(payload.contact_number.trim().to_string()),
        address: Set(payload.address.trim().to_string()),
        city: Set(payload.city.trim().to_string()),
        state: Set(payload.state.trim().to_string()),
        zip_code: Set(payload.zip_code.trim().to_string()),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(store_id = %store.id, "store registered");
    audit::record(
        &state.pool,
        store.id,
        "store_register",
        "stores",
        serde_json::json!({ "store_id": store.id }),
    )
    .await;

    Ok(ApiResponse::ok("Register Success", Store::from(store)))
}

pub async fn login(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    require_fields(&[("email", payload.email.as_str()), ("password", payload.password.as_str())])?;
    let email = payload.email.trim().to_lowercase();

    let store = Stores::find()
        .filter(StoreCol::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::Forbidden("Store not found".into()))?;

    if !store.check_password(&payload.password) {
        return Err(AppError::Forbidden("Wrong password".into()));
    }

    let resp = issue_token(&state.jwt, store.id, Role::Store)?;

    audit::record(
        &state.pool,
        store.id,
        "store_login",
        "stores",
        serde_json::json!({ "store_id": store.id }),
    )
    .await;

    Ok(ApiResponse::ok("Login Successful", resp))
}

pub async fn logout(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_store(user)?;
    revoke(state, user).await?;
    Ok(ApiResponse::message("Logout Success"))
}

pub async fn me(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Store>> {
    ensure_store(user)?;
    let model = Stores::find_by_id(user.id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Store"))?;
    Ok(ApiResponse::ok("OK", Store::from(model)))
}

pub async fn update_me(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateStoreRequest,
) -> AppResult<ApiResponse<Store>> {
    ensure_store(user)?;
    require_fields(&[
        ("store_name", payload.store_name.as_str()),
        ("description", payload.description.as_str()),
        ("image_url", payload.image_url.as_str()),
        ("seller_full_name", payload.seller_full_name.as_str()),
        ("username", payload.username.as_str()),
        ("email", payload.email.as_str()),
        ("bank_account", payload.bank_account.as_str()),
        ("contact_number", payload.contact_number.as_str()),
        ("address", payload.address.as_str()),
        ("city", payload.city.as_str()),
        ("state", payload.state.as_str()),
        ("zip_code", payload.zip_code.as_str()),
    ])?;
    check_lengths(&[
        ("seller_full_name", payload.seller_full_name.as_str(), 50),
        ("username", payload.username.as_str(), 50),
        ("email", payload.email.as_str(), 100),
        ("store_name", payload.store_name.as_str(), 100),
        ("description", payload.description.as_str(), 255),
        ("image_url", payload.image_url.as_str(), 255),
        ("bank_account", payload.bank_account.as_str(), 20),
        ("contact_number", payload.contact_number.as_str(), 15),
        ("address", payload.address.as_str(), 255),
        ("city", payload.city.as_str(), 100),
        ("state", payload.state.as_str(), 100),
        ("zip_code", payload.zip_code.as_str(), 20),
    ])?;
    let email = normalize_email(&payload.email)?;

    let model = Stores::find_by_id(user.id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Store"))?;

    if model.email != email {
        let taken = Stores::find()
            .filter(StoreCol::Email.eq(email.as_str()))
            .filter(StoreCol::Id.ne(user.id))
            .one(&state.orm)
            .await?;
        if taken.is_some() {
            return Err(AppError::BadRequest("Email is already taken".to_string()));
        }
    }

    let mut active: StoreActive = model.into();
    active.store_name = Set(payload.store_name.trim().to_string());
    active.description = Set(payload.description.trim().to_string());
    active.image_url = Set(payload.image_url.trim().to_string());
    active.seller_full_name = Set(payload.seller_full_name.trim().to_string());
    active.username = Set(payload.username.trim().to_string());
    active.email = Set(email);
    active.bank_account = Set(payload.bank_account.trim().to_string());
    active.contact_number = Set(payload.contact_number.trim().to_string());
    active.address = Set(payload.address.trim().to_string());
    active.city = Set(payload.city.trim().to_string());
    active.state = Set(payload.state.trim().to_string());
    active.zip_code = Set(payload.zip_code.trim().to_string());
    active.updated_at = Set(Utc::now().into());
    let model = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        model.id,
        "store_update",
        "stores",
        serde_json::json!({ "store_id": model.id }),
    )
    .await;

    Ok(ApiResponse::ok("Update user data success", Store::from(model)))
}
