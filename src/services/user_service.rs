use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, EntityTrait, QueryFilter, Set,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::{
        auth::{LoginRequest, LoginResponse, Role},
        users::{RegisterUserRequest, UpdateProfileRequest},
    },
    entity::users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_user},
    models::User,
    response::ApiResponse,
    services::auth_service::{hash_password, issue_token, revoke},
    state::AppState,
    validation::{check_lengths, normalize_email, require_fields},
};

pub async fn register(
    state: &AppState,
    payload: RegisterUserRequest,
) -> AppResult<ApiResponse<User>> {
    require_fields(&[
        ("username", payload.username.as_str()),
        ("email", payload.email.as_str()),
        ("password", payload.password.as_str()),
        ("first_name", payload.first_name.as_str()),
        ("last_name", payload.last_name.as_str()),
        ("address", payload.address.as_str()),
        ("city", payload.city.as_str()),
        ("state", payload.state.as_str()),
        ("zip_code", payload.zip_code.as_str()),
        ("image_url", payload.image_url.as_str()),
    ])?;
    check_lengths(&[
        ("username", payload.username.as_str(), 50),
        ("email", payload.email.as_str(), 100),
        ("first_name", payload.first_name.as_str(), 50),
        ("last_name", payload.last_name.as_str(), 50),
        ("address", payload.address.as_str(), 255),
        ("city", payload.city.as_str(), 100),
        ("state", payload.state.as_str(), 100),
        ("zip_code", payload.zip_code.as_str(), 20),
        ("image_url", payload.image_url.as_str(), 255),
    ])?;
    let email = normalize_email(&payload.email)?;

    let exist = Users::find()
        .filter(UserCol::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?;
    if exist.is_some() {
        return Err(AppError::BadRequest("Email is already taken".to_string()));
    }

    let password_hash = hash_password(&payload.password)?;

    let user = UserActive {
        id: Set(Uuid::new_v4()),
        username: Set(payload.username.trim().to_string()),
        email: Set(email),
        password_hash: Set(password_hash),
        first_name: Set(payload.first_name.trim().to_string()),
        last_name: Set(payload.last_name.trim().to_string()),
        address: Set(payload.address.trim().to_string()),
        city: Set(payload.city.trim().to_string()),
        state: Set(payload.state.trim().to_string()),
        zip_code: Set(payload.zip_code.trim().to_string()),
        image_url: Set(payload.image_url.trim().to_string()),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(user_id = %user.id, "user registered");
    audit::record(
        &state.pool,
        user.id,
        "user_register",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::ok("Register Success", User::from(user)))
}

pub async fn login(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    require_fields(&[("email", payload.email.as_str()), ("password", payload.password.as_str())])?;
    let email = payload.email.trim().to_lowercase();

    let user = Users::find()
        .filter(UserCol::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?;
    let user = match user {
        Some(u) if u.check_password(&payload.password) => u,
        _ => return Err(AppError::Forbidden("Invalid email or password".into())),
    };

    let resp = issue_token(&state.jwt, user.id, Role::User)?;

    audit::record(
        &state.pool,
        user.id,
        "user_login",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::ok("Login Success", resp))
}

pub async fn logout(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_user(user)?;
    revoke(state, user).await?;
    Ok(ApiResponse::message("Logout Success"))
}

pub async fn profile(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<User>> {
    ensure_user(user)?;
    let model = Users::find_by_id(user.id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;
    Ok(ApiResponse::ok("OK", User::from(model)))
}

pub async fn update_profile(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<User>> {
    ensure_user(user)?;
    require_fields(&[
        ("first_name", payload.first_name.as_str()),
        ("last_name", payload.last_name.as_str()),
        ("address", payload.address.as_str()),
        ("city", payload.city.as_str()),
        ("state", payload.state.as_str()),
        ("zip_code", payload.zip_code.as_str()),
        ("image_url", payload.image_url.as_str()),
    ])?;
    check_lengths(&[
        ("first_name", payload.first_name.as_str(), 50),
        ("last_name", payload.last_name.as_str(), 50),
        ("address", payload.address.as_str(), 255),
        ("city", payload.city.as_str(), 100),
        ("state", payload.state.as_str(), 100),
        ("zip_code", payload.zip_code.as_str(), 20),
        ("image_url", payload.image_url.as_str(), 255),
    ])?;

    let model = Users::find_by_id(user.id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    let mut active: UserActive = model.into();
    active.first_name = Set(payload.first_name.trim().to_string());
    active.last_name = Set(payload.last_name.trim().to_string());
    active.address = Set(payload.address.trim().to_string());
    active.city = Set(payload.city.trim().to_string());
    active.state = Set(payload.state.trim().to_string());
    active.zip_code = Set(payload.zip_code.trim().to_string());
    active.image_url = Set(payload.image_url.trim().to_string());
    active.updated_at = Set(Utc::now().into());
    let model = active.update(&state.orm).await?;

    Ok(ApiResponse::ok("Update Success", User::from(model)))
}
