use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse},
        stores::{RegisterStoreRequest, UpdateStoreRequest},
    },
    error::AppResult,
    extract::AppJson,
    middleware::auth::AuthUser,
    models::Store,
    response::ApiResponse,
    services::store_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/store_register", post(register))
        .route("/store_login", post(login))
        .route("/store_logout", post(logout))
        .route("/stores/me", get(me).put(update_me))
}

#[utoipa::path(
    post,
    path = "/api/store_register",
    request_body = RegisterStoreRequest,
    responses(
        (status = 201, description = "Register store", body = ApiResponse<Store>),
        (status = 400, description = "Missing field or email taken")
    ),
    tag = "Stores"
)]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterStoreRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Store>>)> {
    let resp = store_service::register(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    post,
    path = "/api/store_login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login store", body = ApiResponse<LoginResponse>),
        (status = 403, description = "Store not found or wrong password")
    ),
    tag = "Stores"
)]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let resp = store_service::login(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/store_logout",
    responses(
        (status = 200, description = "Revoke the presented token", body = ApiResponse<serde_json::Value>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Stores"
)]
pub async fn logout(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = store_service::logout(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/stores/me",
    responses(
        (status = 200, description = "Current store profile", body = ApiResponse<Store>),
        (status = 403, description = "Not a store account")
    ),
    security(("bearer_auth" = [])),
    tag = "Stores"
)]
pub async fn me(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Store>>> {
    let resp = store_service::me(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/stores/me",
    request_body = UpdateStoreRequest,
    responses(
        (status = 200, description = "Update store profile", body = ApiResponse<Store>),
        (status = 400, description = "Missing field or email taken")
    ),
    security(("bearer_auth" = [])),
    tag = "Stores"
)]
pub async fn update_me(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<UpdateStoreRequest>,
) -> AppResult<Json<ApiResponse<Store>>> {
    let resp = store_service::update_me(&state, &user, payload).await?;
    Ok(Json(resp))
}
