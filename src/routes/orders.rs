use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::{
        feedback::CreateFeedbackRequest,
        orders::{CheckoutRequest, OrderList, OrderWithItems},
    },
    error::AppResult,
    extract::AppJson,
    middleware::auth::AuthUser,
    models::Feedback,
    response::ApiResponse,
    routes::params::OrderListQuery,
    services::{feedback_service, order_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/order/checkout", post(checkout))
        .route("/orders", get(list_orders))
        .route("/orders/{id}", get(get_order))
        .route(
            "/orders/{id}/feedback",
            get(get_feedback).post(create_feedback),
        )
}

#[utoipa::path(
    post,
    path = "/api/order/checkout",
    request_body = CheckoutRequest,
    responses(
        (status = 201, description = "Convert the cart into an order", body = ApiResponse<OrderWithItems>),
        (status = 400, description = "Cart is empty or stock is insufficient")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn checkout(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<CheckoutRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<OrderWithItems>>)> {
    let resp = order_service::checkout(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/orders",
    params(OrderListQuery),
    responses(
        (status = 200, description = "Orders of the current shopper", body = ApiResponse<OrderList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = order_service::list_orders(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    responses(
        (status = 200, description = "Order with items", body = ApiResponse<OrderWithItems>),
        (status = 404, description = "Order not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let resp = order_service::get_order(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/feedback",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    request_body = CreateFeedbackRequest,
    responses(
        (status = 201, description = "Rate an order", body = ApiResponse<Feedback>),
        (status = 400, description = "Invalid rating or feedback already submitted"),
        (status = 404, description = "Order not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Feedback"
)]
pub async fn create_feedback(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<CreateFeedbackRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Feedback>>)> {
    let resp = feedback_service::create_feedback(&state, &user, id, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}/feedback",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    responses(
        (status = 200, description = "Feedback of an order", body = ApiResponse<Feedback>),
        (status = 404, description = "Order or feedback not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Feedback"
)]
pub async fn get_feedback(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Feedback>>> {
    let resp = feedback_service::get_feedback(&state, &user, id).await?;
    Ok(Json(resp))
}
