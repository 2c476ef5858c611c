use sea_orm::sea_query::OnConflict;
use sea_orm::{ActiveValue::NotSet, ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::{
    audit,
    dto::feedback::CreateFeedbackRequest,
    entity::feedback::{ActiveModel as FeedbackActive, Column as FeedbackCol, Entity as FeedbackEntity},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_user},
    models::Feedback,
    response::ApiResponse,
    services::order_service::find_user_order,
    state::AppState,
    validation::optional_text,
};

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

pub fn validate_rating(rating: i32) -> AppResult<()> {
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(AppError::BadRequest(format!(
            "Rating must be between {MIN_RATING} and {MAX_RATING}"
        )));
    }
    Ok(())
}

pub async fn create_feedback(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
    payload: CreateFeedbackRequest,
) -> AppResult<ApiResponse<Feedback>> {
    ensure_user(user)?;
    validate_rating(payload.rating)?;
    let comment = optional_text("comment", payload.comment, 255)?;

    let order = find_user_order(state, user.id, order_id).await?;

    let id = Uuid::new_v4();
    let inserted = FeedbackEntity::insert(FeedbackActive {
        id: Set(id),
        order_id: Set(order.id),
        user_id: Set(user.id),
        rating: Set(payload.rating),
        comment: Set(comment),
        created_at: NotSet,
    })
    .on_conflict(
        OnConflict::column(FeedbackCol::OrderId)
            .do_nothing()
            .to_owned(),
    )
    .exec_without_returning(&state.orm)
    .await?;
    if inserted == 0 {
        return Err(AppError::BadRequest("Feedback already submitted".into()));
    }

    let feedback = FeedbackEntity::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Feedback"))?;

    audit::record(
        &state.pool,
        user.id,
        "feedback_create",
        "feedback",
        serde_json::json!({ "order_id": order.id, "rating": feedback.rating }),
    )
    .await;

    Ok(ApiResponse::ok("Feedback submitted", Feedback::from(feedback)))
}

pub async fn get_feedback(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
) -> AppResult<ApiResponse<Feedback>> {
    ensure_user(user)?;
    let order = find_user_order(state, user.id, order_id).await?;

    let feedback = FeedbackEntity::find()
        .filter(FeedbackCol::OrderId.eq(order.id))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Feedback"))?;

    Ok(ApiResponse::ok("OK", Feedback::from(feedback)))
}
