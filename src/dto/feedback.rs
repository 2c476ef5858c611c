use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateFeedbackRequest {
    pub rating: i32,
    pub comment: Option<String>,
}
