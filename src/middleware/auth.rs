use axum::{extract::FromRequestParts, http::header};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    dto::auth::Role,
    error::{AppError, AppResult},
    services::auth_service::{decode_token, is_revoked},
    state::AppState,
};

/// The account behind a verified, unrevoked bearer token: a shopper or a store.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
    pub jti: Uuid,
    pub expires_at: DateTime<Utc>,
}

pub fn ensure_role(user: &AuthUser, role: Role) -> AppResult<()> {
    if user.role != role {
        return Err(AppError::Forbidden(format!(
            "This action requires a {} account",
            role.as_str()
        )));
    }
    Ok(())
}

pub fn ensure_user(user: &AuthUser) -> AppResult<()> {
    ensure_role(user, Role::User)
}

pub fn ensure_store(user: &AuthUser) -> AppResult<()> {
    ensure_role(user, Role::Store)
}

/// Pulls the token out of an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header_value: &str) -> AppResult<&str> {
    let token = header_value
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("Invalid Authorization scheme".into()))?
        .trim();
    if token.is_empty() {
        return Err(AppError::Unauthorized("Missing bearer token".into()));
    }
    Ok(token)
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;

        let auth_str = auth_header
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid Authorization header".into()))?;

        let token = bearer_token(auth_str)?;
        let claims = decode_token(&state.jwt, token)?;

        let id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::Unauthorized("Invalid subject in token".into()))?;
        let jti = Uuid::parse_str(&claims.jti)
            .map_err(|_| AppError::Unauthorized("Invalid token id".into()))?;
        let expires_at = DateTime::<Utc>::from_timestamp(claims.exp as i64, 0)
            .ok_or_else(|| AppError::Unauthorized("Invalid token expiry".into()))?;

        if is_revoked(state, jti).await? {
            return Err(AppError::Unauthorized("Token has been revoked".into()));
        }

        Ok(AuthUser {
            id,
            role: claims.role,
            jti,
            expires_at,
        })
    }
}
