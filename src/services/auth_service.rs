use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use password_hash::rand_core::OsRng;
use sea_orm::{
    ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter, sea_query::OnConflict,
};
use uuid::Uuid;

use crate::{
    dto::auth::{Claims, LoginResponse, Role},
    entity::revoked_tokens::{ActiveModel as RevokedActive, Column as RevokedCol, Entity as RevokedTokens},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    state::{AppState, JwtSettings},
};

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(password_hash)
}

/// False on mismatch and on a hash that cannot be parsed.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(password_hash) else {
        tracing::warn!("stored password hash is not a valid PHC string");
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

pub fn issue_token(jwt: &JwtSettings, subject: Uuid, role: Role) -> AppResult<LoginResponse> {
    let expires_at = Utc::now()
        .checked_add_signed(Duration::hours(jwt.ttl_hours))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: subject.to_string(),
        role,
        jti: Uuid::new_v4().to_string(),
        exp: expires_at.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt.secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?;

    Ok(LoginResponse {
        token,
        token_type: "Bearer".to_string(),
        expires_at,
        role,
    })
}

pub fn decode_token(jwt: &JwtSettings, token: &str) -> AppResult<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::Unauthorized("Invalid or expired token".into()))
}

pub async fn is_revoked(state: &AppState, jti: Uuid) -> AppResult<bool> {
    Ok(RevokedTokens::find_by_id(jti).one(&state.orm).await?.is_some())
}

/// Invalidates the presented token until its natural expiry and purges
/// revocations that have outlived their tokens.
pub async fn revoke(state: &AppState, user: &AuthUser) -> AppResult<()> {
    RevokedTokens::delete_many()
        .filter(RevokedCol::ExpiresAt.lt(Utc::now()))
        .exec(&state.orm)
        .await?;

    RevokedTokens::insert(RevokedActive {
        jti: Set(user.jti),
        expires_at: Set(user.expires_at.into()),
    })
    .on_conflict(
        OnConflict::column(RevokedCol::Jti)
            .do_nothing()
            .to_owned(),
    )
    .exec_without_returning(&state.orm)
    .await?;

    Ok(())
}
