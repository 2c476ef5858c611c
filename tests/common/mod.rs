#![allow(dead_code)]

use std::sync::Arc;

use axum_test::TestServer;
use marketplace_api::{
    app::build_router,
    db::{create_orm_conn, raw_pool, run_migrations},
    dto::{
        auth::{LoginRequest, Role},
        stores::RegisterStoreRequest,
        users::RegisterUserRequest,
    },
    middleware::auth::AuthUser,
    services::{auth_service::decode_token, store_service, user_service},
    state::{AppState, JwtSettings},
};
use sea_orm::SqlxPostgresConnector;
use uuid::Uuid;

fn jwt_settings() -> JwtSettings {
    JwtSettings {
        secret: Arc::from("integration-test-secret"),
        ttl_hours: 1,
    }
}

/// State over a pool that never connects; enough for requests rejected
/// before any query runs.
pub fn lazy_state() -> anyhow::Result<AppState> {
    let pool = sqlx::PgPool::connect_lazy("postgres://localhost/unused")?;
    Ok(AppState {
        orm: SqlxPostgresConnector::from_sqlx_postgres_pool(pool.clone()),
        pool,
        jwt: jwt_settings(),
    })
}

pub fn server(state: AppState) -> anyhow::Result<TestServer> {
    let app = build_router(state, &["http://localhost:3000".to_string()])?;
    Ok(TestServer::new(app)?)
}

/// Connects to the test database, or `None` when none is configured.
pub async fn setup_state() -> anyhow::Result<Option<AppState>> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(None);
        }
    };

    let orm = create_orm_conn(&database_url).await?;
    run_migrations(&orm).await?;

    Ok(Some(AppState {
        pool: raw_pool(&orm),
        orm,
        jwt: jwt_settings(),
    }))
}

pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@example.com", Uuid::new_v4().simple())
}

pub fn user_request(email: &str, password: &str) -> RegisterUserRequest {
    RegisterUserRequest {
        username: "shopper".into(),
        email: email.into(),
        password: password.into(),
        first_name: "Sam".into(),
        last_name: "Shopper".into(),
        address: "2 Market Street".into(),
        city: "Bandung".into(),
        state: "West Java".into(),
        zip_code: "40111".into(),
        image_url: "https://example.com/u.png".into(),
    }
}

pub fn store_request(email: &str, password: &str) -> RegisterStoreRequest {
    RegisterStoreRequest {
        seller_full_name: "Ferris Crab".into(),
        username: "ferris".into(),
        email: email.into(),
        password: password.into(),
        store_name: "Ferris Goods".into(),
        description: "Merch".into(),
        image_url: "https://example.com/s.png".into(),
        bank_account: "0011223344".into(),
        contact_number: "+620000000".into(),
        address: "1 Harbor Road".into(),
        city: "Jakarta".into(),
        state: "DKI Jakarta".into(),
        zip_code: "10110".into(),
    }
}

fn auth_from_token(state: &AppState, token: &str) -> anyhow::Result<AuthUser> {
    let claims = decode_token(&state.jwt, token)?;
    Ok(AuthUser {
        id: Uuid::parse_str(&claims.sub)?,
        role: claims.role,
        jti: Uuid::parse_str(&claims.jti)?,
        expires_at: chrono::DateTime::from_timestamp(claims.exp as i64, 0)
            .ok_or_else(|| anyhow::anyhow!("bad exp"))?,
    })
}

/// Registers a shopper and logs in, returning the authenticated caller.
pub async fn shopper(state: &AppState) -> anyhow::Result<AuthUser> {
    let email = unique_email("user");
    user_service::register(state, user_request(&email, "user123")).await?;
    let login = user_service::login(
        state,
        LoginRequest {
            email,
            password: "user123".into(),
        },
    )
    .await?;
    let token = login.data.ok_or_else(|| anyhow::anyhow!("no token"))?.token;
    let auth = auth_from_token(state, &token)?;
    assert_eq!(auth.role, Role::User);
    Ok(auth)
}

/// Registers a store and logs in, returning the authenticated caller.
pub async fn seller(state: &AppState) -> anyhow::Result<AuthUser> {
    let email = unique_email("store");
    store_service::register(state, store_request(&email, "store123")).await?;
    let login = store_service::login(
        state,
        LoginRequest {
            email,
            password: "store123".into(),
        },
    )
    .await?;
    let token = login.data.ok_or_else(|| anyhow::anyhow!("no token"))?.token;
    let auth = auth_from_token(state, &token)?;
    assert_eq!(auth.role, Role::Store);
    Ok(auth)
}

pub fn user_json(email: &str, password: &str) -> serde_json::Value {
    serde_json::json!({
        "username": "shopper",
        "email": email,
        "password": password,
        "first_name": "Sam",
        "last_name": "Shopper",
        "address": "2 Market Street",
        "city": "Bandung",
        "state": "West Java",
        "zip_code": "40111",
        "image_url": "https://example.com/u.png"
    })
}

pub fn store_json(email: &str, password: &str) -> serde_json::Value {
    serde_json::json!({
        "seller_full_name": "Ferris Crab",
        "username": "ferris",
        "email": email,
        "password": password,
        "store_name": "Ferris Goods",
        "description": "Merch",
        "image_url": "https://example.com/s.png",
        "bank_account": "0011223344",
        "contact_number": "+620000000",
        "address": "1 Harbor Road",
        "city": "Jakarta",
        "state": "DKI Jakarta",
        "zip_code": "10110"
    })
}
