mod common;

use axum::http::StatusCode;
use serde_json::{Value, json};

fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

fn error_of(body: &Value) -> &str {
    body["data"]["error"].as_str().unwrap_or_default()
}

#[tokio::test]
async fn unknown_routes_get_the_json_envelope() -> anyhow::Result<()> {
    let server = common::server(common::lazy_state()?)?;

    let response = server.get("/api/nope").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["message"], "Not Found");
    assert_eq!(body["data"]["path"], "/api/nope");
    Ok(())
}

#[tokio::test]
async fn health_is_served_at_the_root() -> anyhow::Result<()> {
    let server = common::server(common::lazy_state()?)?;

    let response = server.get("/health").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["data"]["status"], "ok");
    assert!(response.headers().contains_key("x-request-id"));
    Ok(())
}

#[tokio::test]
async fn protected_routes_require_a_bearer_token() -> anyhow::Result<()> {
    let server = common::server(common::lazy_state()?)?;

    let response = server.get("/api/cart/view").await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(error_of(&body), "Missing Authorization header");

    let response = server
        .get("/api/cart/view")
        .add_header("Authorization", "Basic dXNlcjpwdw==")
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(error_of(&body), "Invalid Authorization scheme");

    let response = server
        .get("/api/profile")
        .add_header("Authorization", "Bearer not.a.jwt")
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(error_of(&body), "Invalid or expired token");
    Ok(())
}

#[tokio::test]
async fn malformed_bodies_are_bad_requests_with_the_envelope() -> anyhow::Result<()> {
    let server = common::server(common::lazy_state()?)?;

    let response = server
        .post("/api/login")
        .json(&json!({ "email": ["not", "a", "string"] }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(!error_of(&body).is_empty());
    assert_eq!(body["message"], body["data"]["error"]);

    let response = server.post("/api/register").text("plain text").await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(!error_of(&body).is_empty());

    // Missing fields surface by name, before any database access.
    let response = server
        .post("/api/login")
        .json(&json!({ "email": "a@example.com" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(error_of(&body), "Password is required");
    Ok(())
}

// Full round trip through the router: registration, catalogue, cart with the
// default quantity, checkout, logout and the revoked token.
#[tokio::test]
async fn shopping_over_http() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let server = common::server(state)?;

    let store_email = common::unique_email("http-store");
    let response = server
        .post("/api/store_register")
        .json(&common::store_json(&store_email, "store123"))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);

    let response = server
        .post("/api/store_login")
        .json(&json!({ "email": store_email, "password": "store123" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    let store_token = body["data"]["token"].as_str().unwrap_or_default().to_string();

    let response = server
        .post("/api/products")
        .add_header("Authorization", bearer(&store_token))
        .json(&json!({ "name": "Kettle", "price": 4500, "stock_quantity": 3 }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let body: Value = response.json();
    let product_id = body["data"]["id"].as_str().unwrap_or_default().to_string();

    let user_email = common::unique_email("http-user");
    let response = server
        .post("/api/register")
        .json(&common::user_json(&user_email, "user123"))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let body: Value = response.json();
    assert!(body["data"].get("password_hash").is_none());

    let response = server
        .post("/api/login")
        .json(&json!({ "email": user_email, "password": "user123" }))
        .await;
    let body: Value = response.json();
    let user_token = body["data"]["token"].as_str().unwrap_or_default().to_string();

    // Stores cannot shop.
    let response = server
        .post("/api/cart/add")
        .add_header("Authorization", bearer(&store_token))
        .json(&json!({ "product_id": product_id }))
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    // Quantity defaults to one.
    let response = server
        .post("/api/cart/add")
        .add_header("Authorization", bearer(&user_token))
        .json(&json!({ "product_id": product_id }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["data"]["quantity"], 1);

    let response = server
        .post("/api/order/checkout")
        .add_header("Authorization", bearer(&user_token))
        .json(&json!({}))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["data"]["order"]["total_price"], 4500);
    assert_eq!(body["data"]["order"]["payment_method"], "Cash on Delivery");

    let response = server
        .post("/api/logout")
        .add_header("Authorization", bearer(&user_token))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let response = server
        .get("/api/profile")
        .add_header("Authorization", bearer(&user_token))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(error_of(&body), "Token has been revoked");

    Ok(())
}
