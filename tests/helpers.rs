use std::sync::Arc;

use axum::http::StatusCode;
use marketplace_api::{
    config::parse_origins,
    dto::{auth::Role, cart::CartLine},
    error::AppError,
    middleware::auth::{AuthUser, bearer_token, ensure_store, ensure_user},
    routes::params::{MAX_PAGE, Pagination},
    services::{
        auth_service::{decode_token, hash_password, issue_token, verify_password},
        cart_service::{cart_total, line_total, validate_quantity},
        feedback_service::validate_rating,
        order_service::{CheckoutLine, order_total},
        product_service::validate_amounts,
    },
    state::JwtSettings,
    validation::{check_lengths, field_label, normalize_email, optional_text, require_fields},
};
use uuid::Uuid;

fn jwt() -> JwtSettings {
    JwtSettings {
        secret: Arc::from("test-secret"),
        ttl_hours: 1,
    }
}

fn line(price: i64, quantity: i32) -> CheckoutLine {
    CheckoutLine {
        product_id: Uuid::new_v4(),
        product_name: "Widget".into(),
        quantity,
        price,
    }
}

fn message(err: AppError) -> String {
    err.to_string()
}

#[test]
fn pagination_applies_defaults_and_bounds() {
    assert_eq!(Pagination::default().normalize(), (1, 20, 0));

    let p = Pagination {
        page: Some(3),
        per_page: Some(10),
    };
    assert_eq!(p.normalize(), (3, 10, 20));

    let p = Pagination {
        page: Some(0),
        per_page: Some(1000),
    };
    assert_eq!(p.normalize(), (1, 100, 0));

    let p = Pagination {
        page: Some(i64::MAX),
        per_page: Some(20),
    };
    let (page, per_page, offset) = p.normalize();
    assert_eq!(page, MAX_PAGE);
    assert_eq!(per_page, 20);
    assert_eq!(offset, (MAX_PAGE - 1) * 20);
    assert!(offset >= 0);
}

#[test]
fn password_hash_verifies_only_the_same_password() {
    let hash = hash_password("s3cret").unwrap();
    assert_ne!(hash, "s3cret");
    assert!(verify_password("s3cret", &hash));
    assert!(!verify_password("wrong", &hash));
    assert!(!verify_password("s3cret", "not-a-phc-string"));
}

#[test]
fn field_labels_are_title_cased() {
    assert_eq!(field_label("zip_code"), "Zip Code");
    assert_eq!(field_label("seller_full_name"), "Seller Full Name");
    assert_eq!(field_label("email"), "Email");
}

#[test]
fn require_fields_reports_first_blank_field() {
    assert!(require_fields(&[("email", "a@b.co"), ("password", "x")]).is_ok());

    let err = require_fields(&[("email", "a@b.co"), ("first_name", "  "), ("city", "")]).unwrap_err();
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    assert_eq!(message(err), "First Name is required");
}

#[test]
fn emails_are_normalized_and_checked() {
    assert_eq!(normalize_email("  Alice@Example.COM ").unwrap(), "alice@example.com");
    assert_eq!(
        message(normalize_email("not-an-email").unwrap_err()),
        "Invalid email address"
    );
    assert!(normalize_email("@example.com").is_err());
    assert!(normalize_email("alice@localhost").is_err());
}

#[test]
fn optional_text_trims_and_caps_length() {
    assert_eq!(optional_text("comment", None, 10).unwrap(), None);
    assert_eq!(optional_text("comment", Some("   ".into()), 10).unwrap(), None);
    assert_eq!(
        optional_text("comment", Some(" nice ".into()), 10).unwrap(),
        Some("nice".to_string())
    );
    assert_eq!(
        message(optional_text("shipping_address", Some("x".repeat(11)), 10).unwrap_err()),
        "Shipping Address must be at most 10 characters"
    );
}

#[test]
fn app_errors_map_to_status_codes() {
    assert_eq!(AppError::not_found("Product").status(), StatusCode::NOT_FOUND);
    assert_eq!(message(AppError::not_found("Product")), "Product not found");
    assert_eq!(AppError::BadRequest("x".into()).status(), StatusCode::BAD_REQUEST);
    assert_eq!(AppError::Unauthorized("x".into()).status(), StatusCode::UNAUTHORIZED);
    assert_eq!(AppError::Forbidden("x".into()).status(), StatusCode::FORBIDDEN);
    assert_eq!(
        AppError::Internal(anyhow::anyhow!("boom")).status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[test]
fn order_total_sums_line_subtotals() {
    assert_eq!(order_total(&[]), Some(0));
    assert_eq!(order_total(&[line(1000, 2), line(250, 4)]), Some(3000));
    assert_eq!(order_total(&[line(i64::MAX, 2)]), None);
    assert_eq!(order_total(&[line(i64::MAX, 1), line(1, 1)]), None);
}

#[test]
fn rating_must_be_within_one_to_five() {
    assert!(validate_rating(1).is_ok());
    assert!(validate_rating(5).is_ok());
    assert_eq!(
        message(validate_rating(0).unwrap_err()),
        "Rating must be between 1 and 5"
    );
    assert!(validate_rating(6).is_err());
}

#[test]
fn quantity_and_amounts_reject_non_positive_values() {
    assert!(validate_quantity(1).is_ok());
    assert_eq!(message(validate_quantity(0).unwrap_err()), "Invalid quantity");
    assert!(validate_quantity(-3).is_err());

    assert!(validate_amounts(Some(0), Some(0)).is_ok());
    assert!(validate_amounts(None, None).is_ok());
    assert!(validate_amounts(Some(-1), None).is_err());
    assert!(validate_amounts(None, Some(-1)).is_err());
}

#[test]
fn bearer_token_requires_scheme_and_value() {
    assert_eq!(bearer_token("Bearer abc.def").unwrap(), "abc.def");

    let err = bearer_token("Basic abc").unwrap_err();
    assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(message(err), "Invalid Authorization scheme");
    assert!(bearer_token("Bearer   ").is_err());
}

#[test]
fn cors_origins_are_split_and_trimmed() {
    assert_eq!(
        parse_origins("http://a.test, http://b.test ,,"),
        vec!["http://a.test".to_string(), "http://b.test".to_string()]
    );
    assert!(parse_origins("").is_empty());
}

#[test]
fn issued_tokens_decode_with_same_secret_only() {
    let jwt = jwt();
    let subject = Uuid::new_v4();
    let issued = issue_token(&jwt, subject, Role::Store).unwrap();
    assert_eq!(issued.token_type, "Bearer");
    assert_eq!(issued.role, Role::Store);

    let claims = decode_token(&jwt, &issued.token).unwrap();
    assert_eq!(claims.sub, subject.to_string());
    assert_eq!(claims.role, Role::Store);
    assert!(Uuid::parse_str(&claims.jti).is_ok());

    let other = JwtSettings {
        secret: Arc::from("another-secret"),
        ttl_hours: 1,
    };
    let err = decode_token(&other, &issued.token).unwrap_err();
    assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    assert!(decode_token(&jwt, "garbage").is_err());
}

#[test]
fn each_token_gets_its_own_id() {
    let jwt = jwt();
    let subject = Uuid::new_v4();
    let a = decode_token(&jwt, &issue_token(&jwt, subject, Role::User).unwrap().token).unwrap();
    let b = decode_token(&jwt, &issue_token(&jwt, subject, Role::User).unwrap().token).unwrap();
    assert_ne!(a.jti, b.jti);
}

#[test]
fn role_guards_reject_the_other_account_kind() {
    let shopper = AuthUser {
        id: Uuid::new_v4(),
        role: Role::User,
        jti: Uuid::new_v4(),
        expires_at: chrono::Utc::now(),
    };
    assert!(ensure_user(&shopper).is_ok());

    let err = ensure_store(&shopper).unwrap_err();
    assert_eq!(err.status(), StatusCode::FORBIDDEN);
    assert_eq!(message(err), "This action requires a store account");
}

#[test]
fn migration_files_split_into_statements() {
    let sql = "CREATE TABLE a (id INT);\n\n  CREATE INDEX i ON a (id) ;\n";
    let stmts: Vec<&str> = marketplace_api::db::split_statements(sql).collect();
    assert_eq!(stmts, vec!["CREATE TABLE a (id INT)", "CREATE INDEX i ON a (id)"]);
}

#[test]
fn check_lengths_reports_first_overlong_field() {
    assert!(check_lengths(&[("zip_code", "40111", 20), ("city", " Bandung ", 7)]).is_ok());

    let err = check_lengths(&[
        ("bank_account", "0011223344", 20),
        ("contact_number", "+62 812-3456-78901", 15),
    ])
    .unwrap_err();
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    assert_eq!(message(err), "Contact Number must be at most 15 characters");
}

#[test]
fn cart_totals_reject_overflow() {
    assert_eq!(line_total(250, 4).unwrap(), 1000);
    assert_eq!(
        message(line_total(i64::MAX / 2, 3).unwrap_err()),
        "Cart total is too large"
    );

    let cart_line = |total_price| CartLine {
        product_id: Uuid::new_v4(),
        product_name: "Widget".into(),
        quantity: 1,
        price: total_price,
        total_price,
    };
    assert_eq!(cart_total(&[]).unwrap(), 0);
    assert_eq!(cart_total(&[cart_line(10), cart_line(5)]).unwrap(), 15);
    assert!(cart_total(&[cart_line(i64::MAX), cart_line(1)]).is_err());
}
