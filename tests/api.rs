//! End-to-end API tests driving the router against an in-memory
//! SQLite database.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use stockroom::config::Config;
use stockroom::{AppState, DbPool};

const ADMIN_EMAIL: &str = "admin@test.local";
const ADMIN_PASSWORD: &str = "adminpass";

/// Build a router backed by a fresh shared-cache in-memory database,
/// with the bootstrap admin created. The pool is returned so tests can
/// assert on row counts directly.
async fn test_app() -> (Router, DbPool) {
    let db_url = format!(
        "sqlite:file:{}?mode=memory&cache=shared",
        uuid::Uuid::new_v4()
    );
    let db = stockroom::db::init_with_url(&db_url)
        .await
        .expect("db init");
    stockroom::api::auth::ensure_admin_user(&db, ADMIN_EMAIL, ADMIN_PASSWORD)
        .await
        .expect("admin bootstrap");

    let state = Arc::new(AppState::new(Config::default(), db.clone()));
    (stockroom::api::create_router(state), db)
}

async fn request(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::String(
            String::from_utf8_lossy(&bytes).into_owned(),
        ))
    };
    (status, value)
}

async fn login(app: &Router, email: &str, password: &str) -> String {
    let (status, body) = request(
        app,
        Method::POST,
        "/api/login",
        None,
        Some(json!({"email": email, "password": password})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);
    assert_eq!(body["token_type"], "Bearer");
    body["access_token"].as_str().unwrap().to_string()
}

/// Register a plain user and log them in, returning their token
async fn user_token(app: &Router, email: &str) -> String {
    let (status, _) = request(
        app,
        Method::POST,
        "/api/register",
        None,
        Some(json!({"name": "Plain User", "email": email, "password": "secret123"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    login(app, email, "secret123").await
}

async fn create_category(app: &Router, admin: &str, name: &str) -> String {
    let (status, body) = request(
        app,
        Method::POST,
        "/api/categories",
        Some(admin),
        Some(json!({"name": name, "description": "desc"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["category"]["id"].as_str().unwrap().to_string()
}

async fn create_supplier(app: &Router, admin: &str, name: &str, email: Option<&str>) -> String {
    let (status, body) = request(
        app,
        Method::POST,
        "/api/suppliers",
        Some(admin),
        Some(json!({
            "name": name,
            "email": email,
            "phone": "0991234567",
            "address": "42 Warehouse Rd",
            "description": "desc"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["supplier"]["id"].as_str().unwrap().to_string()
}

async fn create_product(
    app: &Router,
    admin: &str,
    name: &str,
    category_id: &str,
    supplier_id: &str,
) -> String {
    let (status, body) = request(
        app,
        Method::POST,
        "/api/products",
        Some(admin),
        Some(json!({
            "category_id": category_id,
            "supplier_id": supplier_id,
            "name": name,
            "description": "desc",
            "price": 20000.0,
            "stock": 50
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["product"]["id"].as_str().unwrap().to_string()
}

async fn product_count(db: &DbPool) -> i64 {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products")
        .fetch_one(db)
        .await
        .unwrap();
    count.0
}

#[tokio::test]
async fn health_check_is_public() {
    let (app, _db) = test_app().await;
    let (status, body) = request(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("OK".to_string()));
}

#[tokio::test]
async fn register_login_logout_flow() {
    let (app, _db) = test_app().await;

    let (status, body) = request(
        &app,
        Method::POST,
        "/api/register",
        None,
        Some(json!({"name": "Pedro", "email": "pedro@example.com", "password": "1234"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["email"], "pedro@example.com");
    assert_eq!(body["user"]["role"], "user");
    // Password hash must never leak into the response
    assert!(body["user"].get("password_hash").is_none());
    assert!(body["user"].get("password").is_none());

    let token = login(&app, "pedro@example.com", "1234").await;

    let (status, _) = request(&app, Method::POST, "/api/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    // The token no longer authenticates
    let (status, _) = request(&app, Method::GET, "/api/categories", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_rejects_bad_credentials() {
    let (app, _db) = test_app().await;

    let (status, _) = request(
        &app,
        Method::POST,
        "/api/login",
        None,
        Some(json!({"email": "nobody@example.com", "password": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = request(
        &app,
        Method::POST,
        "/api/login",
        None,
        Some(json!({"email": ADMIN_EMAIL, "password": "wrong"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn duplicate_email_registration_is_rejected() {
    let (app, db) = test_app().await;

    let payload = json!({"name": "Ada", "email": "ada@example.com", "password": "secret123"});
    let (status, _) = request(&app, Method::POST, "/api/register", None, Some(payload.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = request(&app, Method::POST, "/api/register", None, Some(payload)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"]["email"][0]
        .as_str()
        .unwrap()
        .contains("already been taken"));

    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE email = ?")
        .bind("ada@example.com")
        .fetch_one(&db)
        .await
        .unwrap();
    assert_eq!(count.0, 1);
}

#[tokio::test]
async fn anonymous_registration_cannot_claim_admin() {
    let (app, _db) = test_app().await;

    let (status, body) = request(
        &app,
        Method::POST,
        "/api/register",
        None,
        Some(json!({
            "name": "Sneaky",
            "email": "sneaky@example.com",
            "password": "secret123",
            "role": "admin"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["role"], "user");
}

#[tokio::test]
async fn admin_caller_may_assign_role_at_registration() {
    let (app, _db) = test_app().await;
    let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let (status, body) = request(
        &app,
        Method::POST,
        "/api/register",
        Some(&admin),
        Some(json!({
            "name": "Second Admin",
            "email": "admin2@example.com",
            "password": "secret123",
            "role": "admin"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["role"], "admin");
}

#[tokio::test]
async fn writes_require_admin_role() {
    let (app, _db) = test_app().await;
    let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let user = user_token(&app, "plain@example.com").await;

    let category_id = create_category(&app, &admin, "Tech").await;
    let supplier_id = create_supplier(&app, &admin, "Acme", None).await;
    let product_id = create_product(&app, &admin, "Laptop", &category_id, &supplier_id).await;

    let cases = [
        (Method::POST, "/api/categories".to_string(), Some(json!({"name": "X", "description": "d"}))),
        (Method::PUT, format!("/api/categories/{}", category_id), Some(json!({"name": "X", "description": "d"}))),
        (Method::DELETE, format!("/api/categories/{}", category_id), None),
        (Method::POST, "/api/suppliers".to_string(), Some(json!({"name": "X", "phone": "0991234567", "address": "a st", "description": "d"}))),
        (Method::PUT, format!("/api/suppliers/{}", supplier_id), Some(json!({"name": "X", "phone": "0991234567", "address": "a st", "description": "d"}))),
        (Method::DELETE, format!("/api/suppliers/{}", supplier_id), None),
        (Method::POST, "/api/products".to_string(), Some(json!({"category_id": category_id, "supplier_id": supplier_id, "name": "X", "description": "d", "price": 1.0, "stock": 1}))),
        (Method::PUT, format!("/api/products/{}", product_id), Some(json!({"category_id": category_id, "supplier_id": supplier_id, "name": "X", "description": "d", "price": 1.0, "stock": 1}))),
        (Method::DELETE, format!("/api/products/{}", product_id), None),
    ];

    for (method, uri, body) in cases {
        let (status, _) = request(&app, method.clone(), &uri, Some(&user), body.clone()).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{} {} as non-admin", method, uri);

        // And without any token at all: 401
        let (status, _) = request(&app, method.clone(), &uri, None, body).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{} {} anonymous", method, uri);
    }
}

#[tokio::test]
async fn empty_lists_return_not_found() {
    let (app, _db) = test_app().await;
    let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    for uri in ["/api/categories", "/api/products", "/api/suppliers"] {
        let (status, body) = request(&app, Method::GET, uri, Some(&admin), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
        assert!(body["message"].as_str().unwrap().contains("No data"));
    }
}

#[tokio::test]
async fn category_update_missing_row_takes_precedence_over_body() {
    let (app, _db) = test_app().await;
    let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    // Body is invalid (empty name), but the row does not exist: 404 wins
    let (status, _) = request(
        &app,
        Method::PUT,
        "/api/categories/no-such-id",
        Some(&admin),
        Some(json!({"name": "", "description": ""})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn product_rejects_dangling_references() {
    let (app, db) = test_app().await;
    let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let category_id = create_category(&app, &admin, "Tech").await;
    let supplier_id = create_supplier(&app, &admin, "Acme", None).await;

    let (status, body) = request(
        &app,
        Method::POST,
        "/api/products",
        Some(&admin),
        Some(json!({
            "category_id": "missing-category",
            "supplier_id": supplier_id,
            "name": "Laptop",
            "description": "d",
            "price": 100.0,
            "stock": 5
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["message"].as_str().unwrap().contains("category_id"));

    let (status, body) = request(
        &app,
        Method::POST,
        "/api/products",
        Some(&admin),
        Some(json!({
            "category_id": category_id,
            "supplier_id": "missing-supplier",
            "name": "Laptop",
            "description": "d",
            "price": 100.0,
            "stock": 5
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["message"].as_str().unwrap().contains("supplier_id"));

    // No partial writes happened
    assert_eq!(product_count(&db).await, 0);
}

#[tokio::test]
async fn product_price_and_stock_must_be_positive() {
    let (app, db) = test_app().await;
    let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let category_id = create_category(&app, &admin, "Tech").await;
    let supplier_id = create_supplier(&app, &admin, "Acme", None).await;

    for (price, stock) in [(0.0, 10), (100.0, 0), (-1.0, 10), (0.0, 0)] {
        let (status, _) = request(
            &app,
            Method::POST,
            "/api/products",
            Some(&admin),
            Some(json!({
                "category_id": category_id,
                "supplier_id": supplier_id,
                "name": "Widget",
                "description": "d",
                "price": price,
                "stock": stock
            })),
        )
        .await;
        assert_eq!(
            status,
            StatusCode::UNPROCESSABLE_ENTITY,
            "price={} stock={}",
            price,
            stock
        );
    }
    assert_eq!(product_count(&db).await, 0);

    // The boundary values just above zero are accepted
    let (status, _) = request(
        &app,
        Method::POST,
        "/api/products",
        Some(&admin),
        Some(json!({
            "category_id": category_id,
            "supplier_id": supplier_id,
            "name": "Widget",
            "description": "d",
            "price": 0.01,
            "stock": 1
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(product_count(&db).await, 1);
}

#[tokio::test]
async fn product_list_is_ordered_and_joined() {
    let (app, _db) = test_app().await;
    let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let category_id = create_category(&app, &admin, "Tech").await;
    let supplier_id = create_supplier(&app, &admin, "Acme", None).await;

    create_product(&app, &admin, "Zebra Cable", &category_id, &supplier_id).await;
    create_product(&app, &admin, "Adapter", &category_id, &supplier_id).await;
    create_product(&app, &admin, "Monitor", &category_id, &supplier_id).await;

    let (status, body) = request(&app, Method::GET, "/api/products", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);

    let products = body.as_array().unwrap();
    let names: Vec<&str> = products
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Adapter", "Monitor", "Zebra Cable"]);

    for product in products {
        assert_eq!(product["namecategory"], "Tech");
        assert_eq!(product["namesupplier"], "Acme");
    }
}

#[tokio::test]
async fn logout_revokes_only_the_presented_token() {
    let (app, _db) = test_app().await;

    let first = user_token(&app, "multi@example.com").await;
    let second = login(&app, "multi@example.com", "secret123").await;
    assert_ne!(first, second);

    let (status, _) = request(&app, Method::POST, "/api/logout", Some(&first), None).await;
    assert_eq!(status, StatusCode::OK);

    // First token is dead, second still authenticates
    let (status, _) = request(&app, Method::POST, "/api/logout", Some(&first), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = request(&app, Method::GET, "/api/suppliers", Some(&second), None).await;
    assert_ne!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn deleting_referenced_category_leaves_product_in_place() {
    let (app, db) = test_app().await;
    let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let category_id = create_category(&app, &admin, "Tech").await;
    let supplier_id = create_supplier(&app, &admin, "Acme", None).await;
    let product_id = create_product(&app, &admin, "Laptop", &category_id, &supplier_id).await;

    // Permissive by design: the delete succeeds even though a product
    // still references the category
    let (status, _) = request(
        &app,
        Method::DELETE,
        &format!("/api/categories/{}", category_id),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // The product row survives with its dangling reference
    assert_eq!(product_count(&db).await, 1);
    let (status, body) = request(
        &app,
        Method::GET,
        &format!("/api/products/{}", product_id),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["product"]["namecategory"], "");
    assert_eq!(body["product"]["namesupplier"], "Acme");
}

#[tokio::test]
async fn supplier_email_uniqueness() {
    let (app, _db) = test_app().await;
    let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let supplier_id = create_supplier(&app, &admin, "Acme", Some("sales@acme.test")).await;

    // Second supplier with the same email is rejected
    let (status, _) = request(
        &app,
        Method::POST,
        "/api/suppliers",
        Some(&admin),
        Some(json!({
            "name": "Other",
            "email": "sales@acme.test",
            "phone": "0991234567",
            "address": "1 Elsewhere",
            "description": "d"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Updating a supplier with its own unchanged email is fine
    let (status, body) = request(
        &app,
        Method::PUT,
        &format!("/api/suppliers/{}", supplier_id),
        Some(&admin),
        Some(json!({
            "name": "Acme Renamed",
            "email": "sales@acme.test",
            "phone": "0991234567",
            "address": "42 Warehouse Rd",
            "description": "d"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["supplier"]["name"], "Acme Renamed");
}

#[tokio::test]
async fn category_validation_collects_field_errors() {
    let (app, _db) = test_app().await;
    let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let (status, body) = request(
        &app,
        Method::POST,
        "/api/categories",
        Some(&admin),
        Some(json!({"name": "", "description": ""})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"]["name"].is_array());
    assert!(body["errors"]["description"].is_array());
}

#[tokio::test]
async fn full_inventory_lifecycle() {
    let (app, _db) = test_app().await;

    // Bootstrap admin registers a second admin, who drives the rest
    let bootstrap = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let (status, _) = request(
        &app,
        Method::POST,
        "/api/register",
        Some(&bootstrap),
        Some(json!({
            "name": "Store Admin",
            "email": "store@example.com",
            "password": "secret123",
            "role": "admin"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let admin = login(&app, "store@example.com", "secret123").await;

    let category_id = create_category(&app, &admin, "Tech").await;
    let supplier_id = create_supplier(&app, &admin, "Acme", Some("sales@acme.test")).await;

    let (status, body) = request(
        &app,
        Method::POST,
        "/api/products",
        Some(&admin),
        Some(json!({
            "category_id": category_id,
            "supplier_id": supplier_id,
            "name": "Laptop Pro",
            "description": "15 inch",
            "price": 20000.0,
            "stock": 50
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let product_id = body["product"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["product"]["price"], 20000.0);
    assert_eq!(body["product"]["stock"], 50);

    let (status, body) = request(
        &app,
        Method::GET,
        &format!("/api/products/{}", product_id),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["product"]["namecategory"], "Tech");
    assert_eq!(body["product"]["namesupplier"], "Acme");

    let (status, _) = request(
        &app,
        Method::DELETE,
        &format!("/api/products/{}", product_id),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = request(
        &app,
        Method::GET,
        &format!("/api/products/{}", product_id),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
