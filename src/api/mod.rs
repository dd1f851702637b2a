pub mod auth;
mod categories;
pub mod error;
mod products;
mod suppliers;
mod validation;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::AppState;

/// Plain `{message}` response body used by logout and deletes
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

pub fn create_router(state: Arc<AppState>) -> Router {
    // Auth is enforced per-handler through the User/AdminUser
    // extractors, so the caller's identity is an explicit argument
    // everywhere it matters.
    let api_routes = Router::new()
        // Auth
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        // Categories
        .route("/categories", get(categories::list_categories))
        .route("/categories", post(categories::create_category))
        .route("/categories/:id", get(categories::get_category))
        .route("/categories/:id", put(categories::update_category))
        .route("/categories/:id", delete(categories::delete_category))
        // Products
        .route("/products", get(products::list_products))
        .route("/products", post(products::create_product))
        .route("/products/:id", get(products::get_product))
        .route("/products/:id", put(products::update_product))
        .route("/products/:id", delete(products::delete_product))
        // Suppliers
        .route("/suppliers", get(suppliers::list_suppliers))
        .route("/suppliers", post(suppliers::create_supplier))
        .route("/suppliers/:id", get(suppliers::get_supplier))
        .route("/suppliers/:id", put(suppliers::update_supplier))
        .route("/suppliers/:id", delete(suppliers::delete_supplier));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
