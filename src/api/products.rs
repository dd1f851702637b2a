//! Product CRUD endpoints.
//!
//! Products carry foreign references to a category and a supplier.
//! Writes verify both references exist inside the same transaction as
//! the insert/update, so a reference cannot be deleted between the
//! check and the write. Reads join the current category and supplier
//! names in as `namecategory` / `namesupplier`.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{
    Product, ProductEnvelope, ProductPayload, ProductWithRefs, ProductWithRefsEnvelope, User,
};
use crate::AppState;

use super::auth::AdminUser;
use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{validate_description, validate_name, validate_price, validate_stock};
use super::MessageResponse;

const LIST_SQL: &str = "SELECT products.id, products.category_id, \
     categories.name AS namecategory, products.supplier_id, \
     suppliers.name AS namesupplier, products.name, products.description, \
     products.price, products.stock \
     FROM products \
     JOIN categories ON products.category_id = categories.id \
     JOIN suppliers ON products.supplier_id = suppliers.id \
     ORDER BY products.name ASC";

// LEFT JOIN so a product whose category or supplier was deleted is
// still retrievable, with the missing name rendered empty.
const GET_SQL: &str = "SELECT products.id, products.category_id, \
     COALESCE(categories.name, '') AS namecategory, products.supplier_id, \
     COALESCE(suppliers.name, '') AS namesupplier, products.name, \
     products.description, products.price, products.stock \
     FROM products \
     LEFT JOIN categories ON products.category_id = categories.id \
     LEFT JOIN suppliers ON products.supplier_id = suppliers.id \
     WHERE products.id = ?";

fn validate_payload(req: &ProductPayload) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    if req.category_id.is_empty() {
        errors.add("category_id", "category_id is required");
    }
    if req.supplier_id.is_empty() {
        errors.add("supplier_id", "supplier_id is required");
    }
    if let Err(e) = validate_name(&req.name) {
        errors.add("name", e);
    }
    if let Err(e) = validate_description(&req.description) {
        errors.add("description", e);
    }
    if let Err(e) = validate_price(req.price) {
        errors.add("price", e);
    }
    if let Err(e) = validate_stock(req.stock) {
        errors.add("stock", e);
    }

    errors.finish()
}

/// Verify both foreign references exist, inside the caller's
/// transaction. Ordering matters: shape validation happened first,
/// and no write is issued until both checks pass.
async fn ensure_refs_exist(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    req: &ProductPayload,
) -> Result<(), ApiError> {
    let category: Option<(String,)> = sqlx::query_as("SELECT id FROM categories WHERE id = ?")
        .bind(&req.category_id)
        .fetch_optional(&mut **tx)
        .await?;
    if category.is_none() {
        return Err(ApiError::not_found("category_id does not exist"));
    }

    let supplier: Option<(String,)> = sqlx::query_as("SELECT id FROM suppliers WHERE id = ?")
        .bind(&req.supplier_id)
        .fetch_optional(&mut **tx)
        .await?;
    if supplier.is_none() {
        return Err(ApiError::not_found("supplier_id does not exist"));
    }

    Ok(())
}

async fn find_product(pool: &crate::DbPool, id: &str) -> Result<Product, ApiError> {
    sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Product not found"))
}

/// List all products with their category and supplier names, ordered
/// by product name ascending
pub async fn list_products(
    State(state): State<Arc<AppState>>,
    _user: User,
) -> Result<Json<Vec<ProductWithRefs>>, ApiError> {
    let products = sqlx::query_as::<_, ProductWithRefs>(LIST_SQL)
        .fetch_all(&state.db)
        .await?;

    if products.is_empty() {
        return Err(ApiError::not_found(
            "No data yet, please register at least one product",
        ));
    }

    Ok(Json(products))
}

/// Create a new product (admin only)
pub async fn create_product(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Json(req): Json<ProductPayload>,
) -> Result<(StatusCode, Json<ProductEnvelope>), ApiError> {
    validate_payload(&req)?;

    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    let mut tx = state.db.begin().await?;
    ensure_refs_exist(&mut tx, &req).await?;

    sqlx::query(
        "INSERT INTO products (id, category_id, supplier_id, name, description, price, stock, \
         created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(&req.category_id)
    .bind(&req.supplier_id)
    .bind(&req.name)
    .bind(&req.description)
    .bind(req.price)
    .bind(req.stock)
    .bind(&now)
    .bind(&now)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    let product = find_product(&state.db, &id).await?;

    Ok((
        StatusCode::CREATED,
        Json(ProductEnvelope {
            message: "Product created successfully".to_string(),
            product,
        }),
    ))
}

/// Get a product by id, with joined category and supplier names
pub async fn get_product(
    State(state): State<Arc<AppState>>,
    _user: User,
    Path(id): Path<String>,
) -> Result<Json<ProductWithRefsEnvelope>, ApiError> {
    let product = sqlx::query_as::<_, ProductWithRefs>(GET_SQL)
        .bind(&id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Product not found"))?;

    Ok(Json(ProductWithRefsEnvelope {
        message: "Product found".to_string(),
        product,
    }))
}

/// Replace a product's fields (admin only). The row must exist before
/// the body is validated; reference checks run last, in the same
/// transaction as the write.
pub async fn update_product(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
    Json(req): Json<ProductPayload>,
) -> Result<(StatusCode, Json<ProductEnvelope>), ApiError> {
    find_product(&state.db, &id).await?;
    validate_payload(&req)?;

    let now = chrono::Utc::now().to_rfc3339();

    let mut tx = state.db.begin().await?;
    ensure_refs_exist(&mut tx, &req).await?;

    sqlx::query(
        "UPDATE products SET category_id = ?, supplier_id = ?, name = ?, description = ?, \
         price = ?, stock = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&req.category_id)
    .bind(&req.supplier_id)
    .bind(&req.name)
    .bind(&req.description)
    .bind(req.price)
    .bind(req.stock)
    .bind(&now)
    .bind(&id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    let product = find_product(&state.db, &id).await?;

    Ok((
        StatusCode::CREATED,
        Json(ProductEnvelope {
            message: "Product updated successfully".to_string(),
            product,
        }),
    ))
}

/// Delete a product (admin only)
pub async fn delete_product(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    find_product(&state.db, &id).await?;

    sqlx::query("DELETE FROM products WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await?;

    Ok(Json(MessageResponse {
        message: "Product deleted successfully".to_string(),
    }))
}
