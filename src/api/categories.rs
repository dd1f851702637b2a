//! Category CRUD endpoints.
//!
//! Reads require any authenticated caller; writes require the admin
//! role via the [`AdminUser`] extractor.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{Category, CategoryEnvelope, CategoryPayload, User};
use crate::AppState;

use super::auth::AdminUser;
use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{validate_description, validate_name};
use super::MessageResponse;

fn validate_payload(req: &CategoryPayload) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    if let Err(e) = validate_name(&req.name) {
        errors.add("name", e);
    }
    if let Err(e) = validate_description(&req.description) {
        errors.add("description", e);
    }

    errors.finish()
}

async fn find_category(pool: &crate::DbPool, id: &str) -> Result<Category, ApiError> {
    sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Category not found"))
}

/// List all categories
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
    _user: User,
) -> Result<Json<Vec<Category>>, ApiError> {
    let categories =
        sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY created_at DESC")
        .fetch_all(&state.db)
        .await?;

    if categories.is_empty() {
        return Err(ApiError::not_found(
            "No data yet, please register at least one category",
        ));
    }

    Ok(Json(categories))
}

/// Create a new category (admin only)
pub async fn create_category(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Json(req): Json<CategoryPayload>,
) -> Result<(StatusCode, Json<CategoryEnvelope>), ApiError> {
    validate_payload(&req)?;

    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        "INSERT INTO categories (id, name, description, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(&req.name)
    .bind(&req.description)
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await?;

    let category = find_category(&state.db, &id).await?;

    Ok((
        StatusCode::CREATED,
        Json(CategoryEnvelope {
            message: "Category created successfully".to_string(),
            category,
        }),
    ))
}

/// Get a category by id
pub async fn get_category(
    State(state): State<Arc<AppState>>,
    _user: User,
    Path(id): Path<String>,
) -> Result<Json<CategoryEnvelope>, ApiError> {
    let category = find_category(&state.db, &id).await?;

    Ok(Json(CategoryEnvelope {
        message: "Category found".to_string(),
        category,
    }))
}

/// Replace a category's fields (admin only). The row must exist
/// before the body is validated.
pub async fn update_category(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
    Json(req): Json<CategoryPayload>,
) -> Result<(StatusCode, Json<CategoryEnvelope>), ApiError> {
    find_category(&state.db, &id).await?;
    validate_payload(&req)?;

    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query("UPDATE categories SET name = ?, description = ?, updated_at = ? WHERE id = ?")
        .bind(&req.name)
        .bind(&req.description)
        .bind(&now)
        .bind(&id)
        .execute(&state.db)
        .await?;

    let category = find_category(&state.db, &id).await?;

    Ok((
        StatusCode::CREATED,
        Json(CategoryEnvelope {
            message: "Category updated successfully".to_string(),
            category,
        }),
    ))
}

/// Delete a category (admin only). Products referencing it are left
/// untouched; there is no cascade and no protection.
pub async fn delete_category(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    find_category(&state.db, &id).await?;

    sqlx::query("DELETE FROM categories WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await?;

    Ok(Json(MessageResponse {
        message: "Category deleted successfully".to_string(),
    }))
}
