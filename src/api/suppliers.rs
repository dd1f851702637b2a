//! Supplier CRUD endpoints.
//!
//! Same guard pipeline as categories, plus an application-level email
//! uniqueness check. On update the check excludes the row being
//! updated, so saving a supplier with its own unchanged email is not
//! rejected.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{Supplier, SupplierEnvelope, SupplierPayload, User};
use crate::AppState;

use super::auth::AdminUser;
use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{validate_address, validate_description, validate_email, validate_name, validate_phone};
use super::MessageResponse;

fn validate_payload(req: &SupplierPayload) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    if let Err(e) = validate_name(&req.name) {
        errors.add("name", e);
    }
    if let Some(ref email) = req.email {
        if let Err(e) = validate_email(email) {
            errors.add("email", e);
        }
    }
    if let Err(e) = validate_phone(&req.phone) {
        errors.add("phone", e);
    }
    if let Err(e) = validate_address(&req.address) {
        errors.add("address", e);
    }
    if let Err(e) = validate_description(&req.description) {
        errors.add("description", e);
    }

    errors.finish()
}

async fn find_supplier(pool: &crate::DbPool, id: &str) -> Result<Supplier, ApiError> {
    sqlx::query_as::<_, Supplier>("SELECT * FROM suppliers WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Supplier not found"))
}

/// Reject the write if another supplier already uses this email.
/// `exclude_id` skips the row being updated.
async fn ensure_email_free(
    pool: &crate::DbPool,
    email: &Option<String>,
    exclude_id: Option<&str>,
) -> Result<(), ApiError> {
    let Some(email) = email else {
        return Ok(());
    };

    let taken: Option<(String,)> = match exclude_id {
        Some(id) => {
            sqlx::query_as("SELECT id FROM suppliers WHERE email = ? AND id != ?")
                .bind(email)
                .bind(id)
                .fetch_optional(pool)
                .await?
        }
        None => {
            sqlx::query_as("SELECT id FROM suppliers WHERE email = ?")
                .bind(email)
                .fetch_optional(pool)
                .await?
        }
    };

    if taken.is_some() {
        return Err(ApiError::conflict("Email is already registered"));
    }
    Ok(())
}

/// List all suppliers
pub async fn list_suppliers(
    State(state): State<Arc<AppState>>,
    _user: User,
) -> Result<Json<Vec<Supplier>>, ApiError> {
    let suppliers =
        sqlx::query_as::<_, Supplier>("SELECT * FROM suppliers ORDER BY created_at DESC")
            .fetch_all(&state.db)
            .await?;

    if suppliers.is_empty() {
        return Err(ApiError::not_found(
            "No data yet, please register at least one supplier",
        ));
    }

    Ok(Json(suppliers))
}

/// Create a new supplier (admin only)
pub async fn create_supplier(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Json(req): Json<SupplierPayload>,
) -> Result<(StatusCode, Json<SupplierEnvelope>), ApiError> {
    validate_payload(&req)?;
    ensure_email_free(&state.db, &req.email, None).await?;

    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        "INSERT INTO suppliers (id, name, email, phone, address, description, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(&req.name)
    .bind(&req.email)
    .bind(&req.phone)
    .bind(&req.address)
    .bind(&req.description)
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await?;

    let supplier = find_supplier(&state.db, &id).await?;

    Ok((
        StatusCode::CREATED,
        Json(SupplierEnvelope {
            message: "Supplier created successfully".to_string(),
            supplier,
        }),
    ))
}

/// Get a supplier by id
pub async fn get_supplier(
    State(state): State<Arc<AppState>>,
    _user: User,
    Path(id): Path<String>,
) -> Result<Json<SupplierEnvelope>, ApiError> {
    let supplier = find_supplier(&state.db, &id).await?;

    Ok(Json(SupplierEnvelope {
        message: "Supplier found".to_string(),
        supplier,
    }))
}

/// Replace a supplier's fields (admin only)
pub async fn update_supplier(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
    Json(req): Json<SupplierPayload>,
) -> Result<(StatusCode, Json<SupplierEnvelope>), ApiError> {
    find_supplier(&state.db, &id).await?;
    validate_payload(&req)?;
    ensure_email_free(&state.db, &req.email, Some(&id)).await?;

    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        "UPDATE suppliers SET name = ?, email = ?, phone = ?, address = ?, description = ?, \
         updated_at = ? WHERE id = ?",
    )
    .bind(&req.name)
    .bind(&req.email)
    .bind(&req.phone)
    .bind(&req.address)
    .bind(&req.description)
    .bind(&now)
    .bind(&id)
    .execute(&state.db)
    .await?;

    let supplier = find_supplier(&state.db, &id).await?;

    Ok((
        StatusCode::CREATED,
        Json(SupplierEnvelope {
            message: "Supplier updated successfully".to_string(),
            supplier,
        }),
    ))
}

/// Delete a supplier (admin only). Products referencing it are left
/// untouched.
pub async fn delete_supplier(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    find_supplier(&state.db, &id).await?;

    sqlx::query("DELETE FROM suppliers WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await?;

    Ok(Json(MessageResponse {
        message: "Supplier deleted successfully".to_string(),
    }))
}
