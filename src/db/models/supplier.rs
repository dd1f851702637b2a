//! Supplier model and request/response types.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Supplier {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: String,
    pub address: String,
    pub description: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Payload for creating or replacing a supplier. Email is optional;
/// when present it must be unique across suppliers.
#[derive(Debug, Deserialize)]
pub struct SupplierPayload {
    pub name: String,
    pub email: Option<String>,
    pub phone: String,
    pub address: String,
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct SupplierEnvelope {
    pub message: String,
    pub supplier: Supplier,
}
