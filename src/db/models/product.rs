//! Product model and request/response types.
//!
//! Products reference a category and a supplier by id. The references
//! are validated at write time; reads join the current names in as
//! `namecategory` / `namesupplier`.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: String,
    pub category_id: String,
    pub supplier_id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub stock: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// Product row joined with the human-readable category and supplier
/// names, as returned by list and get.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProductWithRefs {
    pub id: String,
    pub category_id: String,
    pub namecategory: String,
    pub supplier_id: String,
    pub namesupplier: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub stock: i64,
}

/// Payload for creating or replacing a product. All fields required;
/// price and stock must be strictly positive.
#[derive(Debug, Deserialize)]
pub struct ProductPayload {
    pub category_id: String,
    pub supplier_id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub stock: i64,
}

#[derive(Debug, Serialize)]
pub struct ProductEnvelope {
    pub message: String,
    pub product: Product,
}

#[derive(Debug, Serialize)]
pub struct ProductWithRefsEnvelope {
    pub message: String,
    pub product: ProductWithRefs,
}
