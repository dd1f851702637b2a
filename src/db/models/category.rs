//! Category model and request/response types.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub description: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Payload for creating or replacing a category. Updates are a full
/// replace, so create and update share the same required fields.
#[derive(Debug, Deserialize)]
pub struct CategoryPayload {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct CategoryEnvelope {
    pub message: String,
    pub category: Category,
}
