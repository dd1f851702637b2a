//! Authentication and the authorization guard.
//!
//! Identity is always explicit: handlers that need a caller take a
//! [`User`] (any authenticated account) or an [`AdminUser`] extractor
//! argument. There is no ambient "current user" lookup.
//!
//! Tokens are opaque 32-byte random values handed to the client once;
//! only their SHA-256 digest is stored. A user may hold any number of
//! tokens and logout revokes exactly the one presented.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{request::Parts, HeaderMap, StatusCode},
    Json,
};
use rand::Rng;
use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::db::{
    DbPool, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse, User, UserResponse,
    ROLE_ADMIN, ROLE_USER,
};
use crate::AppState;

use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{validate_email, validate_name, validate_password, validate_role};
use super::MessageResponse;

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a hash
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Generate a random bearer token
fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();
    hex::encode(bytes)
}

/// Hash a token for storage
fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Extract the bearer token from request headers
fn extract_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|s| s.to_string())
}

/// Resolve a token to its user
pub async fn get_current_user(pool: &DbPool, token: &str) -> Result<User, ApiError> {
    let token_hash = hash_token(token);

    let user: Option<User> = sqlx::query_as(
        "SELECT users.* FROM users \
         JOIN tokens ON tokens.user_id = users.id \
         WHERE tokens.token_hash = ?",
    )
    .bind(&token_hash)
    .fetch_optional(pool)
    .await?;

    user.ok_or_else(|| ApiError::unauthorized("Unauthenticated"))
}

/// Resolve the caller if the request carries a valid bearer token.
/// Used by registration, which is public but honors an admin caller's
/// role choice. A missing or invalid token is simply anonymous.
async fn optional_current_user(pool: &DbPool, headers: &HeaderMap) -> Result<Option<User>, ApiError> {
    let Some(token) = extract_token(headers) else {
        return Ok(None);
    };

    let token_hash = hash_token(&token);
    let user: Option<User> = sqlx::query_as(
        "SELECT users.* FROM users \
         JOIN tokens ON tokens.user_id = users.id \
         WHERE tokens.token_hash = ?",
    )
    .bind(&token_hash)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// Extractor for the current authenticated user
#[async_trait]
impl FromRequestParts<Arc<AppState>> for User {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token =
            extract_token(&parts.headers).ok_or_else(|| ApiError::unauthorized("Unauthenticated"))?;
        get_current_user(&state.db, &token).await
    }
}

/// Extractor for admin-only operations: authenticates the caller, then
/// requires the admin role.
pub struct AdminUser(pub User);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let user = User::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(ApiError::forbidden("This action requires the admin role"));
        }
        Ok(AdminUser(user))
    }
}

fn validate_register_request(req: &RegisterRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    if let Err(e) = validate_name(&req.name) {
        errors.add("name", e);
    }
    if let Err(e) = validate_email(&req.email) {
        errors.add("email", e);
    }
    if let Err(e) = validate_password(&req.password) {
        errors.add("password", e);
    }
    if let Some(ref role) = req.role {
        if let Err(e) = validate_role(role) {
            errors.add("role", e);
        }
    }

    errors.finish()
}

/// Register a new user account.
///
/// Public, but the `role` field is only honored when the request also
/// carries a valid admin bearer token; anonymous self-registration
/// always yields the `user` role.
pub async fn register(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    validate_register_request(&req)?;

    let caller = optional_current_user(&state.db, &headers).await?;
    let role = match (&caller, &req.role) {
        (Some(user), Some(requested)) if user.is_admin() => requested.clone(),
        _ => ROLE_USER.to_string(),
    };

    // Pre-insert uniqueness check so the failure is a field error; the
    // UNIQUE constraint still backstops concurrent registrations.
    let existing: Option<(String,)> = sqlx::query_as("SELECT id FROM users WHERE email = ?")
        .bind(&req.email)
        .fetch_optional(&state.db)
        .await?;
    if existing.is_some() {
        return Err(ApiError::validation_field(
            "email",
            "The email has already been taken",
        ));
    }

    let id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();
    let password_hash = hash_password(&req.password)
        .map_err(|e| ApiError::internal(format!("Failed to hash password: {}", e)))?;

    sqlx::query(
        "INSERT INTO users (id, name, email, password_hash, role, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(&req.name)
    .bind(&req.email)
    .bind(&password_hash)
    .bind(&role)
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await?;

    tracing::info!("Registered user {} with role {}", req.email, role);

    let user: User = sqlx::query_as("SELECT * FROM users WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully".to_string(),
            user: UserResponse::from(user),
        }),
    ))
}

/// Login endpoint: verifies credentials and mints a new bearer token
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = ?")
        .bind(&req.email)
        .fetch_optional(&state.db)
        .await?;

    let user = user.ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

    if !verify_password(&req.password, &user.password_hash) {
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let token = generate_token();
    let token_hash = hash_token(&token);
    let token_id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query("INSERT INTO tokens (id, user_id, token_hash, created_at) VALUES (?, ?, ?, ?)")
        .bind(&token_id)
        .bind(&user.id)
        .bind(&token_hash)
        .bind(&now)
        .execute(&state.db)
        .await?;

    Ok(Json(LoginResponse {
        access_token: token,
        token_type: "Bearer".to_string(),
    }))
}

/// Logout endpoint: revokes exactly the token used for this request,
/// leaving the user's other tokens valid.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    user: User,
    headers: HeaderMap,
) -> Result<Json<MessageResponse>, ApiError> {
    // The extractor already authenticated, so the header is present.
    let token =
        extract_token(&headers).ok_or_else(|| ApiError::unauthorized("Unauthenticated"))?;
    let token_hash = hash_token(&token);

    sqlx::query("DELETE FROM tokens WHERE token_hash = ? AND user_id = ?")
        .bind(&token_hash)
        .bind(&user.id)
        .execute(&state.db)
        .await?;

    Ok(Json(MessageResponse {
        message: "Session closed".to_string(),
    }))
}

/// Ensure the bootstrap admin account exists. Without it no caller
/// could ever pass the admin gate, since anonymous registration is
/// forced to the `user` role.
pub async fn ensure_admin_user(pool: &DbPool, email: &str, password: &str) -> anyhow::Result<()> {
    let existing: Option<(String,)> = sqlx::query_as("SELECT id FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await?;

    if existing.is_some() {
        return Ok(());
    }

    let id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();
    let password_hash =
        hash_password(password).map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?;

    sqlx::query(
        "INSERT INTO users (id, name, email, password_hash, role, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind("Administrator")
    .bind(email)
    .bind(&password_hash)
    .bind(ROLE_ADMIN)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    tracing::info!("Created default admin user: {}", email);
    Ok(())
}
