//! Input validation for API requests.
//!
//! Validators return `Result<(), String>` so handlers can collect
//! failures per field with the `ValidationErrorBuilder` from the
//! `error` module and reject the whole payload at once.

use lazy_static::lazy_static;
use regex::Regex;

use crate::db::{ROLE_ADMIN, ROLE_USER};

lazy_static! {
    /// Regex for validating email addresses
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9][-a-zA-Z0-9]*(\.[a-zA-Z0-9][-a-zA-Z0-9]*)+$"
    ).unwrap();

    /// Regex for validating phone numbers (digits, spaces, dashes, optional +)
    static ref PHONE_REGEX: Regex = Regex::new(
        r"^\+?[0-9][0-9 \-()]{4,30}$"
    ).unwrap();
}

/// Validate a display name (user, category, product, supplier)
pub fn validate_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("Name is required".to_string());
    }

    if name.len() > 100 {
        return Err("Name is too long (max 100 characters)".to_string());
    }

    Ok(())
}

/// Validate a description
pub fn validate_description(description: &str) -> Result<(), String> {
    if description.trim().is_empty() {
        return Err("Description is required".to_string());
    }

    if description.len() > 500 {
        return Err("Description is too long (max 500 characters)".to_string());
    }

    Ok(())
}

/// Validate an email address
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > 254 {
        return Err("Email is too long (max 254 characters)".to_string());
    }

    if !EMAIL_REGEX.is_match(email) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

/// Validate a phone number
pub fn validate_phone(phone: &str) -> Result<(), String> {
    if phone.is_empty() {
        return Err("Phone is required".to_string());
    }

    if !PHONE_REGEX.is_match(phone) {
        return Err("Invalid phone format".to_string());
    }

    Ok(())
}

/// Validate a postal address
pub fn validate_address(address: &str) -> Result<(), String> {
    if address.trim().is_empty() {
        return Err("Address is required".to_string());
    }

    if address.len() > 255 {
        return Err("Address is too long (max 255 characters)".to_string());
    }

    Ok(())
}

/// Validate a password
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    if password.len() < 4 {
        return Err("Password is too short (min 4 characters)".to_string());
    }

    if password.len() > 128 {
        return Err("Password is too long (max 128 characters)".to_string());
    }

    Ok(())
}

/// Validate a role value
pub fn validate_role(role: &str) -> Result<(), String> {
    if role != ROLE_ADMIN && role != ROLE_USER {
        return Err(format!(
            "Invalid role. Must be one of: {}, {}",
            ROLE_ADMIN, ROLE_USER
        ));
    }
    Ok(())
}

/// Validate a product price. Strictly positive is a domain invariant,
/// not just a type check.
pub fn validate_price(price: f64) -> Result<(), String> {
    if !price.is_finite() {
        return Err("Price must be a number".to_string());
    }

    if price <= 0.0 {
        return Err("Price must be greater than 0".to_string());
    }

    Ok(())
}

/// Validate a product stock count, strictly positive
pub fn validate_stock(stock: i64) -> Result<(), String> {
    if stock <= 0 {
        return Err("Stock must be greater than 0".to_string());
    }

    Ok(())
}
