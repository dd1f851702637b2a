//! Database models split into domain-specific modules.

pub mod category;
pub mod product;
pub mod supplier;
pub mod user;

pub use category::*;
pub use product::*;
pub use supplier::*;
pub use user::*;
