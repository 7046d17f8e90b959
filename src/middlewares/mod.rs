pub mod auth;
pub mod cors;

pub use auth::{AuthMiddleware, Identity};
pub use cors::create_cors;
