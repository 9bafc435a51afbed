//! Middleware del sistema
//!
//! Extractor de identidad (JWT) y configuración de CORS.

pub mod auth;
pub mod cors;

pub use auth::bearer_token;
pub use cors::cors_layer;
