//! Middleware for the drive HTTP layer.

pub mod auth;
pub mod cors;

pub use auth::{jwt_auth, AuthUser, JwtClaims, JwtState, LinkAuthUser};
pub use cors::create_cors_layer;
