//! Web API module for drive.
//!
//! This module exposes the per-owner storage over a JSON REST API with
//! bearer-token authentication.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use handlers::AppState;
pub use router::create_router;
pub use server::WebServer;
