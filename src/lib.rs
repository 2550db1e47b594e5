//! # MediaVault
//!
//! REST surface for the MediaVault resource store.
//!
//! Handles:
//! - HTTP endpoints with axum (multipart uploads, binary downloads)
//! - The response envelope shared by every endpoint
//! - The authentication boundary (opaque user ids from an upstream verifier)
//! - OpenAPI/Swagger documentation
//!
//! All lifecycle logic lives in `mediavault-core`; this crate only maps HTTP
//! onto the service operations and service errors onto status codes.

#![warn(rust_2018_idioms)]

pub mod auth;
pub mod config;
pub mod envelope;
pub mod routes;
pub mod state;

pub use config::AppConfig;
pub use state::AppState;
