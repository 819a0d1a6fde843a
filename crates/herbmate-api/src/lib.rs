//! herbmate-api: HTTP API for herbmate
//!
//! This crate exposes the inference pipeline over HTTP:
//! - Liveness and health routes
//! - Multipart image upload for prediction
//! - Mapping of prediction failures to JSON error responses

pub mod error;
pub mod rest;

pub use error::ApiError;
pub use rest::create_router;
