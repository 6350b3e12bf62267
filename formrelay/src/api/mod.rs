//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers
//! - **[`models`]**: Response data structures
//!
//! All endpoints are documented with OpenAPI annotations using `utoipa`; the document is served at
//! `/api-docs/openapi.json`.

pub mod handlers;
pub mod models;
