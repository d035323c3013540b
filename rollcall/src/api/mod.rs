//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers
//! - **[`models`]**: Request/response data structures
//!
//! # API Structure
//!
//! - `POST /upload/`: upload an attendance document, get the extracted records back
//! - `GET /healthz`: liveness probe
//! - `GET /openapi.json`, `GET /docs`: OpenAPI document and its rendered reference

pub mod handlers;
pub mod models;
