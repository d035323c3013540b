//! HTTP request handlers.
//!
//! - [`upload`]: attendance document upload and extraction
//!
//! # Error Handling
//!
//! Handlers return [`crate::errors::Error`], which converts to the matching HTTP status and a
//! `{"detail": "..."}` JSON body.

pub mod upload;
