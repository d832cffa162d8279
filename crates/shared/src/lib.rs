//! Shared types, errors, and configuration for Carebase.
//!
//! This crate provides common types used across all other crates:
//! - Money type with decimal precision (AUD)
//! - Typed IDs for type-safe entity references
//! - Pagination types for list endpoints
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, DatabaseConfig, ServerConfig, SessionConfig};
pub use error::AppError;
