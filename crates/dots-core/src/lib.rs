//! Dots Core Library
//!
//! Domain models, error types, configuration and validation shared by every
//! crate in the workspace.

pub mod config;
pub mod error;
pub mod models;
pub mod storage_types;
pub mod validation;

pub use config::{BaseConfig, Config, SiteConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use storage_types::StorageBackend;
