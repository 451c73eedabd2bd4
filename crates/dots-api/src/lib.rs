//! Dots API Library
//!
//! HTTP handlers and application setup for the label site backend.

mod handlers;
pub mod setup;
mod utils;

pub mod error;
pub mod state;

pub use error::{HttpAppError, ReadResource, ResourceError};
