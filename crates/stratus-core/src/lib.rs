//! # stratus-core
//!
//! Foundation crate: the object store trait, configuration, typed
//! identifiers, and the shared error type. Depends on nothing else in
//! the workspace, so every other crate can build on it.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
